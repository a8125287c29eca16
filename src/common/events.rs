use crate::common::types::{
    ChatMessage, ChatScope, Counterpart, ExpertTask, Identity, Notice, Room, TaskContext,
};

/// Events the network task sends up to the UI.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    SessionResolved(Identity),
    /// Identity fetch failed: show the sign-in screen and stop initializing.
    AuthRequired,
    RoomsLoaded(Vec<Room>),
    TasksLoaded(Vec<ExpertTask>),
    /// A room/task is now the active scope; counterpart and task context are
    /// whatever the server returned for it.
    ScopeOpened {
        scope: ChatScope,
        counterpart: Option<Counterpart>,
        context: Option<TaskContext>,
    },
    /// Full replacement of the message list for the given scope.
    HistoryLoaded {
        scope: ChatScope,
        messages: Vec<ChatMessage>,
    },
    /// The server-confirmed record of a message this client just sent.
    /// Rendered exactly once; the push echo is suppressed at the adapter.
    MessageSent(ChatMessage),
    /// An inbound push message, already filtered for scope and self-echo.
    MessageReceived(ChatMessage),
    MessageDeleted(i64),
    Notified(Notice),
    UnreadCount(u64),
    /// The push connection failed or closed. Non-fatal; no auto-reconnect.
    ChannelDown(String),
    /// An expected record was missing: render a neutral empty state.
    EmptyState(String),
    /// A request failed in a user-visible way. The page stays interactive.
    RequestFailed(String),
}
