use crate::common::types::{
    ChatMessage, ChatScope, Counterpart, ExpertTask, Identity, Room, TaskContext,
};
use crate::common::{NetworkCommand, NetworkEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerPhase {
    Idle,
    Submitting,
}

/// Local UI state. Mutated only by `apply` and by the composer glue in the
/// app; everything here is owned by the UI thread.
pub struct AppState {
    pub identity: Option<Identity>,
    pub auth_required: bool,
    pub rooms: Vec<Room>,
    pub tasks: Vec<ExpertTask>,
    pub scope: Option<ChatScope>,
    pub counterpart: Option<Counterpart>,
    pub task_context: Option<TaskContext>,
    pub messages: Vec<ChatMessage>,
    pub input_text: String,
    pub composer: ComposerPhase,
    pub unread_total: u64,
    pub last_error: Option<String>,
    pub empty_notice: Option<String>,
    pub channel_note: Option<String>,
    pub viewing_image: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            identity: None,
            auth_required: false,
            rooms: Vec::new(),
            tasks: Vec::new(),
            scope: None,
            counterpart: None,
            task_context: None,
            messages: Vec::new(),
            input_text: String::new(),
            composer: ComposerPhase::Idle,
            unread_total: 0,
            last_error: None,
            empty_notice: None,
            channel_note: None,
            viewing_image: None,
        }
    }

    /// Apply one network event; may yield a follow-up command.
    pub fn apply(&mut self, event: NetworkEvent) -> Option<NetworkCommand> {
        match event {
            NetworkEvent::SessionResolved(identity) => {
                self.identity = Some(identity);
            }
            NetworkEvent::AuthRequired => {
                self.auth_required = true;
            }
            NetworkEvent::RoomsLoaded(rooms) => {
                self.rooms = rooms;
            }
            NetworkEvent::TasksLoaded(tasks) => {
                self.tasks = tasks;
            }
            NetworkEvent::ScopeOpened {
                scope,
                counterpart,
                context,
            } => {
                self.scope = Some(scope);
                self.counterpart = counterpart.or_else(|| {
                    context.as_ref().map(|ctx| Counterpart {
                        nickname: ctx.buyer.nickname.clone(),
                        avatar: ctx.buyer.avatar.clone(),
                    })
                });
                self.task_context = context;
                self.messages.clear();
                self.empty_notice = None;
                self.last_error = None;
                self.channel_note = None;
            }
            NetworkEvent::HistoryLoaded { scope, messages } => {
                // Full replace, and only for the scope still active; a fetch
                // that lost a race with a room switch must not clobber it.
                if self.scope.as_ref() == Some(&scope) {
                    self.messages = messages;
                }
            }
            NetworkEvent::MessageSent(message) => {
                self.composer = ComposerPhase::Idle;
                self.push_message(message);
            }
            NetworkEvent::MessageReceived(message) => {
                self.push_message(message);
            }
            NetworkEvent::MessageDeleted(message_id) => {
                self.messages.retain(|message| message.id != message_id);
            }
            NetworkEvent::Notified(notice) => {
                log::debug!(
                    "new-message notice for room {}: {}",
                    notice.room_id,
                    notice.preview
                );
                return Some(NetworkCommand::RefreshUnread);
            }
            NetworkEvent::UnreadCount(total) => {
                self.unread_total = total;
            }
            NetworkEvent::ChannelDown(reason) => {
                self.channel_note = Some(reason);
            }
            NetworkEvent::EmptyState(text) => {
                self.empty_notice = Some(text);
            }
            NetworkEvent::RequestFailed(detail) => {
                // Non-fatal: the page stays interactive, the input is not
                // restored, the message list is untouched.
                self.composer = ComposerPhase::Idle;
                self.last_error = Some(detail);
            }
        }
        None
    }

    /// Append, skipping an id the list already holds. The send response and
    /// a server-side echo may both arrive; one render is the contract.
    pub fn push_message(&mut self, message: ChatMessage) {
        if message.id != 0 && self.messages.iter().any(|existing| existing.id == message.id) {
            return;
        }
        self.messages.push(message);
    }

    /// Counterpart for the header: the room-info record when present,
    /// otherwise the directory entry for the active room. Both are
    /// server-supplied; nothing client-side ever names the other party.
    pub fn counterpart_display(&self) -> Option<(String, Option<String>)> {
        if let Some(other) = &self.counterpart {
            return Some((other.nickname.clone(), other.avatar.clone()));
        }
        let room_id = self.scope.as_ref()?.room_id();
        self.rooms
            .iter()
            .find(|room| room.room_id == room_id)
            .map(|room| (room.other_nickname.clone(), room.other_avatar.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::MessageKind;

    fn message(id: i64, room_id: i64, sender_id: i64, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            room_id,
            sender_id,
            kind: MessageKind::Text,
            content: content.into(),
            file_url: None,
            created_at: None,
        }
    }

    fn state_in_room(room_id: i64) -> AppState {
        let mut state = AppState::new();
        state.apply(NetworkEvent::ScopeOpened {
            scope: ChatScope::Room(room_id),
            counterpart: None,
            context: None,
        });
        state
    }

    #[test]
    fn history_is_a_full_replace_for_the_active_scope() {
        let mut state = state_in_room(5);
        state.push_message(message(1, 5, 2, "old"));

        state.apply(NetworkEvent::HistoryLoaded {
            scope: ChatScope::Room(5),
            messages: vec![message(2, 5, 2, "a"), message(3, 5, 1, "b")],
        });
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].content, "a");
    }

    #[test]
    fn stale_history_for_a_previous_scope_is_dropped() {
        let mut state = state_in_room(5);
        state.apply(NetworkEvent::ScopeOpened {
            scope: ChatScope::Room(6),
            counterpart: None,
            context: None,
        });
        state.apply(NetworkEvent::HistoryLoaded {
            scope: ChatScope::Room(5),
            messages: vec![message(1, 5, 2, "stale")],
        });
        assert!(state.messages.is_empty());
    }

    #[test]
    fn send_then_echo_renders_once() {
        let mut state = state_in_room(5);
        state.apply(NetworkEvent::MessageSent(message(9, 5, 1, "hi")));
        // Adapter-level suppression should already drop the echo; the id
        // guard keeps the count at one even if a duplicate slips through.
        state.apply(NetworkEvent::MessageReceived(message(9, 5, 1, "hi")));
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn delete_removes_one_message_and_preserves_order() {
        let mut state = state_in_room(5);
        for id in 1..=3 {
            state.push_message(message(id, 5, 2, &format!("m{id}")));
        }
        state.apply(NetworkEvent::MessageDeleted(2));
        let contents: Vec<_> = state
            .messages
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(contents, ["m1", "m3"]);
    }

    #[test]
    fn failed_request_keeps_the_page_interactive() {
        let mut state = state_in_room(5);
        state.input_text = "typed after submit".into();
        state.composer = ComposerPhase::Submitting;
        state.push_message(message(1, 5, 2, "kept"));

        state.apply(NetworkEvent::RequestFailed("send failed".into()));

        assert_eq!(state.composer, ComposerPhase::Idle);
        assert_eq!(state.last_error.as_deref(), Some("send failed"));
        assert_eq!(state.messages.len(), 1);
        // The cleared-on-submit input is not restored; whatever is in the
        // box stays as-is.
        assert_eq!(state.input_text, "typed after submit");
    }

    #[test]
    fn notify_triggers_an_unread_refresh() {
        let mut state = AppState::new();
        let follow_up = state.apply(NetworkEvent::Notified(crate::common::Notice {
            to_user_id: 1,
            room_id: 5,
            preview: "hi".into(),
        }));
        assert!(matches!(follow_up, Some(NetworkCommand::RefreshUnread)));
    }

    #[test]
    fn counterpart_comes_from_the_authoritative_room_record() {
        let mut state = AppState::new();
        state.apply(NetworkEvent::RoomsLoaded(vec![Room {
            room_id: 5,
            other_nickname: "Kim".into(),
            other_avatar: Some("/a.png".into()),
        }]));
        state.apply(NetworkEvent::ScopeOpened {
            scope: ChatScope::Room(5),
            counterpart: None,
            context: None,
        });

        let (nickname, avatar) = state.counterpart_display().unwrap();
        assert_eq!(nickname, "Kim");
        assert_eq!(avatar.as_deref(), Some("/a.png"));
    }

    #[test]
    fn room_info_record_wins_over_the_directory_entry() {
        let mut state = AppState::new();
        state.apply(NetworkEvent::RoomsLoaded(vec![Room {
            room_id: 5,
            other_nickname: "Old".into(),
            other_avatar: None,
        }]));
        state.apply(NetworkEvent::ScopeOpened {
            scope: ChatScope::Room(5),
            counterpart: Some(Counterpart {
                nickname: "Kim".into(),
                avatar: Some("/a.png".into()),
            }),
            context: None,
        });

        let (nickname, _) = state.counterpart_display().unwrap();
        assert_eq!(nickname, "Kim");
    }

    #[test]
    fn auth_failure_halts_initialization() {
        let mut state = AppState::new();
        assert!(state.apply(NetworkEvent::AuthRequired).is_none());
        assert!(state.auth_required);
        assert!(state.rooms.is_empty());
    }
}
