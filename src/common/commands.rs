use crate::common::types::ChatScope;

/// Commands the UI sends down to the network task.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Resolve the session, load rooms/tasks, then open the initial scope.
    /// `room`/`task` carry the CLI navigation flags, if any.
    Bootstrap {
        room: Option<i64>,
        task: Option<String>,
    },
    OpenRoom(i64),
    /// Open a task-scoped chat; the room binding is resolved server-side
    /// from the task context.
    OpenTask(String),
    SendMessage { scope: ChatScope, text: String },
    DeleteMessage(i64),
    RefreshUnread,
}
