pub mod commands;
pub mod events;
pub mod types;

pub use commands::NetworkCommand;
pub use events::NetworkEvent;
pub use types::{
    ChatMessage, ChatScope, Counterpart, ExpertTask, Identity, MessageKind, Notice, Room,
    TaskContext,
};
