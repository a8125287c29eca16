use serde::{Deserialize, Serialize};

use crate::common::types::{ChatMessage, ChatScope, Notice};

/// Wire frames on the push channel. Every frame is a JSON object of the form
/// `{"event": "<name>", "data": {...}}`; transport-level connect/disconnect
/// map onto the websocket handshake and stream end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Frame {
    #[serde(rename = "chat:join")]
    ChatJoin {
        #[serde(rename = "roomId")]
        room_id: i64,
    },
    #[serde(rename = "chat:message")]
    ChatMessage(ChatMessage),
    #[serde(rename = "chat:notify")]
    ChatNotify(Notice),
    #[serde(rename = "task:join")]
    TaskJoin {
        #[serde(rename = "taskKey")]
        task_key: String,
    },
    #[serde(rename = "task:new")]
    TaskNew(TaskFrame),
    #[serde(rename = "task:send")]
    TaskSend(TaskFrame),
}

/// Task events carry the task key alongside the message payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFrame {
    #[serde(rename = "taskKey", alias = "task_key")]
    pub task_key: String,
    pub message: ChatMessage,
}

/// The join announcement sent once the connect handshake has succeeded.
pub fn join_frame(scope: &ChatScope) -> Frame {
    match scope {
        ChatScope::Room(room_id) => Frame::ChatJoin { room_id: *room_id },
        ChatScope::Task { task_key, .. } => Frame::TaskJoin {
            task_key: task_key.clone(),
        },
    }
}

/// Propagation-only broadcast of an already-persisted message. The sender
/// never renders from the echo of its own broadcast.
pub fn broadcast_frame(scope: &ChatScope, message: ChatMessage) -> Frame {
    match scope {
        ChatScope::Room(_) => Frame::ChatMessage(message),
        ChatScope::Task { task_key, .. } => Frame::TaskSend(TaskFrame {
            task_key: task_key.clone(),
            message,
        }),
    }
}

/// Unknown event names and malformed payloads yield `None`; the caller logs
/// and moves on.
pub fn parse_frame(text: &str) -> Option<Frame> {
    serde_json::from_str(text).ok()
}

/// Inbound message filter: the frame must be tagged with the active scope,
/// and a frame whose sender is the current identity is dropped — the send
/// response already rendered that message once.
pub fn inbound_message(scope: &ChatScope, identity_id: i64, frame: &Frame) -> Option<ChatMessage> {
    let (scope_matches, message) = match frame {
        Frame::ChatMessage(message) => (message.room_id == scope.room_id(), message),
        Frame::TaskNew(task) => match scope {
            ChatScope::Task { task_key, .. } => (task.task_key == *task_key, &task.message),
            ChatScope::Room(_) => (false, &task.message),
        },
        _ => return None,
    };
    if !scope_matches {
        // Stale frame from a torn-down scope, or misrouted by the server.
        return None;
    }
    if message.sender_id == identity_id {
        return None;
    }
    Some(message.clone())
}

/// Notification filter: only notices addressed to the current identity pass.
pub fn inbound_notice(identity_id: i64, frame: &Frame) -> Option<Notice> {
    match frame {
        Frame::ChatNotify(notice) if notice.to_user_id == identity_id => Some(notice.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::MessageKind;

    fn message(id: i64, room_id: i64, sender_id: i64) -> ChatMessage {
        ChatMessage {
            id,
            room_id,
            sender_id,
            kind: MessageKind::Text,
            content: "hi".into(),
            file_url: None,
            created_at: None,
        }
    }

    #[test]
    fn join_frames_carry_the_scope_key() {
        let room = serde_json::to_string(&join_frame(&ChatScope::Room(5))).unwrap();
        assert!(room.contains(r#""event":"chat:join""#));
        assert!(room.contains(r#""roomId":5"#));

        let task_scope = ChatScope::Task {
            task_key: "T-9".into(),
            room_id: 2,
        };
        let task = serde_json::to_string(&join_frame(&task_scope)).unwrap();
        assert!(task.contains(r#""event":"task:join""#));
        assert!(task.contains(r#""taskKey":"T-9""#));
    }

    #[test]
    fn unknown_events_are_ignored() {
        assert!(parse_frame(r#"{"event":"presence:ping","data":{}}"#).is_none());
        assert!(parse_frame("not json").is_none());
    }

    #[test]
    fn foreign_room_frames_are_discarded() {
        let frame = Frame::ChatMessage(message(1, 8, 2));
        assert!(inbound_message(&ChatScope::Room(5), 1, &frame).is_none());
    }

    #[test]
    fn self_echo_is_suppressed() {
        let frame = Frame::ChatMessage(message(1, 5, 1));
        assert!(inbound_message(&ChatScope::Room(5), 1, &frame).is_none());
    }

    #[test]
    fn counterpart_message_in_active_room_passes() {
        let frame = Frame::ChatMessage(message(1, 5, 2));
        let passed = inbound_message(&ChatScope::Room(5), 1, &frame).unwrap();
        assert_eq!(passed.sender_id, 2);
    }

    #[test]
    fn stale_frames_after_a_room_switch_are_inert() {
        // Active scope moved from room 5 to room 6; a frame still tagged
        // with room 5 must never render.
        let frame = Frame::ChatMessage(message(9, 5, 2));
        assert!(inbound_message(&ChatScope::Room(6), 1, &frame).is_none());
    }

    #[test]
    fn task_frames_match_on_the_task_key() {
        let scope = ChatScope::Task {
            task_key: "T-9".into(),
            room_id: 2,
        };
        let ours = Frame::TaskNew(TaskFrame {
            task_key: "T-9".into(),
            message: message(1, 2, 7),
        });
        let theirs = Frame::TaskNew(TaskFrame {
            task_key: "T-4".into(),
            message: message(1, 2, 7),
        });
        assert!(inbound_message(&scope, 1, &ours).is_some());
        assert!(inbound_message(&scope, 1, &theirs).is_none());
        // Task events never render into a plain room scope.
        assert!(inbound_message(&ChatScope::Room(2), 1, &ours).is_none());
    }

    #[test]
    fn notices_for_other_identities_are_dropped() {
        let frame = Frame::ChatNotify(Notice {
            to_user_id: 3,
            room_id: 5,
            preview: "new message".into(),
        });
        assert!(inbound_notice(3, &frame).is_some());
        assert!(inbound_notice(1, &frame).is_none());
    }
}
