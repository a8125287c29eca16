use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};

/// Ids arrive from the API as JSON numbers or as numeric strings depending on
/// the endpoint's vintage. Everything downstream compares numerically, so the
/// coercion happens once, here.
pub fn de_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Str(String),
    }

    match IdRepr::deserialize(deserializer)? {
        IdRepr::Num(n) => Ok(n),
        IdRepr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// The authenticated user, resolved once per session from `/auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    pub nickname: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// One two-party conversation. The counterpart fields are whatever the server
/// said, verbatim; the client never resolves "who is the other party" itself.
#[derive(Debug, Clone, Deserialize)]
pub struct Room {
    #[serde(alias = "roomId", deserialize_with = "de_id")]
    pub room_id: i64,
    #[serde(alias = "otherNickname")]
    pub other_nickname: String,
    #[serde(default, alias = "otherAvatar")]
    pub other_avatar: Option<String>,
}

/// Counterpart of a single room, from `/chat/room-info`.
#[derive(Debug, Clone, Deserialize)]
pub struct Counterpart {
    pub nickname: String,
    #[serde(default, alias = "avatar_url")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
}

/// Canonical chat message. The API has grown two field-naming conventions
/// over time (`sender_id`/`senderId`, `message`/`content`, ...); both are
/// accepted on the way in and only this shape exists past the boundary.
///
/// `id == 0` marks a locally materialized echo for the one send endpoint
/// whose envelope carries no message record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "de_id")]
    pub id: i64,
    #[serde(rename = "room_id", alias = "roomId", deserialize_with = "de_id")]
    pub room_id: i64,
    #[serde(rename = "sender_id", alias = "senderId", deserialize_with = "de_id")]
    pub sender_id: i64,
    #[serde(rename = "message_type", alias = "type", default)]
    pub kind: MessageKind,
    #[serde(alias = "message", default)]
    pub content: String,
    #[serde(rename = "file_url", alias = "fileUrl", default)]
    pub file_url: Option<String>,
    #[serde(rename = "created_at", alias = "createdAt", default)]
    pub created_at: Option<String>,
}

impl ChatMessage {
    /// Self/other classification is numeric equality against the session
    /// identity, regardless of how the ids arrived on the wire.
    pub fn is_self(&self, identity: &Identity) -> bool {
        self.sender_id == identity.id
    }

    /// Local wall-clock time for display, when the server timestamp parses.
    pub fn display_time(&self) -> Option<String> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Local).format("%H:%M").to_string())
    }
}

/// Read-only projection binding a task to its room, from
/// `/api/task-chat/context`. Never mutated by this client.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskContext {
    #[serde(rename = "serviceTitle", alias = "service_title")]
    pub service_title: String,
    pub buyer: Identity,
    #[serde(rename = "roomId", alias = "room_id", deserialize_with = "de_id")]
    pub room_id: i64,
}

/// Entry in the expert's task list; the way into a task-scoped chat.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpertTask {
    #[serde(rename = "taskKey", alias = "task_key")]
    pub task_key: String,
    #[serde(rename = "serviceTitle", alias = "service_title")]
    pub service_title: String,
    #[serde(default)]
    pub status: String,
}

/// `chat:notify` payload: a new-message nudge addressed to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    #[serde(rename = "toUserId", alias = "to_user_id", deserialize_with = "de_id")]
    pub to_user_id: i64,
    #[serde(rename = "roomId", alias = "room_id", deserialize_with = "de_id")]
    pub room_id: i64,
    #[serde(default, alias = "message")]
    pub preview: String,
}

/// Which conversation the client is currently bound to. Selects both the
/// REST endpoints and the push-channel join/propagate events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatScope {
    Room(i64),
    Task { task_key: String, room_id: i64 },
}

impl ChatScope {
    pub fn room_id(&self) -> i64 {
        match self {
            ChatScope::Room(id) => *id,
            ChatScope::Task { room_id, .. } => *room_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: i64) -> Identity {
        Identity {
            id,
            nickname: "me".into(),
            avatar: None,
        }
    }

    #[test]
    fn message_accepts_both_field_conventions() {
        let legacy: ChatMessage = serde_json::from_str(
            r#"{"id":7,"room_id":3,"sender_id":"12","message":"hi","file_url":null}"#,
        )
        .unwrap();
        let modern: ChatMessage = serde_json::from_str(
            r#"{"id":"7","roomId":"3","senderId":12,"content":"hi","fileUrl":null}"#,
        )
        .unwrap();

        assert_eq!(legacy.id, modern.id);
        assert_eq!(legacy.room_id, 3);
        assert_eq!(modern.room_id, 3);
        assert_eq!(legacy.sender_id, 12);
        assert_eq!(modern.sender_id, 12);
        assert_eq!(legacy.content, "hi");
        assert_eq!(modern.content, "hi");
    }

    #[test]
    fn self_classification_is_numeric_across_representations() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"id":1,"roomId":9,"senderId":"1","content":"hi","createdAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert!(msg.is_self(&identity(1)));
        assert!(!msg.is_self(&identity(2)));
    }

    #[test]
    fn image_kind_and_file_url_normalize() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"id":2,"room_id":1,"sender_id":5,"type":"image","file_url":"/up/x.png"}"#,
        )
        .unwrap();

        assert_eq!(msg.kind, MessageKind::Image);
        assert_eq!(msg.file_url.as_deref(), Some("/up/x.png"));
        assert_eq!(msg.content, "");
    }

    #[test]
    fn room_counterpart_fields_are_taken_verbatim() {
        let room: Room = serde_json::from_str(
            r#"{"room_id":5,"other_nickname":"Kim","other_avatar":"/a.png"}"#,
        )
        .unwrap();

        assert_eq!(room.room_id, 5);
        assert_eq!(room.other_nickname, "Kim");
        assert_eq!(room.other_avatar.as_deref(), Some("/a.png"));
    }

    #[test]
    fn counterpart_accepts_avatar_url_alias() {
        let other: Counterpart =
            serde_json::from_str(r#"{"nickname":"Kim","avatar_url":"/a.png"}"#).unwrap();
        assert_eq!(other.avatar.as_deref(), Some("/a.png"));
    }

    #[test]
    fn scope_exposes_its_room_binding() {
        assert_eq!(ChatScope::Room(4).room_id(), 4);
        let task = ChatScope::Task {
            task_key: "T-77".into(),
            room_id: 9,
        };
        assert_eq!(task.room_id(), 9);
    }
}
