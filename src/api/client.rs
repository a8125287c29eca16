use chrono::Utc;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;
use crate::common::types::{
    ChatMessage, ChatScope, Counterpart, ExpertTask, Identity, MessageKind, Room, TaskContext,
};

/// REST client for the BlueOn API. The cookie jar carries the session cookie
/// the identity endpoint relies on.
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// `GET /auth/me`. Any failure here means the session is not usable;
    /// callers show the sign-in screen and stop.
    pub async fn fetch_me(&self) -> Result<Identity, ApiError> {
        let body = self.get_body("/auth/me").await.map_err(|err| {
            log::warn!("identity fetch failed: {err}");
            ApiError::AuthRequired
        })?;
        let envelope: MeEnvelope = parse_envelope(&body).map_err(|_| ApiError::AuthRequired)?;
        if !envelope.success {
            return Err(ApiError::AuthRequired);
        }
        envelope.user.ok_or(ApiError::AuthRequired)
    }

    /// `GET /chat/rooms`, server order preserved.
    pub async fn fetch_rooms(&self) -> Result<Vec<Room>, ApiError> {
        let envelope: RoomsEnvelope = parse_envelope(&self.get_body("/chat/rooms").await?)?;
        if !envelope.success {
            return Err(failed(envelope.error));
        }
        Ok(envelope.rooms)
    }

    /// `GET /chat/room-info?roomId=` — the authoritative counterpart record.
    pub async fn fetch_room_info(&self, room_id: i64) -> Result<Counterpart, ApiError> {
        let path = format!("/chat/room-info?roomId={room_id}");
        let envelope: RoomInfoEnvelope = parse_envelope(&self.get_body(&path).await?)?;
        if !envelope.success {
            return Err(failed(envelope.error));
        }
        envelope.other.ok_or(ApiError::NotFound)
    }

    /// History for a scope, in the order the server returned it. Callers
    /// replace their whole message list with the result.
    pub async fn fetch_history(&self, scope: &ChatScope) -> Result<Vec<ChatMessage>, ApiError> {
        let path = match scope {
            ChatScope::Room(room_id) => format!("/chat/messages?roomId={room_id}"),
            ChatScope::Task { room_id, .. } => {
                format!("/api/task-chat/messages?roomId={room_id}")
            }
        };
        let envelope: MessagesEnvelope = parse_envelope(&self.get_body(&path).await?)?;
        if !envelope.success {
            return Err(failed(envelope.error));
        }
        Ok(envelope.messages)
    }

    /// Persist an outgoing message. Blank text short-circuits before any
    /// request is issued. On success the returned record is the single
    /// render source for this message.
    pub async fn send(
        &self,
        scope: &ChatScope,
        text: &str,
        identity: &Identity,
    ) -> Result<ChatMessage, ApiError> {
        let text = validate_outgoing(text)?;
        let body = match scope {
            ChatScope::Room(room_id) => {
                let payload = serde_json::json!({
                    "roomId": room_id,
                    "message": text,
                    "message_type": "text",
                });
                self.post_body("/chat/send-message", &payload).await?
            }
            ChatScope::Task { task_key, .. } => {
                let payload = serde_json::json!({ "taskKey": task_key, "message": text });
                self.post_body("/api/task-chat/send", &payload).await?
            }
        };
        let envelope: SendEnvelope = parse_envelope(&body)?;
        if !envelope.success {
            return Err(failed(envelope.error));
        }
        // `/chat/send-message` acks without a message record; materialize
        // the canonical echo locally in that case (id 0 sentinel).
        Ok(envelope
            .message
            .unwrap_or_else(|| local_echo(scope.room_id(), identity.id, text)))
    }

    /// `DELETE /chat/message/:id`. Only ever called for self-authored
    /// messages; on failure the rendered list is left untouched.
    pub async fn delete_message(&self, message_id: i64) -> Result<(), ApiError> {
        let url = format!("{}/chat/message/{message_id}", self.base);
        let response = self.http.delete(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::RequestFailed(format!("HTTP {status}")));
        }
        let envelope: AckEnvelope = parse_envelope(&body)?;
        if !envelope.success {
            return Err(failed(envelope.error));
        }
        Ok(())
    }

    pub async fn fetch_unread(&self) -> Result<u64, ApiError> {
        let envelope: UnreadEnvelope = parse_envelope(&self.get_body("/chat/unread-count").await?)?;
        if !envelope.success {
            return Err(failed(envelope.error));
        }
        Ok(envelope.total)
    }

    /// `GET /api/task-chat/context?taskKey=` — the task → room binding.
    pub async fn fetch_task_context(&self, task_key: &str) -> Result<TaskContext, ApiError> {
        let path = format!("/api/task-chat/context?taskKey={task_key}");
        let envelope: ContextEnvelope = parse_envelope(&self.get_body(&path).await?)?;
        if !envelope.success {
            return Err(failed(envelope.error));
        }
        envelope.context.ok_or(ApiError::NotFound)
    }

    /// `GET /expert/tasks` — entry points for task-scoped chats.
    pub async fn fetch_expert_tasks(&self) -> Result<Vec<ExpertTask>, ApiError> {
        let envelope: TasksEnvelope = parse_envelope(&self.get_body("/expert/tasks").await?)?;
        if !envelope.success {
            return Err(failed(envelope.error));
        }
        Ok(envelope.tasks)
    }

    async fn get_body(&self, path: &str) -> Result<String, ApiError> {
        let response = self.http.get(format!("{}{path}", self.base)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::RequestFailed(format!("HTTP {status}")));
        }
        Ok(body)
    }

    async fn post_body(&self, path: &str, payload: &serde_json::Value) -> Result<String, ApiError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base))
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::RequestFailed(format!("HTTP {status}")));
        }
        Ok(body)
    }
}

/// Decode a response body that must be a JSON envelope.
fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::MalformedResponse(err.to_string()))
}

fn failed(detail: Option<String>) -> ApiError {
    ApiError::RequestFailed(detail.unwrap_or_else(|| "server reported failure".into()))
}

fn validate_outgoing(text: &str) -> Result<&str, ApiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::EmptyInput);
    }
    Ok(trimmed)
}

fn local_echo(room_id: i64, sender_id: i64, text: &str) -> ChatMessage {
    ChatMessage {
        id: 0,
        room_id,
        sender_id,
        kind: MessageKind::Text,
        content: text.to_string(),
        file_url: None,
        created_at: Some(Utc::now().to_rfc3339()),
    }
}

#[derive(Deserialize)]
struct MeEnvelope {
    success: bool,
    #[serde(default)]
    user: Option<Identity>,
}

#[derive(Deserialize)]
struct RoomsEnvelope {
    success: bool,
    #[serde(default)]
    rooms: Vec<Room>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct RoomInfoEnvelope {
    success: bool,
    #[serde(default)]
    other: Option<Counterpart>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct MessagesEnvelope {
    success: bool,
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct SendEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AckEnvelope {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct UnreadEnvelope {
    success: bool,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ContextEnvelope {
    success: bool,
    #[serde(default)]
    context: Option<TaskContext>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct TasksEnvelope {
    success: bool,
    #[serde(default)]
    tasks: Vec<ExpertTask>,
    #[serde(default)]
    error: Option<String>,
}
