use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::api::{ApiClient, ApiError};
use crate::common::types::{ChatMessage, ChatScope, Identity, Room};
use crate::common::{NetworkCommand, NetworkEvent};
use crate::network::protocol;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Session state owned by the run loop. `socket` is the single push
/// connection this client instance may hold; it is replaced wholesale on a
/// scope switch, never shared.
struct Live {
    identity: Option<Identity>,
    active: Option<ChatScope>,
    socket: Option<WsStream>,
}

/// The network task: owns every REST call and the push channel, wired to
/// the UI over a command/event channel pair.
pub struct NetClient {
    api: ApiClient,
    ws_url: String,
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
}

impl NetClient {
    pub fn new(
        api: ApiClient,
        ws_url: String,
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
    ) -> Self {
        Self {
            api,
            ws_url,
            event_sender,
            command_receiver,
        }
    }

    pub async fn run(mut self) {
        log::info!("network event loop started");
        let mut live = Live {
            identity: None,
            active: None,
            socket: None,
        };

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command, &mut live).await,
                        None => break,
                    }
                }
                incoming = next_ws(&mut live.socket), if live.socket.is_some() => {
                    self.handle_ws(incoming, &mut live).await;
                }
            }
        }

        log::info!("network event loop stopped");
    }

    async fn handle_command(&mut self, command: NetworkCommand, live: &mut Live) {
        match command {
            NetworkCommand::Bootstrap { room, task } => self.bootstrap(room, task, live).await,
            NetworkCommand::OpenRoom(room_id) => self.open_room(room_id, live).await,
            NetworkCommand::OpenTask(task_key) => self.open_task(task_key, live).await,
            NetworkCommand::SendMessage { scope, text } => {
                self.send_message(scope, text, live).await
            }
            NetworkCommand::DeleteMessage(message_id) => self.delete_message(message_id).await,
            NetworkCommand::RefreshUnread => self.refresh_unread().await,
        }
    }

    /// Resolve the session, load the directory, open the initial scope.
    /// An unusable session halts here: no rooms, no channel, no retry.
    async fn bootstrap(&mut self, room: Option<i64>, task: Option<String>, live: &mut Live) {
        let identity = match self.api.fetch_me().await {
            Ok(identity) => identity,
            Err(err) => {
                log::warn!("session resolve failed: {err}");
                self.emit(NetworkEvent::AuthRequired).await;
                return;
            }
        };
        log::info!("session resolved for user {}", identity.id);
        self.emit(NetworkEvent::SessionResolved(identity.clone()))
            .await;
        live.identity = Some(identity);

        let rooms = match self.api.fetch_rooms().await {
            Ok(rooms) => rooms,
            Err(err) => {
                self.emit(NetworkEvent::RequestFailed(err.to_string())).await;
                Vec::new()
            }
        };
        self.emit(NetworkEvent::RoomsLoaded(rooms.clone())).await;

        match self.api.fetch_expert_tasks().await {
            Ok(tasks) => self.emit(NetworkEvent::TasksLoaded(tasks)).await,
            Err(err) => log::debug!("expert task list unavailable: {err}"),
        }

        self.refresh_unread().await;

        if let Some(task_key) = task {
            self.open_task(task_key, live).await;
        } else if let Some(room_id) = initial_room(room, &rooms) {
            self.open_room(room_id, live).await;
        } else {
            self.emit(NetworkEvent::EmptyState("No conversations yet".into()))
                .await;
        }
    }

    async fn open_room(&mut self, room_id: i64, live: &mut Live) {
        // The counterpart shown in the header comes from this record only;
        // navigation hints never name the other party.
        let counterpart = match self.api.fetch_room_info(room_id).await {
            Ok(other) => Some(other),
            Err(err) => {
                log::warn!("room-info fetch failed for room {room_id}: {err}");
                None
            }
        };
        let scope = ChatScope::Room(room_id);
        self.emit(NetworkEvent::ScopeOpened {
            scope: scope.clone(),
            counterpart,
            context: None,
        })
        .await;
        self.attach(scope, live).await;
    }

    async fn open_task(&mut self, task_key: String, live: &mut Live) {
        let context = match self.api.fetch_task_context(&task_key).await {
            Ok(context) => context,
            Err(ApiError::NotFound) => {
                self.emit(NetworkEvent::EmptyState(format!(
                    "Task {task_key} has no chat yet"
                )))
                .await;
                return;
            }
            Err(err) => {
                self.emit(NetworkEvent::RequestFailed(err.to_string())).await;
                return;
            }
        };
        let scope = ChatScope::Task {
            task_key,
            room_id: context.room_id,
        };
        self.emit(NetworkEvent::ScopeOpened {
            scope: scope.clone(),
            counterpart: None,
            context: Some(context),
        })
        .await;
        self.attach(scope, live).await;
    }

    /// Bind the push channel and history to a new scope. The previous
    /// connection is always torn down first; teardown errors are swallowed.
    async fn attach(&mut self, scope: ChatScope, live: &mut Live) {
        if let Some(mut old) = live.socket.take() {
            let _ = old.close(None).await;
        }
        live.active = Some(scope.clone());

        match connect_async(&self.ws_url).await {
            Ok((mut stream, _)) => {
                // Join is announced only once the handshake has succeeded.
                match serde_json::to_string(&protocol::join_frame(&scope)) {
                    Ok(text) => {
                        if let Err(err) = stream.send(WsMessage::Text(text)).await {
                            log::warn!("join announce failed: {err}");
                            self.emit(NetworkEvent::ChannelDown(err.to_string())).await;
                        } else {
                            live.socket = Some(stream);
                        }
                    }
                    Err(err) => log::warn!("join frame encode failed: {err}"),
                }
            }
            Err(err) => {
                // Logged and surfaced as status; the page stays usable and
                // no reconnect is attempted.
                log::warn!("push channel connect failed: {err}");
                self.emit(NetworkEvent::ChannelDown(err.to_string())).await;
            }
        }

        match self.api.fetch_history(&scope).await {
            Ok(messages) => {
                self.emit(NetworkEvent::HistoryLoaded { scope, messages })
                    .await
            }
            Err(err) => self.emit(NetworkEvent::RequestFailed(err.to_string())).await,
        }
    }

    /// REST-first send: the persisted record is rendered once from the
    /// response, then broadcast so other participants hear about it.
    async fn send_message(&mut self, scope: ChatScope, text: String, live: &mut Live) {
        let Some(identity) = live.identity.clone() else {
            self.emit(NetworkEvent::AuthRequired).await;
            return;
        };
        match self.api.send(&scope, &text, &identity).await {
            Ok(message) => {
                self.emit(NetworkEvent::MessageSent(message.clone())).await;
                self.broadcast(&scope, message, live).await;
            }
            Err(ApiError::EmptyInput) => {
                // The composer refuses blank input; nothing went out.
                log::debug!("blank outgoing message dropped");
            }
            Err(err) => self.emit(NetworkEvent::RequestFailed(err.to_string())).await,
        }
    }

    async fn broadcast(&self, scope: &ChatScope, message: ChatMessage, live: &mut Live) {
        let Some(stream) = live.socket.as_mut() else {
            log::debug!("no push connection; counterpart sees the message on next fetch");
            return;
        };
        match serde_json::to_string(&protocol::broadcast_frame(scope, message)) {
            Ok(text) => {
                if let Err(err) = stream.send(WsMessage::Text(text)).await {
                    log::warn!("broadcast failed: {err}");
                }
            }
            Err(err) => log::warn!("broadcast frame encode failed: {err}"),
        }
    }

    async fn delete_message(&mut self, message_id: i64) {
        match self.api.delete_message(message_id).await {
            Ok(()) => self.emit(NetworkEvent::MessageDeleted(message_id)).await,
            Err(err) => {
                self.emit(NetworkEvent::RequestFailed(format!("delete failed: {err}")))
                    .await
            }
        }
    }

    async fn refresh_unread(&mut self) {
        match self.api.fetch_unread().await {
            Ok(total) => self.emit(NetworkEvent::UnreadCount(total)).await,
            Err(err) => log::debug!("unread count unavailable: {err}"),
        }
    }

    async fn handle_ws(&mut self, incoming: Option<Result<WsMessage, WsError>>, live: &mut Live) {
        match incoming {
            Some(Ok(WsMessage::Text(text))) => self.handle_frame(&text, live).await,
            Some(Ok(WsMessage::Ping(data))) => {
                if let Some(stream) = live.socket.as_mut() {
                    let _ = stream.send(WsMessage::Pong(data)).await;
                }
            }
            Some(Ok(WsMessage::Close(_))) | None => {
                live.socket = None;
                log::info!("push channel closed");
                self.emit(NetworkEvent::ChannelDown("connection closed".into()))
                    .await;
            }
            Some(Err(err)) => {
                live.socket = None;
                log::warn!("push channel error: {err}");
                self.emit(NetworkEvent::ChannelDown(err.to_string())).await;
            }
            Some(Ok(_)) => {}
        }
    }

    async fn handle_frame(&mut self, text: &str, live: &mut Live) {
        let Some(frame) = protocol::parse_frame(text) else {
            log::debug!("unrecognized push frame: {text}");
            return;
        };
        let identity_id = live
            .identity
            .as_ref()
            .map(|identity| identity.id)
            .unwrap_or_default();

        if let Some(active) = live.active.as_ref() {
            if let Some(message) = protocol::inbound_message(active, identity_id, &frame) {
                self.emit(NetworkEvent::MessageReceived(message)).await;
                return;
            }
        }
        if let Some(notice) = protocol::inbound_notice(identity_id, &frame) {
            self.emit(NetworkEvent::Notified(notice)).await;
        }
    }

    async fn emit(&self, event: NetworkEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("failed to notify UI: {err}");
        }
    }
}

async fn next_ws(socket: &mut Option<WsStream>) -> Option<Result<WsMessage, WsError>> {
    match socket {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

/// The navigation parameter wins; otherwise the first room in the server's
/// order; otherwise nothing (empty state).
fn initial_room(requested: Option<i64>, rooms: &[Room]) -> Option<i64> {
    requested.or_else(|| rooms.first().map(|room| room.room_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(room_id: i64, nickname: &str) -> Room {
        Room {
            room_id,
            other_nickname: nickname.into(),
            other_avatar: None,
        }
    }

    #[test]
    fn requested_room_wins_over_directory_order() {
        let rooms = [room(3, "Kim"), room(9, "Lee")];
        assert_eq!(initial_room(Some(9), &rooms), Some(9));
    }

    #[test]
    fn first_room_in_server_order_is_auto_selected() {
        let rooms = [room(3, "Kim"), room(9, "Lee")];
        assert_eq!(initial_room(None, &rooms), Some(3));
    }

    #[test]
    fn no_rooms_means_no_selection() {
        assert_eq!(initial_room(None, &[]), None);
    }
}
