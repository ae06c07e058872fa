use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::auth::identity::IdentityResolver;
use crate::AppState;

const ROOM_CAPACITY: usize = 64;

/// Named broadcast rooms. A room exists while at least one connection is
/// subscribed; the last leave drops it.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    rooms: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, channel: &str) -> broadcast::Receiver<String> {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    pub async fn publish(&self, channel: &str, message: String) {
        let rooms = self.rooms.lock().await;
        if let Some(tx) = rooms.get(channel) {
            // Send only fails when the room has no subscribers.
            let _ = tx.send(message);
        }
    }

    /// Drop the room if nobody is subscribed anymore.
    pub async fn prune(&self, channel: &str) {
        let mut rooms = self.rooms.lock().await;
        if let Some(tx) = rooms.get(channel) {
            if tx.receiver_count() == 0 {
                rooms.remove(channel);
            }
        }
    }

    #[cfg(test)]
    async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

/// Events the browser sends. The relayed copies carry an added `from`
/// field with the sender's user id.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ClientEvent {
    JoinChannel { channel: String },
    LeaveChannel { channel: String },
    TypingStart { channel: String },
    TypingStop { channel: String },
    ContentUpdate {
        channel: String,
        payload: serde_json::Value,
    },
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    // Same resolver as the HTTP middleware, so the two auth paths agree.
    let auth_user = match state.identity.resolve(query.token.as_deref(), &state.config) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("WebSocket auth failed: {}", e);
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    // The handshake additionally checks the identity against the user
    // store; a token for a deleted account must not connect.
    if matches!(state.identity, IdentityResolver::Jwt) {
        let known = sqlx::query_scalar::<_, i32>("SELECT 1 FROM users WHERE id = $1")
            .bind(auth_user.id)
            .fetch_optional(&state.db)
            .await;
        match known {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(user_id = %auth_user.id, "WebSocket token for unknown user");
                return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
            }
            Err(e) => {
                tracing::error!(error = %e, "WebSocket handshake user lookup failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
            }
        }
    }

    let registry = state.channels.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, registry, auth_user.id))
}

/// Relay a room message to this connection only when someone else sent it.
fn should_forward(raw: &str, self_id: Uuid) -> bool {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(parsed) => parsed
            .get("from")
            .and_then(|v| v.as_str())
            .map_or(true, |from| from != self_id.to_string()),
        Err(_) => false,
    }
}

/// Pump one room's broadcast into the connection's outbound queue. A slow
/// connection can fall behind the room buffer; that drops the backlog but
/// must not kill the subscription, so only `Closed` ends the loop.
async fn forward_room(
    mut rx: broadcast::Receiver<String>,
    out: mpsc::Sender<String>,
    self_id: Uuid,
) {
    loop {
        match rx.recv().await {
            Ok(raw) => {
                if !should_forward(&raw, self_id) {
                    continue;
                }
                if out.send(raw).await.is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(user_id = %self_id, skipped, "Connection fell behind room broadcast");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn handle_socket(socket: WebSocket, registry: ChannelRegistry, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();

    tracing::debug!(user_id = %user_id, "WebSocket connection established");

    // Room messages funnel through one outbound queue per connection.
    let (out_tx, mut out_rx) = mpsc::channel::<String>(ROOM_CAPACITY);

    let send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // One forwarding task per joined room, cancelled on leave/disconnect.
    let mut joined: HashMap<String, JoinHandle<()>> = HashMap::new();

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let event = match serde_json::from_str::<ClientEvent>(&text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(user_id = %user_id, error = %e, "Ignoring malformed socket message");
                continue;
            }
        };

        match event {
            ClientEvent::JoinChannel { channel } => {
                if joined.contains_key(&channel) {
                    continue;
                }
                let rx = registry.join(&channel).await;
                let handle = tokio::spawn(forward_room(rx, out_tx.clone(), user_id));
                joined.insert(channel, handle);
            }
            ClientEvent::LeaveChannel { channel } => {
                if let Some(handle) = joined.remove(&channel) {
                    handle.abort();
                    // The receiver only drops once the task is done; wait
                    // for that so the prune sees the true subscriber count.
                    let _ = handle.await;
                    registry.prune(&channel).await;
                }
            }
            ClientEvent::TypingStart { channel } => {
                relay(&registry, &channel, user_id, "typingStart", None).await;
            }
            ClientEvent::TypingStop { channel } => {
                relay(&registry, &channel, user_id, "typingStop", None).await;
            }
            ClientEvent::ContentUpdate { channel, payload } => {
                relay(&registry, &channel, user_id, "contentUpdate", Some(payload)).await;
            }
        }
    }

    // Teardown: cancel room forwards, drop empty rooms, stop the writer.
    for (channel, handle) in joined {
        handle.abort();
        let _ = handle.await;
        registry.prune(&channel).await;
    }
    send_task.abort();

    tracing::debug!(user_id = %user_id, "WebSocket connection closed");
}

async fn relay(
    registry: &ChannelRegistry,
    channel: &str,
    from: Uuid,
    event_type: &str,
    payload: Option<serde_json::Value>,
) {
    let mut msg = serde_json::json!({
        "type": event_type,
        "channel": channel,
        "from": from,
    });
    if let Some(payload) = payload {
        msg["payload"] = payload;
    }
    registry.publish(channel, msg.to_string()).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_parse() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type": "joinChannel", "channel": "planning"}"#).unwrap();
        assert!(matches!(event, ClientEvent::JoinChannel { channel } if channel == "planning"));

        let event: ClientEvent = serde_json::from_str(
            r#"{"type": "contentUpdate", "channel": "music", "payload": {"songId": 3}}"#,
        )
        .unwrap();
        match event {
            ClientEvent::ContentUpdate { channel, payload } => {
                assert_eq!(channel, "music");
                assert_eq!(payload["songId"], 3);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        assert!(serde_json::from_str::<ClientEvent>(r#"{"type": "unknown"}"#).is_err());
    }

    #[test]
    fn own_messages_are_not_echoed() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mine = format!(r#"{{"type": "typingStart", "from": "{}"}}"#, me);
        let theirs = format!(r#"{{"type": "typingStart", "from": "{}"}}"#, other);

        assert!(!should_forward(&mine, me));
        assert!(should_forward(&theirs, me));
        // Malformed frames never get relayed.
        assert!(!should_forward("not json", me));
    }

    #[tokio::test]
    async fn publish_reaches_room_members() {
        let registry = ChannelRegistry::new();
        let mut rx = registry.join("planning").await;

        registry.publish("planning", "hello".into()).await;
        assert_eq!(rx.recv().await.unwrap(), "hello");

        // Messages to other rooms are invisible.
        registry.join("music").await;
        registry.publish("music", "other".into()).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn lagged_member_resumes_receiving() {
        let registry = ChannelRegistry::new();
        let rx = registry.join("planning").await;

        let me = Uuid::new_v4();
        let (out_tx, mut out_rx) = mpsc::channel(ROOM_CAPACITY * 2);
        let forward = tokio::spawn(forward_room(rx, out_tx, me));

        // Overflow the room buffer before the forward task gets a chance
        // to poll, then send one more message it must still deliver.
        for i in 0..ROOM_CAPACITY * 2 {
            registry
                .publish("planning", format!(r#"{{"n": {}}}"#, i))
                .await;
        }
        registry.publish("planning", r#"{"n": "fresh"}"#.into()).await;

        let mut saw_fresh = false;
        for _ in 0..=ROOM_CAPACITY {
            let msg = out_rx.recv().await.unwrap();
            if msg.contains("fresh") {
                saw_fresh = true;
                break;
            }
        }
        assert!(saw_fresh);

        forward.abort();
    }

    #[tokio::test]
    async fn rooms_are_dropped_when_empty() {
        let registry = ChannelRegistry::new();
        let rx = registry.join("planning").await;
        assert_eq!(registry.room_count().await, 1);

        // Still subscribed: prune keeps the room.
        registry.prune("planning").await;
        assert_eq!(registry.room_count().await, 1);

        drop(rx);
        registry.prune("planning").await;
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn leave_prunes_only_after_the_forward_task_is_gone() {
        let registry = ChannelRegistry::new();
        let rx = registry.join("planning").await;

        let me = Uuid::new_v4();
        let (out_tx, _out_rx) = mpsc::channel(ROOM_CAPACITY);
        let forward = tokio::spawn(forward_room(rx, out_tx, me));

        // Same sequence as a leaveChannel frame: cancel, wait for the
        // receiver to drop, then prune.
        forward.abort();
        let _ = forward.await;
        registry.prune("planning").await;
        assert_eq!(registry.room_count().await, 0);
    }
}
