//! Per-connection session: join handshake, relay loop, teardown.
//!
//! Each socket gets a reader (this task) and a writer task fed by an
//! unbounded mpsc channel. The channel serializes all outbound frames for a
//! socket, so JOINED/READY/relay/PEER_DISCONNECTED writes from concurrent
//! triggers never interleave.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::handlers::relay;
use crate::protocol::{room_id, JoinRequest, Role, ServerMessage};
use crate::registry::{JoinError, JoinOutcome, OutboundSender, PeerHandle};
use crate::state::AppState;

/// RFC 6455 policy-violation close code, distinguishes auth failures.
const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Drive one WebSocket connection from accept to teardown.
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();
    let send_task = tokio::spawn(writer_task(ws_sender, rx));
    let conn_id = Uuid::new_v4();

    match await_join(&state, conn_id, &tx, &mut ws_receiver).await {
        Some(mut session) => {
            relay_loop(&state, &session, &mut ws_receiver).await;
            session.release(&state);
        }
        None => {
            // rejected or invalid handshake; a close frame may already be
            // queued, and a second one is ignored by the writer
            let _ = tx.send(Message::Close(None));
        }
    }

    // Dropping our sender lets the writer drain queued frames and exit.
    drop(tx);
    let _ = send_task.await;
}

/// Forward frames from the session's outbound channel to the socket sink.
async fn writer_task(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = rx.recv().await {
        let closing = matches!(message, Message::Close(_));
        if sink.send(message).await.is_err() || closing {
            break;
        }
    }
}

/// A connection that has claimed a slot. The binding is used exactly once to
/// release it, even if several error paths reach teardown.
struct JoinedSession {
    conn_id: Uuid,
    room: String,
    role: Role,
    released: bool,
}

impl JoinedSession {
    fn release(&mut self, state: &AppState) {
        if self.released {
            return;
        }
        self.released = true;
        let remaining = state.registry.leave(&self.room, self.role);
        for (peer_role, sender) in remaining {
            // fire-and-forget per recipient
            if !send(&sender, &ServerMessage::PeerDisconnected { role: self.role }) {
                tracing::debug!(
                    room_id = %self.room,
                    to = %peer_role,
                    "peer gone before disconnect notification"
                );
            }
        }
        tracing::info!(
            room_id = %self.room,
            role = %self.role,
            conn_id = %self.conn_id,
            "peer disconnected"
        );
    }
}

/// AwaitingJoin state: the first text frame must be a valid JOIN. Returns the
/// joined session, or `None` after queueing any ERROR/close replies.
async fn await_join(
    state: &Arc<AppState>,
    conn_id: Uuid,
    tx: &OutboundSender,
    ws_receiver: &mut SplitStream<WebSocket>,
) -> Option<JoinedSession> {
    let text = loop {
        match ws_receiver.next().await? {
            Ok(Message::Text(text)) => break text,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            // close, binary, or transport error before JOIN
            _ => return None,
        }
    };

    // Unparseable or wrong-typed first frames close without a reply; the
    // peer cannot be trusted to parse a structured error.
    let frame: Value = serde_json::from_str(&text).ok()?;
    if frame.get("type").and_then(Value::as_str) != Some("JOIN") {
        tracing::debug!(conn_id = %conn_id, "first frame was not JOIN, closing");
        return None;
    }

    match try_join(state, conn_id, tx, JoinRequest::from_frame(&frame)) {
        Ok(outcome) => {
            send(
                tx,
                &ServerMessage::Joined {
                    room_id: outcome.room.clone(),
                    role: outcome.role,
                },
            );
            if outcome.room_now_full {
                for (_, sender) in state.registry.occupants(&outcome.room) {
                    send(
                        &sender,
                        &ServerMessage::Ready {
                            room_id: outcome.room.clone(),
                        },
                    );
                }
            }
            tracing::info!(
                room_id = %outcome.room,
                role = %outcome.role,
                conn_id = %conn_id,
                full = outcome.room_now_full,
                "peer joined"
            );
            Some(JoinedSession {
                conn_id,
                room: outcome.room,
                role: outcome.role,
                released: false,
            })
        }
        Err(error) => {
            send(
                tx,
                &ServerMessage::Error {
                    message: error.to_string(),
                },
            );
            let _ = tx.send(Message::Close(close_frame(error)));
            tracing::warn!(conn_id = %conn_id, %error, "join rejected");
            None
        }
    }
}

/// Validate room, role, and token, then claim the slot in the registry.
fn try_join(
    state: &AppState,
    conn_id: Uuid,
    tx: &OutboundSender,
    request: JoinRequest,
) -> Result<JoinOutcome, JoinError> {
    let room = room_id::sanitize(&request.room_id);
    let role = match Role::from_wire(&request.role) {
        Some(role) if !room.is_empty() => role,
        _ => return Err(JoinError::InvalidRoomOrRole),
    };
    if !state.config.dev_mode() && !state.tokens.validate(&room, &request.token) {
        return Err(JoinError::Unauthorized);
    }
    state.registry.try_join(
        &room,
        role,
        PeerHandle {
            id: conn_id,
            sender: tx.clone(),
        },
    )
}

fn close_frame(error: JoinError) -> Option<CloseFrame<'static>> {
    match error {
        JoinError::Unauthorized => Some(CloseFrame {
            code: CLOSE_POLICY_VIOLATION,
            reason: "Unauthorized".into(),
        }),
        _ => None,
    }
}

/// Joined state: parse each inbound frame and hand relayable ones to the
/// dispatcher. Frames without a `type` and unrecognized types are ignored;
/// malformed JSON tears the session down.
async fn relay_loop(
    state: &Arc<AppState>,
    session: &JoinedSession,
    ws_receiver: &mut SplitStream<WebSocket>,
) {
    while let Some(Ok(message)) = ws_receiver.next().await {
        match message {
            Message::Text(text) => {
                let Ok(frame) = serde_json::from_str::<Value>(&text) else {
                    tracing::warn!(
                        room_id = %session.room,
                        role = %session.role,
                        "malformed frame, closing session"
                    );
                    break;
                };
                let Some(kind) = frame.get("type").and_then(Value::as_str) else {
                    continue;
                };
                if relay::is_relayable(kind) {
                    relay::dispatch(state, &session.room, session.role, kind, &text);
                }
                // anything else is ignored for forward compatibility
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

/// Serialize and queue a server message. Returns false if the peer's writer
/// is gone; callers treat that as a dropped notification, never an error.
fn send(tx: &OutboundSender, message: &ServerMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(json) => tx.send(Message::Text(json)).is_ok(),
        Err(_) => false,
    }
}
