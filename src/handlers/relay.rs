//! Relay dispatcher: forwards allowed frames to the opposite peer.

use axum::extract::ws::Message;

use crate::protocol::Role;
use crate::state::AppState;

/// Message types eligible for relay. Everything else is dropped without
/// effect, a fail-closed filter against arbitrary payload injection.
const RELAY_TYPES: [&str; 5] = [
    "OFFER",
    "ANSWER",
    "ICE_CANDIDATE",
    "FRET_UPDATE",
    "STRUM_EVENT",
];

pub fn is_relayable(kind: &str) -> bool {
    RELAY_TYPES.contains(&kind)
}

/// Forward the raw frame text verbatim to every occupant except the sender.
/// The payload is never interpreted. A failed send to one peer is logged and
/// never surfaces to the sender or blocks other deliveries.
pub fn dispatch(state: &AppState, room: &str, sender_role: Role, kind: &str, raw: &str) {
    for (peer_role, sender) in state.registry.peers_excluding(room, sender_role) {
        if sender.send(Message::Text(raw.to_owned())).is_err() {
            tracing::debug!(
                room_id = %room,
                to = %peer_role,
                kind = %kind,
                "relay target gone, frame dropped"
            );
        }
    }
    tracing::trace!(room_id = %room, from = %sender_role, kind = %kind, "relayed frame");
}
