//! Room registry: the single source of truth for which roles are occupied in
//! which rooms.
//!
//! Rooms are created lazily on the first successful join and deleted eagerly
//! when the last occupant leaves. Every mutation and dispatch read goes
//! through the `DashMap` entry locks, so concurrent joins and leaves for the
//! same room are serialized. Senders are cloned out of the map before any
//! frame is written; no lock is ever held across socket I/O.

use axum::extract::ws::Message;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::protocol::Role;
use crate::token::TokenStore;

/// Handle for pushing frames to one connection's writer task.
pub type OutboundSender = UnboundedSender<Message>;

/// Opaque handle to a live connection occupying a slot.
#[derive(Clone)]
pub struct PeerHandle {
    pub id: Uuid,
    pub sender: OutboundSender,
}

#[derive(Default)]
struct Room {
    slots: HashMap<Role, PeerHandle>,
}

/// Why a JOIN was rejected. Display strings are the wire-level ERROR messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Invalid room or role")]
    InvalidRoomOrRole,
    #[error("Unauthorized: Invalid token")]
    Unauthorized,
    #[error("Role already taken in this room")]
    RoleTaken,
}

/// Result of a successful join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub room: String,
    pub role: Role,
    /// True exactly when this join brought occupancy to 2; the trigger for
    /// emitting READY to both occupants.
    pub room_now_full: bool,
}

pub struct Registry {
    rooms: DashMap<String, Room>,
    tokens: Arc<TokenStore>,
}

impl Registry {
    pub fn new(tokens: Arc<TokenStore>) -> Self {
        Self {
            rooms: DashMap::new(),
            tokens,
        }
    }

    /// Claim a role slot in a room, creating the room if needed. `room_id`
    /// must already be sanitized and non-empty; token checks happen upstream.
    pub fn try_join(
        &self,
        room_id: &str,
        role: Role,
        handle: PeerHandle,
    ) -> Result<JoinOutcome, JoinError> {
        let mut room = self.rooms.entry(room_id.to_string()).or_default();
        if room.slots.contains_key(&role) {
            return Err(JoinError::RoleTaken);
        }
        tracing::debug!(room_id = %room_id, role = %role, conn_id = %handle.id, "slot claimed");
        room.slots.insert(role, handle);
        Ok(JoinOutcome {
            room: room_id.to_string(),
            role,
            room_now_full: room.slots.len() == 2,
        })
    }

    /// Release a (room, role) binding. Idempotent. When the room empties it
    /// is deleted and its tokens revoked. Returns the remaining occupants so
    /// the caller can notify them.
    pub fn leave(&self, room_id: &str, role: Role) -> Vec<(Role, OutboundSender)> {
        let remaining = match self.rooms.get_mut(room_id) {
            Some(mut room) => {
                if room.slots.remove(&role).is_none() {
                    // already absent: a no-op, nobody to notify
                    return Vec::new();
                }
                room.slots
                    .iter()
                    .map(|(r, h)| (*r, h.sender.clone()))
                    .collect::<Vec<_>>()
            }
            None => return Vec::new(),
        };
        if remaining.is_empty() {
            // Re-check under the entry lock: a join may have raced in between
            // dropping the guard above and this removal.
            let deleted = self
                .rooms
                .remove_if(room_id, |_, room| room.slots.is_empty())
                .is_some();
            if deleted {
                self.tokens.revoke(room_id);
                tracing::info!(room_id = %room_id, "room deleted");
            }
        }
        remaining
    }

    /// All occupants of a room other than `role`. Empty for unknown rooms.
    pub fn peers_excluding(&self, room_id: &str, role: Role) -> Vec<(Role, OutboundSender)> {
        match self.rooms.get(room_id) {
            Some(room) => room
                .slots
                .iter()
                .filter(|(r, _)| **r != role)
                .map(|(r, h)| (*r, h.sender.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every occupant of a room, for whole-room notifications like READY.
    pub fn occupants(&self, room_id: &str) -> Vec<(Role, OutboundSender)> {
        match self.rooms.get(room_id) {
            Some(room) => room
                .slots
                .iter()
                .map(|(r, h)| (*r, h.sender.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether a room currently has any occupant. Used to steer generated
    /// identifiers away from live rooms.
    pub fn is_active(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }
}
