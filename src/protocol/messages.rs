//! Signaling message vocabulary.
//!
//! All frames share the envelope `{"type": <string>, "payload"?: <object>}`.
//! Relay frames (OFFER, ANSWER, ICE_CANDIDATE, FRET_UPDATE, STRUM_EVENT) are
//! never deserialized into typed payloads; they are forwarded verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The two role slots a room can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    PcPlayer,
    MobileController,
}

impl Role {
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "PC_PLAYER" => Some(Role::PcPlayer),
            "MOBILE_CONTROLLER" => Some(Role::MobileController),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PcPlayer => "PC_PLAYER",
            Role::MobileController => "MOBILE_CONTROLLER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server → client messages.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Joined { room_id: String, role: Role },
    Ready { room_id: String },
    Error { message: String },
    PeerDisconnected { role: Role },
}

/// Fields of a JOIN handshake frame. All fields default so that a missing
/// field surfaces as an empty string and fails validation, not parsing.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JoinRequest {
    pub room_id: String,
    pub role: String,
    pub token: String,
}

impl JoinRequest {
    /// Extract a JOIN request from an already-parsed frame. The browser client
    /// puts `roomId`/`role` at the top level; the documented envelope nests
    /// them under `payload`. Both are accepted.
    pub fn from_frame(frame: &Value) -> Self {
        let source = if frame.get("roomId").is_some() {
            frame
        } else {
            frame.get("payload").unwrap_or(frame)
        };
        serde_json::from_value(source.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_wire_names() {
        assert_eq!(Role::from_wire("PC_PLAYER"), Some(Role::PcPlayer));
        assert_eq!(
            Role::from_wire("MOBILE_CONTROLLER"),
            Some(Role::MobileController)
        );
        assert_eq!(Role::from_wire("pc_player"), None);
        assert_eq!(Role::from_wire(""), None);
        assert_eq!(serde_json::to_value(Role::PcPlayer).unwrap(), "PC_PLAYER");
    }

    #[test]
    fn server_messages_use_type_payload_envelope() {
        let joined = ServerMessage::Joined {
            room_id: "ABCD".to_string(),
            role: Role::PcPlayer,
        };
        assert_eq!(
            serde_json::to_value(&joined).unwrap(),
            json!({"type": "JOINED", "payload": {"roomId": "ABCD", "role": "PC_PLAYER"}})
        );

        let gone = ServerMessage::PeerDisconnected {
            role: Role::MobileController,
        };
        assert_eq!(
            serde_json::to_value(&gone).unwrap(),
            json!({"type": "PEER_DISCONNECTED", "payload": {"role": "MOBILE_CONTROLLER"}})
        );

        let ready = ServerMessage::Ready {
            room_id: "ABCD".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&ready).unwrap(),
            json!({"type": "READY", "payload": {"roomId": "ABCD"}})
        );
    }

    #[test]
    fn join_request_from_top_level_fields() {
        let frame = json!({"type": "JOIN", "roomId": "abcd", "role": "PC_PLAYER"});
        let request = JoinRequest::from_frame(&frame);
        assert_eq!(request.room_id, "abcd");
        assert_eq!(request.role, "PC_PLAYER");
        assert_eq!(request.token, "");
    }

    #[test]
    fn join_request_from_payload_envelope() {
        let frame = json!({
            "type": "JOIN",
            "payload": {"roomId": "ABCD", "role": "MOBILE_CONTROLLER", "token": "t0k"}
        });
        let request = JoinRequest::from_frame(&frame);
        assert_eq!(request.room_id, "ABCD");
        assert_eq!(request.role, "MOBILE_CONTROLLER");
        assert_eq!(request.token, "t0k");
    }

    #[test]
    fn join_request_tolerates_missing_fields() {
        let request = JoinRequest::from_frame(&json!({"type": "JOIN"}));
        assert_eq!(request.room_id, "");
        assert_eq!(request.role, "");
    }
}
