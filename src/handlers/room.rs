//! Room creation endpoint: issues a room identifier and its access token.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::protocol::room_id;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub preferred_room_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub access_token: String,
    pub expires_in: u64,
}

/// `POST /api/rooms`. A preferred identifier is sanitized and used as-is
/// (issuing a token for an already-active room is how the second device gets
/// credentials); otherwise a fresh identifier is generated. The body is
/// optional.
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    request: Option<Json<CreateRoomRequest>>,
) -> Json<CreateRoomResponse> {
    let preferred = request
        .and_then(|Json(body)| body.preferred_room_id)
        .map(|raw| room_id::sanitize(&raw))
        .filter(|id| !id.is_empty());

    let room_id = preferred.unwrap_or_else(|| unique_room_id(&state));
    let access_token = state.tokens.create(&room_id);

    tracing::info!(room_id = %room_id, "room token issued");

    Json(CreateRoomResponse {
        room_id,
        access_token,
        expires_in: state.config.token_ttl_secs,
    })
}

/// Generate an identifier that does not collide with an active room. With a
/// 36^8 space collisions are near-impossible; the retry cap only bounds the
/// pathological case.
fn unique_room_id(state: &AppState) -> String {
    let mut id = room_id::generate();
    for _ in 0..8 {
        if !state.registry.is_active(&id) {
            break;
        }
        id = room_id::generate();
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::protocol::Role;
    use crate::registry::PeerHandle;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[tokio::test]
    async fn preferred_identifier_is_sanitized() {
        let state = Arc::new(AppState::new(Config::default()));
        let Json(response) = create_room(
            State(state.clone()),
            Some(Json(CreateRoomRequest {
                preferred_room_id: Some("my room 42!!".to_string()),
            })),
        )
        .await;
        assert_eq!(response.room_id, "MYROOM42");
        assert_eq!(response.expires_in, 3600);
        assert!(state.tokens.validate("MYROOM42", &response.access_token));
    }

    #[tokio::test]
    async fn unusable_preference_falls_back_to_generation() {
        let state = Arc::new(AppState::new(Config::default()));
        let Json(response) = create_room(
            State(state),
            Some(Json(CreateRoomRequest {
                preferred_room_id: Some("!!!".to_string()),
            })),
        )
        .await;
        assert_eq!(response.room_id.len(), room_id::MAX_LEN);
    }

    #[tokio::test]
    async fn missing_body_generates_an_identifier() {
        let state = Arc::new(AppState::new(Config::default()));
        let Json(response) = create_room(State(state.clone()), None).await;
        assert_eq!(response.room_id.len(), room_id::MAX_LEN);
        assert!(state
            .tokens
            .validate(&response.room_id, &response.access_token));
    }

    #[test]
    fn generated_identifier_avoids_active_rooms() {
        let state = AppState::new(Config::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        state
            .registry
            .try_join(
                "ABCD",
                Role::PcPlayer,
                PeerHandle {
                    id: Uuid::new_v4(),
                    sender: tx,
                },
            )
            .unwrap();
        for _ in 0..16 {
            assert_ne!(unique_room_id(&state), "ABCD");
        }
    }
}
