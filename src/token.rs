//! Per-room access token store.
//!
//! Tokens are opaque random strings issued at room creation and checked on
//! join. They live in memory only; a token is valid for its issuing room and
//! only within the configured TTL.

use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Length of an issued token, matching `secrets.token_urlsafe(32)`.
const TOKEN_LEN: usize = 43;

pub struct TokenStore {
    /// room_id -> (token -> issuance instant)
    tokens: DashMap<String, HashMap<String, Instant>>,
    ttl: Duration,
}

impl TokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
        }
    }

    /// Issue a fresh token for a room. A room may hold several live tokens;
    /// each connecting device obtains its own through the REST endpoint.
    pub fn create(&self, room_id: &str) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.tokens
            .entry(room_id.to_string())
            .or_default()
            .insert(token.clone(), Instant::now());
        token
    }

    /// True iff the token was issued for this room and has not expired.
    pub fn validate(&self, room_id: &str, token: &str) -> bool {
        self.tokens
            .get(room_id)
            .and_then(|by_token| by_token.get(token).copied())
            .map(|issued| issued.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Drop every token for a room. Called when the room empties so a stale
    /// token cannot be replayed to rejoin.
    pub fn revoke(&self, room_id: &str) {
        self.tokens.remove(room_id);
    }

    /// Remove expired tokens and empty room entries. Returns how many tokens
    /// were dropped.
    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut purged = 0;
        self.tokens.retain(|_, by_token| {
            let before = by_token.len();
            by_token.retain(|_, issued| issued.elapsed() < ttl);
            purged += before - by_token.len();
            !by_token.is_empty()
        });
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TokenStore {
        TokenStore::new(Duration::from_secs(3600))
    }

    #[test]
    fn issued_token_validates_for_its_room_only() {
        let store = store();
        let token = store.create("ABCD");
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(store.validate("ABCD", &token));
        assert!(!store.validate("EFGH", &token));
        assert!(!store.validate("ABCD", "forged"));
        assert!(!store.validate("", ""));
    }

    #[test]
    fn rooms_may_hold_several_live_tokens() {
        let store = store();
        let first = store.create("ABCD");
        let second = store.create("ABCD");
        assert_ne!(first, second);
        assert!(store.validate("ABCD", &first));
        assert!(store.validate("ABCD", &second));
    }

    #[test]
    fn revoke_invalidates_all_tokens_for_the_room() {
        let store = store();
        let first = store.create("ABCD");
        let second = store.create("ABCD");
        let other = store.create("EFGH");
        store.revoke("ABCD");
        assert!(!store.validate("ABCD", &first));
        assert!(!store.validate("ABCD", &second));
        assert!(store.validate("EFGH", &other));
        // revoking an unknown room is a no-op
        store.revoke("NOPE");
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let store = TokenStore::new(Duration::ZERO);
        let token = store.create("ABCD");
        assert!(!store.validate("ABCD", &token));
    }

    #[test]
    fn purge_drops_expired_tokens_and_empty_rooms() {
        let expired = TokenStore::new(Duration::ZERO);
        expired.create("ABCD");
        expired.create("ABCD");
        assert_eq!(expired.purge_expired(), 2);
        assert_eq!(expired.purge_expired(), 0);

        let live = store();
        let token = live.create("ABCD");
        assert_eq!(live.purge_expired(), 0);
        assert!(live.validate("ABCD", &token));
    }
}
