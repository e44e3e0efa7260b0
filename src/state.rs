//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::registry::Registry;
use crate::token::TokenStore;

/// Global application state, shared by every connection task.
pub struct AppState {
    pub registry: Registry,
    pub tokens: Arc<TokenStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let tokens = Arc::new(TokenStore::new(Duration::from_secs(config.token_ttl_secs)));
        Self {
            registry: Registry::new(tokens.clone()),
            tokens,
            config: Arc::new(config),
        }
    }
}
