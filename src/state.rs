use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Config;
use crate::store::{MemoryStore, TaskStore, UserStore};

/// Shared application state, built once in `main` (or a test) and handed to actix as
/// `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub tokens: TokenService,
    pub admin_invite_token: Option<String>,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(config: &Config, users: Arc<dyn UserStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self {
            users,
            tasks,
            tokens: TokenService::from_config(config),
            admin_invite_token: config.admin_invite_token.clone(),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Both stores backed by a single `MemoryStore`.
    pub fn in_memory(config: &Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store)
    }
}
