pub mod attributes;
pub mod auth;
pub mod cart;
pub mod config;
pub mod error;
pub mod types;
pub mod users;

use auth::IdentityVerifier;
use config::Config;
use std::sync::Arc;
use users::UserRepository;

/// Shared application state, built once per cold start
pub struct AppState {
    pub config: Config,
    pub identity: Box<dyn IdentityVerifier>,
    pub users: Box<dyn UserRepository>,
}

impl AppState {
    pub fn new(
        config: Config,
        identity: Box<dyn IdentityVerifier>,
        users: Box<dyn UserRepository>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            identity,
            users,
        })
    }
}
