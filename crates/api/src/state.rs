//! Shared application state

use std::sync::Arc;

use gods_shared::{GroupRepository, MembershipRepository, SqliteStore, UserRepository};
use sqlx::SqlitePool;

use crate::{
    auth::{AuthService, AuthState, JwtManager, PasswordError, PasswordHasher},
    config::Config,
};

/// State handed to every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub auth: AuthService,
}

impl AppState {
    /// Wire the SQLite store, hasher and token manager from configuration
    pub fn new(config: Config, pool: SqlitePool) -> Result<Self, PasswordError> {
        let store = Arc::new(SqliteStore::new(pool.clone()));
        let hasher = PasswordHasher::new(config.hash_cost)?;
        let jwt = JwtManager::new(&config.jwt_key, config.jwt_expiry_hours);

        let users: Arc<dyn UserRepository> = store.clone();
        let auth = AuthService::new(users.clone(), hasher, jwt);

        Ok(Self {
            config: Arc::new(config),
            pool,
            users,
            groups: store.clone(),
            memberships: store,
            auth,
        })
    }

    /// State for the auth middlewares
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            jwt: self.auth.jwt().clone(),
            users: self.users.clone(),
        }
    }
}
