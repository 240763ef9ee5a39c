use std::sync::Arc;

use crate::auth::AuthConfig;
use crate::config::AppConfig;
use crate::shared::utils::DbPool;

pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(conn: DbPool, config: AppConfig) -> Arc<Self> {
        let auth = AuthConfig::new(&config.auth.jwt_secret, config.auth.token_expiry_hours);
        Arc::new(Self { conn, config, auth })
    }
}
