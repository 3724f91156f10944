//! Estado compartido de la aplicación
//!
//! Este módulo define el estado que se pasa a través del router de Axum.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::middleware::rate_limit::RateLimitState;
use crate::services::media::{LocalMediaStorage, MediaStorage};
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub jwt: JwtConfig,
    pub login_limiter: RateLimitState,
    pub storage: Arc<dyn MediaStorage>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let storage = Arc::new(LocalMediaStorage::new(config.media_root.clone()));
        Self::with_storage(pool, config, storage)
    }

    pub fn with_storage(pool: PgPool, config: EnvironmentConfig, storage: Arc<dyn MediaStorage>) -> Self {
        Self {
            jwt: JwtConfig::from(&config),
            login_limiter: RateLimitState::new(&config),
            pool,
            config,
            storage,
        }
    }
}
