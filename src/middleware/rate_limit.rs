//! Middleware de Rate Limiting
//!
//! Limita los intentos de inicio de sesión por IP de cliente dentro de una
//! ventana de tiempo fija.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::EnvironmentConfig;
use crate::middleware::client_info::ClientInfo;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Información de rate limiting por IP
#[derive(Debug, Clone)]
struct RateLimitInfo {
    requests: u32,
    window_start: Instant,
}

/// Estado global del rate limiting
#[derive(Clone)]
pub struct RateLimitState {
    requests: Arc<RwLock<HashMap<String, RateLimitInfo>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimitState {
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self::with_limits(config.rate_limit_requests, Duration::from_secs(config.rate_limit_window))
    }

    pub fn with_limits(max_requests: u32, window_duration: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests: max_requests.max(1),
            window_duration,
        }
    }

    /// Verificar si una IP ha excedido el límite
    pub async fn check_rate_limit(&self, ip: &str) -> Result<(), RateLimitError> {
        let mut requests = self.requests.write().await;
        let now = Instant::now();

        // Limpiar entradas expiradas
        requests.retain(|_, info| now.duration_since(info.window_start) < self.window_duration);

        let info = requests.entry(ip.to_string()).or_insert(RateLimitInfo {
            requests: 0,
            window_start: now,
        });

        if info.requests >= self.max_requests {
            return Err(RateLimitError::LimitExceeded);
        }

        info.requests += 1;
        Ok(())
    }

    /// Olvida los intentos de una IP (tras un login correcto)
    pub async fn reset(&self, ip: &str) {
        self.requests.write().await.remove(ip);
    }
}

/// Errores de rate limiting
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded")]
    LimitExceeded,
}

impl From<RateLimitError> for AppError {
    fn from(_: RateLimitError) -> Self {
        AppError::RateLimitExceeded
    }
}

/// Middleware para el endpoint de login, por IP del socket (o del proxy de confianza)
pub async fn login_rate_limit_middleware(
    State(state): State<AppState>,
    client: ClientInfo,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client.ip.as_deref().unwrap_or("unknown");

    if let Err(e) = state.login_limiter.check_rate_limit(key).await {
        warn!("🚫 Demasiados intentos de login desde {}", key);
        return Err(e.into());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_per_ip() {
        let state = RateLimitState::with_limits(2, Duration::from_secs(60));
        assert!(state.check_rate_limit("10.0.0.1").await.is_ok());
        assert!(state.check_rate_limit("10.0.0.1").await.is_ok());
        assert!(state.check_rate_limit("10.0.0.1").await.is_err());
        // otra IP tiene su propio contador
        assert!(state.check_rate_limit("10.0.0.2").await.is_ok());

        state.reset("10.0.0.1").await;
        assert!(state.check_rate_limit("10.0.0.1").await.is_ok());
    }

    #[tokio::test]
    async fn test_window_expires() {
        let state = RateLimitState::with_limits(1, Duration::from_millis(20));
        assert!(state.check_rate_limit("ip").await.is_ok());
        assert!(state.check_rate_limit("ip").await.is_err());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(state.check_rate_limit("ip").await.is_ok());
    }
}
