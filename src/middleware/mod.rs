//! Middleware del sistema
//!
//! Este módulo contiene el middleware para autenticación, CORS, rate limiting
//! y los datos de cliente que usa la auditoría.

pub mod auth;
pub mod client_info;
pub mod cors;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthenticatedUser};
pub use client_info::ClientInfo;
pub use cors::cors_middleware;
pub use rate_limit::{login_rate_limit_middleware, RateLimitState};
