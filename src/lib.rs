//! Backend de inventario de flota y equipos
//!
//! Vehículos, equipos, mantenimiento, tablas de referencia, permisos por
//! módulo y auditoría de sesiones y acciones.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::{auth_middleware, cors_middleware};
use crate::routes::{
    admin_routes::create_admin_router,
    auth_routes::{create_auth_router, create_login_router},
    car_routes::create_car_router,
    dashboard_routes::create_dashboard_router,
    equipment_routes::create_equipment_router,
    lookup_routes::{create_hierarchy_router, create_lookup_router},
    maintenance_routes::create_maintenance_router,
    media_routes::{create_attachment_router, create_media_router},
};
use crate::state::AppState;

/// Router completo de la aplicación
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/auth", create_auth_router())
        .nest("/api/dashboard", create_dashboard_router())
        .nest("/api/cars", create_car_router())
        .nest("/api/equipment", create_equipment_router())
        .nest("/api/maintenance", create_maintenance_router())
        .nest("/api/attachments", create_attachment_router())
        .nest("/api/media", create_media_router())
        .nest("/api/lookups", create_lookup_router())
        .nest("/api/hierarchy", create_hierarchy_router())
        .nest("/api/admin", create_admin_router())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let public = Router::new()
        .route("/health", get(health))
        .nest("/api/auth", create_login_router(&state));

    // Multipart lleva varios archivos por petición
    let body_limit = state.config.max_upload_bytes.saturating_mul(10);

    public
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_middleware(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
