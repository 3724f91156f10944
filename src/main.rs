use std::net::SocketAddr;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn, Level};

use fleet_inventory::build_router;
use fleet_inventory::config::{DatabaseConfig, EnvironmentConfig};
use fleet_inventory::database::{create_pool, run_migrations};
use fleet_inventory::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(log_level(&config))
        .init();

    info!("🚗 Fleet Inventory - API de flota y equipos");
    info!("================================================");

    let pool = match create_pool(&DatabaseConfig::from(&config)).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        error!("❌ Error aplicando migraciones: {}", e);
        return Err(e);
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.media_root).await {
        warn!("⚠️ No se pudo crear el directorio de medios {:?}: {}", config.media_root, e);
    }

    let addr: SocketAddr = config.server_url().parse()?;
    let app = build_router(AppState::new(pool, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("🔐 Autenticación:");
    info!("   POST /api/auth/login - Iniciar sesión");
    info!("   POST /api/auth/logout - Cerrar sesión");
    info!("   GET  /api/auth/me - Usuario actual");
    info!("📊 Panel:");
    info!("   GET  /api/dashboard - Vencimientos de vehículos y equipos");
    info!("🚗 Vehículos:");
    info!("   GET|POST /api/cars");
    info!("   GET|PUT|DELETE /api/cars/:id");
    info!("   GET  /api/cars/:id/delete-preview");
    info!("   POST /api/cars/:id/restore - DELETE /api/cars/:id/purge");
    info!("   GET|POST /api/cars/:id/maintenance - POST /api/cars/:id/images");
    info!("🛠️ Equipos:");
    info!("   GET|POST /api/equipment");
    info!("   GET|PUT|DELETE /api/equipment/:id - GET /api/equipment/:id/detail-json");
    info!("   POST /api/equipment/:id/images|calibration-certificates|fire-extinguisher-images");
    info!("🔧 Mantenimiento y archivos:");
    info!("   PUT|DELETE /api/maintenance/:id");
    info!("   DELETE /api/attachments/:id - GET /api/media/*path");
    info!("📚 Tablas de referencia:");
    info!("   GET /api/lookups - GET|POST /api/lookups/:table");
    info!("   GET|PUT|DELETE /api/lookups/:table/:id");
    info!("   GET /api/hierarchy/sectors|departments|divisions");
    info!("👑 Administración:");
    info!("   /api/admin/users, /api/admin/module-permissions");
    info!("   /api/admin/statistics, /api/admin/login-logs, /api/admin/action-logs");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Nivel de log: LOG_LEVEL, o DEBUG en desarrollo
fn log_level(config: &EnvironmentConfig) -> Level {
    match config.log_level.as_deref().map(|level| level.parse::<Level>()) {
        Some(Ok(level)) => level,
        _ if config.is_development() => Level::DEBUG,
        _ => Level::INFO,
    }
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de señales: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
