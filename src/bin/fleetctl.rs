//! Herramienta de administración: migraciones, super admin, permisos y limpieza de logs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::PgPool;
use tracing::{info, warn, Level};

use fleet_inventory::config::{DatabaseConfig, EnvironmentConfig};
use fleet_inventory::database::{create_pool, run_migrations};
use fleet_inventory::models::user::UserType;
use fleet_inventory::repositories::audit_repository::AuditRepository;
use fleet_inventory::repositories::permission_repository::PermissionRepository;
use fleet_inventory::repositories::user_repository::{NewUser, UserRepository};
use fleet_inventory::services::auth::{
    check_password_strength, generate_password, hash_password, GENERATED_PASSWORD_LENGTH,
};
use fleet_inventory::services::rbac::AccessContext;

#[derive(Parser)]
#[command(name = "fleetctl", version, about = "Administración del inventario de flota")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Aplicar las migraciones pendientes
    Migrate,

    /// Crear (o promover con --force) la cuenta de super administrador
    SetupSuperAdmin {
        #[arg(long, env = "SUPER_ADMIN_USERNAME", default_value = "admin")]
        username: String,
        #[arg(long, env = "SUPER_ADMIN_EMAIL", default_value = "admin@example.com")]
        email: String,
        /// Se genera una aleatoria si se omite
        #[arg(long, env = "SUPER_ADMIN_PASSWORD")]
        password: Option<String>,
        #[arg(long, default_value = "Super")]
        first_name: String,
        #[arg(long, default_value = "Admin")]
        last_name: String,
        /// Reemplaza la contraseña de un usuario existente
        #[arg(long)]
        force: bool,
    },

    /// Crear las filas de permisos por módulo que falten
    SetupPermissions,

    /// Borrar registros de sesiones y acciones antiguos
    CleanupLogs {
        #[arg(long, default_value_t = 90)]
        days: i64,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        keep_login_logs: bool,
        #[arg(long)]
        keep_action_logs: bool,
    },

    /// Mostrar tipo y permisos efectivos de un usuario
    CheckUserPermissions {
        #[arg(long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    let config = EnvironmentConfig::from_env()?;
    let pool = create_pool(&DatabaseConfig::from(&config)).await?;

    match cli.command {
        Command::Migrate => run_migrations(&pool).await?,
        Command::SetupSuperAdmin {
            username,
            email,
            password,
            first_name,
            last_name,
            force,
        } => {
            setup_super_admin(&pool, username, email, password, first_name, last_name, force).await?;
        }
        Command::SetupPermissions => {
            let created = PermissionRepository::new(pool.clone()).create_default_permissions().await?;
            info!("✅ Permisos por módulo creados: {}", created);
        }
        Command::CleanupLogs {
            days,
            dry_run,
            keep_login_logs,
            keep_action_logs,
        } => {
            if days < 1 {
                bail!("--days must be at least 1");
            }
            let report = AuditRepository::new(pool.clone())
                .cleanup(days, dry_run, keep_login_logs, keep_action_logs)
                .await?;
            let verb = if report.dry_run { "Se borrarían" } else { "Borrados" };
            println!("{} {} registros de sesión y {} de acciones", verb, report.login_logs, report.action_logs);
        }
        Command::CheckUserPermissions { username } => check_user_permissions(&pool, &username).await?,
    }

    Ok(())
}

async fn setup_super_admin(
    pool: &PgPool,
    username: String,
    email: String,
    password: Option<String>,
    first_name: String,
    last_name: String,
    force: bool,
) -> Result<()> {
    let users = UserRepository::new(pool.clone());
    let existing = users.find_by_username(&username).await?;

    if existing.is_some() && !force {
        warn!("⚠️ El usuario '{}' ya existe; usa --force para reemplazar su contraseña", username);
        return Ok(());
    }

    let generated = password.is_none();
    let password = password.unwrap_or_else(|| generate_password(GENERATED_PASSWORD_LENGTH));
    if let Err(message) = check_password_strength(&password) {
        bail!("{}", message.en);
    }
    let password_hash = hash_password(&password).context("hashing password")?;

    let user = match existing {
        Some(row) => {
            info!("🔄 Promoviendo '{}' a super administrador", username);
            users.promote_super_admin(row.user.id, &password_hash).await?
        }
        None => {
            info!("👑 Creando super administrador '{}'", username);
            users
                .create(NewUser {
                    username,
                    email,
                    first_name,
                    last_name,
                    password_hash,
                    is_superuser: true,
                    is_active: true,
                    user_type: UserType::SuperAdmin,
                    created_by: None,
                })
                .await?
        }
    };

    println!("Super admin listo: {} ({})", user.user.username, user.user.id);
    if generated {
        println!("Contraseña generada: {}", password);
    }
    Ok(())
}

async fn check_user_permissions(pool: &PgPool, username: &str) -> Result<()> {
    let Some(row) = UserRepository::new(pool.clone()).find_by_username(username).await? else {
        bail!("user '{}' not found", username);
    };
    let grants = PermissionRepository::new(pool.clone())
        .grants_for_user(row.user.id)
        .await?;
    let profile = row.profile();
    let access = AccessContext::new(&row.user, profile.as_ref(), grants);

    println!("Usuario: {} ({})", access.username, access.user_id);
    println!("Tipo: {} / activo: {}", access.user_type.as_str(), access.is_active);
    for (module, permissions) in access.summary() {
        let names: Vec<&str> = permissions.iter().map(|p| p.as_str()).collect();
        println!("  {}: {}", module.as_str(), names.join(", "));
    }
    Ok(())
}
