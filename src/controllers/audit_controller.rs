use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::audit::{ActionLogEntry, ActionType, LoginLogEntry};
use crate::repositories::AuditRepository;
use crate::services::audit::{statistics_days, AuditStatistics, LogQuery, StatisticsQuery};
use crate::services::export::{self, ACTION_LOGS_FILENAME, LOGIN_LOGS_FILENAME};
use crate::services::query::Page;
use crate::utils::errors::AppError;

/// Archivo CSV listo para descargar
#[derive(Debug)]
pub struct CsvExport {
    pub filename: &'static str,
    pub bytes: Vec<u8>,
}

/// Listado de acciones con los valores disponibles para los filtros
#[derive(Debug, Serialize)]
pub struct ActionLogPage {
    #[serde(flatten)]
    pub page: Page<ActionLogEntry>,
    pub modules: Vec<String>,
    pub action_types: Vec<ActionType>,
}

pub struct AuditController {
    repository: AuditRepository,
}

impl AuditController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AuditRepository::new(pool),
        }
    }

    pub async fn statistics(
        &self,
        user: &AuthenticatedUser,
        query: StatisticsQuery,
    ) -> Result<ApiResponse<AuditStatistics>, AppError> {
        user.access.require_admin()?;
        let days = statistics_days(query.days.as_deref());
        let statistics = self.repository.statistics(days).await?;
        Ok(ApiResponse::success(statistics))
    }

    pub async fn login_logs(
        &self,
        user: &AuthenticatedUser,
        query: LogQuery,
    ) -> Result<ApiResponse<Page<LoginLogEntry>>, AppError> {
        user.access.require_admin()?;
        let page = self.repository.list_login_logs(&query).await?;
        Ok(ApiResponse::success(page))
    }

    pub async fn action_logs(
        &self,
        user: &AuthenticatedUser,
        query: LogQuery,
    ) -> Result<ApiResponse<ActionLogPage>, AppError> {
        user.access.require_admin()?;
        let page = self.repository.list_action_logs(&query).await?;
        let modules = self.repository.distinct_modules().await?;
        Ok(ApiResponse::success(ActionLogPage {
            page,
            modules,
            action_types: ActionType::ALL.to_vec(),
        }))
    }

    /// Exporta con los mismos filtros del listado, sin paginar
    pub async fn export_login_logs(&self, user: &AuthenticatedUser, query: LogQuery) -> Result<CsvExport, AppError> {
        user.access.require_admin()?;
        let entries = self.repository.export_login_logs(&query).await?;
        info!("📤 Exportando {} registros de inicio de sesión ({})", entries.len(), user.user.username);
        Ok(CsvExport {
            filename: LOGIN_LOGS_FILENAME,
            bytes: export::login_logs_csv(&entries)?,
        })
    }

    pub async fn export_action_logs(&self, user: &AuthenticatedUser, query: LogQuery) -> Result<CsvExport, AppError> {
        user.access.require_admin()?;
        let entries = self.repository.export_action_logs(&query).await?;
        info!("📤 Exportando {} registros de acciones ({})", entries.len(), user.user.username);
        Ok(CsvExport {
            filename: ACTION_LOGS_FILENAME,
            bytes: export::action_logs_csv(&entries)?,
        })
    }
}
