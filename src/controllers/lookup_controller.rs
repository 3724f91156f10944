use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::controllers::ActionRecorder;
use crate::dto::lookup_dto::{HierarchyQuery, LookupListQuery, LookupRequest, LookupTableInfo};
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::audit::ActionType;
use crate::models::lookup::{LookupItem, LookupTable};
use crate::models::permission::{ModuleName, PermissionType};
use crate::repositories::LookupRepository;
use crate::services::query::Page;
use crate::utils::errors::{field_error, not_found_error, AppError, AppResult};
use crate::utils::translations::{self, Localized, Operation};

/// Resuelve el segmento de URL a una tabla conocida
pub fn resolve_table(key: &str) -> AppResult<LookupTable> {
    LookupTable::from_key(key).ok_or_else(|| AppError::NotFound(translations::unknown_lookup_table(key)))
}

pub struct LookupController {
    repository: LookupRepository,
    recorder: ActionRecorder,
}

impl LookupController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: LookupRepository::new(pool.clone()),
            recorder: ActionRecorder::new(pool),
        }
    }

    /// Catálogo de tablas con sus etiquetas
    pub fn catalogue(&self, user: &AuthenticatedUser) -> Result<ApiResponse<Vec<LookupTableInfo>>, AppError> {
        user.access.require(ModuleName::GenericTables, PermissionType::Read)?;
        Ok(ApiResponse::success(
            LookupTable::ALL.into_iter().map(LookupTableInfo::from).collect(),
        ))
    }

    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        table_key: &str,
        query: LookupListQuery,
    ) -> Result<ApiResponse<Page<LookupItem>>, AppError> {
        user.access.require(ModuleName::GenericTables, PermissionType::Read)?;
        let table = resolve_table(table_key)?;
        let page = self.repository.list(table, &query.list, query.parent_id()).await?;
        Ok(ApiResponse::success(page))
    }

    pub async fn get(
        &self,
        user: &AuthenticatedUser,
        table_key: &str,
        id: Uuid,
    ) -> Result<ApiResponse<LookupItem>, AppError> {
        user.access.require(ModuleName::GenericTables, PermissionType::Read)?;
        let table = resolve_table(table_key)?;
        let item = self
            .repository
            .find_by_id(table, id)
            .await?
            .ok_or_else(|| not_found_error(table.model_name()))?;
        Ok(ApiResponse::success(item))
    }

    async fn check_request(&self, table: LookupTable, request: &LookupRequest) -> AppResult<()> {
        request.check(table)?;
        if let (Some(parent_table), Some(parent_id)) = (table.parent(), request.parent_id) {
            if self.repository.find_ref(parent_table, parent_id).await?.is_none() {
                let parent = parent_table.model_name();
                return Err(field_error(
                    "parent_id",
                    Localized::new(
                        format!("Select a valid {}.", parent.en.to_lowercase()),
                        format!("اختر {} صالحاً.", parent.ar),
                    ),
                ));
            }
        }
        Ok(())
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        table_key: &str,
        request: LookupRequest,
    ) -> Result<ApiResponse<LookupItem>, AppError> {
        user.access.require(ModuleName::GenericTables, PermissionType::Create)?;
        let table = resolve_table(table_key)?;
        self.check_request(table, &request).await?;

        let item = self.repository.create(table, &request).await?;
        info!("📋 {} creado: {} ({})", table.table(), item.name_en, item.id);

        let message = translations::success(Operation::Create, table.model_name());
        self.recorder
            .record(user, client, ActionType::Create, ModuleName::GenericTables.as_str(), Some(item.id), &message)
            .await;

        Ok(ApiResponse::success_with_message(item, message))
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        table_key: &str,
        id: Uuid,
        request: LookupRequest,
    ) -> Result<ApiResponse<LookupItem>, AppError> {
        user.access.require(ModuleName::GenericTables, PermissionType::Update)?;
        let table = resolve_table(table_key)?;
        self.check_request(table, &request).await?;
        if request.parent_id == Some(id) {
            return Err(field_error(
                "parent_id",
                Localized::new("A row cannot be its own parent.", "لا يمكن أن يكون العنصر أباً لنفسه."),
            ));
        }

        let item = self
            .repository
            .update(table, id, &request)
            .await?
            .ok_or_else(|| not_found_error(table.model_name()))?;

        let message = translations::success(Operation::Update, table.model_name());
        self.recorder
            .record(user, client, ActionType::Update, ModuleName::GenericTables.as_str(), Some(id), &message)
            .await;

        Ok(ApiResponse::success_with_message(item, message))
    }

    /// Borrado físico; las filas en uso quedan protegidas por las claves foráneas
    pub async fn delete(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        table_key: &str,
        id: Uuid,
    ) -> Result<ApiResponse<()>, AppError> {
        user.access.require(ModuleName::GenericTables, PermissionType::Delete)?;
        let table = resolve_table(table_key)?;

        if !self.repository.delete(table, id).await? {
            return Err(not_found_error(table.model_name()));
        }
        info!("🗑️ {} eliminado: {}", table.table(), id);

        let message = translations::success(Operation::Delete, table.model_name());
        self.recorder
            .record(user, client, ActionType::Delete, ModuleName::GenericTables.as_str(), Some(id), &message)
            .await;

        Ok(ApiResponse::message(message))
    }

    // Desplegables en cascada: solo requieren sesión

    pub async fn sectors(&self) -> Result<ApiResponse<Vec<LookupItem>>, AppError> {
        let items = self.repository.hierarchy_options(LookupTable::Sectors, None).await?;
        Ok(ApiResponse::success(items))
    }

    pub async fn departments(&self, query: HierarchyQuery) -> Result<ApiResponse<Vec<LookupItem>>, AppError> {
        let items = self
            .repository
            .hierarchy_options(LookupTable::Departments, query.sector_id())
            .await?;
        Ok(ApiResponse::success(items))
    }

    pub async fn divisions(&self, query: HierarchyQuery) -> Result<ApiResponse<Vec<LookupItem>>, AppError> {
        let items = self
            .repository
            .hierarchy_options(LookupTable::Divisions, query.department_id())
            .await?;
        Ok(ApiResponse::success(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_table_by_url_segment() {
        assert_eq!(resolve_table("sectors").unwrap(), LookupTable::Sectors);
        assert!(matches!(resolve_table("vehicles"), Err(AppError::NotFound(_))));
    }
}
