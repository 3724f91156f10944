use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::controllers::ActionRecorder;
use crate::dto::asset_dto::MaintenanceInput;
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::asset::AssetRef;
use crate::models::audit::ActionType;
use crate::models::maintenance::{MaintenanceFields, MaintenanceRecord, MaintenanceTarget};
use crate::models::permission::PermissionType;
use crate::repositories::{CarRepository, EquipmentRepository, MaintenanceRepository};
use crate::services::records::check_maintenance;
use crate::utils::errors::{field_error, not_found_error, AppError, AppResult, FieldErrors};
use crate::utils::translations::{self, Operation};

/// Valida un formulario de mantenimiento suelto; vacío no es válido
fn check_input(input: &MaintenanceInput) -> AppResult<MaintenanceFields> {
    let mut errors = FieldErrors::new();
    let fields = check_maintenance("maintenance", input, &mut errors);
    errors.into_result()?;
    if fields.is_empty() {
        return Err(field_error("maintenance_date", translations::field_required()));
    }
    Ok(fields)
}

/// `deleted`: None si el activo no existe, Some(true) si está en la papelera
fn check_target_state(target: MaintenanceTarget, deleted: Option<bool>, active_only: bool) -> AppResult<()> {
    match deleted {
        Some(true) if active_only => Err(not_found_error(target.model_name())),
        Some(_) => Ok(()),
        None => Err(not_found_error(target.model_name())),
    }
}

pub struct MaintenanceController {
    pool: PgPool,
    repository: MaintenanceRepository,
    recorder: ActionRecorder,
}

impl MaintenanceController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: MaintenanceRepository::new(pool.clone()),
            recorder: ActionRecorder::new(pool.clone()),
            pool,
        }
    }

    /// El activo debe existir; `active_only` excluye los de la papelera
    async fn ensure_target(&self, target: MaintenanceTarget, active_only: bool) -> AppResult<()> {
        let deleted = match target {
            AssetRef::Car(id) => CarRepository::new(self.pool.clone())
                .find_by_id(id)
                .await?
                .map(|car| car.is_deleted()),
            AssetRef::Equipment(id) => EquipmentRepository::new(self.pool.clone())
                .find_by_id(id)
                .await?
                .map(|equipment| equipment.is_deleted()),
        };
        check_target_state(target, deleted, active_only)
    }

    pub async fn list_for(
        &self,
        user: &AuthenticatedUser,
        target: MaintenanceTarget,
    ) -> Result<ApiResponse<Vec<MaintenanceRecord>>, AppError> {
        user.access.require(target.module(), PermissionType::Read)?;
        self.ensure_target(target, false).await?;
        let records = self.repository.list_for(target).await?;
        Ok(ApiResponse::success(records))
    }

    pub async fn create_for(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        target: MaintenanceTarget,
        input: MaintenanceInput,
    ) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        user.access.require(target.module(), PermissionType::Update)?;
        let fields = check_input(&input)?;
        self.ensure_target(target, true).await?;

        let record = self.repository.create(target, &fields).await?;
        info!("🔧 Mantenimiento {} registrado para {:?}", record.id, target);

        let message = translations::success(Operation::Create, translations::MAINTENANCE);
        self.recorder
            .record(user, client, ActionType::Create, target.module().as_str(), Some(target.id()), &message)
            .await;

        Ok(ApiResponse::success_with_message(record, message))
    }

    async fn find_with_target(&self, id: Uuid) -> AppResult<(MaintenanceRecord, MaintenanceTarget)> {
        let record = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error(translations::MAINTENANCE))?;
        let target = record
            .target()
            .ok_or_else(|| AppError::Internal(format!("maintenance record {} without owner", id)))?;
        Ok((record, target))
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
        input: MaintenanceInput,
    ) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        let (_, target) = self.find_with_target(id).await?;
        user.access.require(target.module(), PermissionType::Update)?;
        let fields = check_input(&input)?;
        self.ensure_target(target, true).await?;

        let record = self
            .repository
            .update(id, &fields)
            .await?
            .ok_or_else(|| not_found_error(translations::MAINTENANCE))?;

        let message = translations::success(Operation::Update, translations::MAINTENANCE);
        self.recorder
            .record(user, client, ActionType::Update, target.module().as_str(), Some(target.id()), &message)
            .await;

        Ok(ApiResponse::success_with_message(record, message))
    }

    pub async fn delete(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
    ) -> Result<ApiResponse<()>, AppError> {
        let (_, target) = self.find_with_target(id).await?;
        user.access.require(target.module(), PermissionType::Update)?;
        self.ensure_target(target, true).await?;

        if !self.repository.delete(id).await? {
            return Err(not_found_error(translations::MAINTENANCE));
        }
        info!("🔧 Mantenimiento {} eliminado", id);

        let message = translations::success(Operation::Delete, translations::MAINTENANCE);
        self.recorder
            .record(user, client, ActionType::Update, target.module().as_str(), Some(target.id()), &message)
            .await;

        Ok(ApiResponse::message(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_trashed_asset_is_not_editable() {
        let target = AssetRef::Car(Uuid::new_v4());

        assert!(check_target_state(target, Some(false), true).is_ok());
        assert!(matches!(check_target_state(target, Some(true), true), Err(AppError::NotFound(_))));
        assert!(matches!(check_target_state(target, None, true), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_trashed_asset_history_is_readable() {
        let target = AssetRef::Equipment(Uuid::new_v4());

        assert!(check_target_state(target, Some(true), false).is_ok());
        assert!(matches!(check_target_state(target, None, false), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_empty_maintenance_form_is_rejected() {
        match check_input(&MaintenanceInput::default()) {
            Err(AppError::Fields(fields)) => assert!(fields.contains("maintenance_date")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_restoration_before_maintenance_is_rejected() {
        let input = MaintenanceInput {
            maintenance_date: NaiveDate::from_ymd_opt(2024, 5, 10),
            restoration_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        match check_input(&input) {
            Err(AppError::Fields(fields)) => assert!(fields.contains("maintenance.restoration_date")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
