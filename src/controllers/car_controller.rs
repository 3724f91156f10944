use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::controllers::attachment_controller::AttachmentController;
use crate::controllers::{check_hierarchy, ActionRecorder};
use crate::dto::asset_dto::{AssetListQuery, AttachmentResponse, DeletePreview};
use crate::dto::car_dto::{CarDetailResponse, CarRequest};
use crate::dto::common_dto::ConfirmQuery;
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::asset::{current_record, AssetRef, RecordTable};
use crate::models::attachment::AttachmentKind;
use crate::models::audit::ActionType;
use crate::models::car::{Car, CarListItem};
use crate::models::lookup::LookupTable;
use crate::models::maintenance::MaintenanceFields;
use crate::models::permission::{ModuleName, PermissionType};
use crate::repositories::{
    AttachmentRepository, CarRepository, LookupRepository, MaintenanceRepository, RecordRepository,
};
use crate::services::expiry::{CurrentExpiryDates, ExpirySummary};
use crate::services::query::Page;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, AppError, AppResult};
use crate::utils::translations::{self, Operation};

pub struct CarController {
    state: AppState,
    repository: CarRepository,
    lookups: LookupRepository,
    records: RecordRepository,
    recorder: ActionRecorder,
}

impl CarController {
    pub fn new(state: &AppState) -> Self {
        let pool: PgPool = state.pool.clone();
        Self {
            state: state.clone(),
            repository: CarRepository::new(pool.clone()),
            lookups: LookupRepository::new(pool.clone()),
            records: RecordRepository::new(pool.clone()),
            recorder: ActionRecorder::new(pool),
        }
    }

    async fn find(&self, id: Uuid) -> Result<Car, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error(translations::CAR))
    }

    async fn check_request(&self, request: &CarRequest) -> AppResult<Vec<MaintenanceFields>> {
        let maintenance = request.check()?;
        check_hierarchy(
            &self.lookups,
            &[
                ("department_id", LookupTable::Departments, request.department_id, request.sector_id),
                ("division_id", LookupTable::Divisions, request.division_id, request.department_id),
                ("car_model_id", LookupTable::CarModels, request.car_model_id, request.manufacturer_id),
            ],
        )
        .await?;
        Ok(maintenance)
    }

    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        query: AssetListQuery,
    ) -> Result<ApiResponse<Page<CarListItem>>, AppError> {
        user.access.require(ModuleName::Cars, PermissionType::Read)?;
        let deleted_only = query.deleted_only();
        if deleted_only {
            // Papelera
            user.access.require(ModuleName::Cars, PermissionType::Delete)?;
        }
        let page = self.repository.list(&query.list, deleted_only).await?;
        Ok(ApiResponse::success(page))
    }

    pub async fn detail(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ApiResponse<CarDetailResponse>, AppError> {
        user.access.require(ModuleName::Cars, PermissionType::Read)?;
        let car = self.find(id).await?;
        let owner = AssetRef::Car(id);

        let references = self.lookups.resolve_refs(&car.lookup_refs()).await?;
        let visited_regions = self.repository.visited_regions(id).await?;
        let license_records = self.records.list(RecordTable::License, owner).await?;
        let inspection_records = self.records.list(RecordTable::Inspection, owner).await?;
        let current_license = current_record(&license_records).cloned();
        let current_inspection = current_record(&inspection_records).cloned();

        let dates = CurrentExpiryDates {
            inspection_end: current_inspection.as_ref().map(|r| r.end_date),
            license_end: current_license.as_ref().map(|r| r.end_date),
            fire_extinguisher_expiry: None,
        };
        let expiry = ExpirySummary::build(&dates, Utc::now().date_naive(), false);

        let maintenance_records = MaintenanceRepository::new(self.state.pool.clone())
            .list_for(owner)
            .await?;
        let images = AttachmentRepository::new(self.state.pool.clone())
            .list_for(owner)
            .await?
            .into_iter()
            .filter(|a| a.kind == AttachmentKind::CarImage)
            .map(AttachmentResponse::from)
            .collect();

        Ok(ApiResponse::success(CarDetailResponse {
            status_ar: car.status.label_ar(),
            ownership_type_en: car.ownership_type.label_en(),
            car,
            references,
            visited_regions,
            license_records,
            inspection_records,
            current_license,
            current_inspection,
            expiry,
            maintenance_records,
            images,
        }))
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        request: CarRequest,
    ) -> Result<ApiResponse<Car>, AppError> {
        user.access.require(ModuleName::Cars, PermissionType::Create)?;
        let maintenance = self.check_request(&request).await?;

        let car = self.repository.create(&request, &maintenance).await?;
        info!("🚗 Vehículo creado: {} ({})", car.fleet_no, car.id);

        let message = translations::success(Operation::Create, translations::CAR);
        self.recorder
            .record(user, client, ActionType::Create, ModuleName::Cars.as_str(), Some(car.id), &message)
            .await;

        Ok(ApiResponse::success_with_message(car, message))
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
        request: CarRequest,
    ) -> Result<ApiResponse<Car>, AppError> {
        user.access.require(ModuleName::Cars, PermissionType::Update)?;
        let maintenance = self.check_request(&request).await?;

        let car = self
            .repository
            .update(id, &request, &maintenance)
            .await?
            .ok_or_else(|| not_found_error(translations::CAR))?;
        info!("🚗 Vehículo actualizado: {} ({})", car.fleet_no, car.id);

        let message = translations::success(Operation::Update, translations::CAR);
        self.recorder
            .record(user, client, ActionType::Update, ModuleName::Cars.as_str(), Some(id), &message)
            .await;

        Ok(ApiResponse::success_with_message(car, message))
    }

    pub async fn delete_preview(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<ApiResponse<DeletePreview>, AppError> {
        user.access.require(ModuleName::Cars, PermissionType::Delete)?;
        let car = self.find(id).await?;
        let counts = self.records.counts(AssetRef::Car(id)).await?;

        Ok(ApiResponse::success(DeletePreview {
            id,
            label: format!("{} - {}", car.fleet_no, car.plate_no_ar),
            is_deleted: car.is_deleted(),
            license_records: counts.license_records,
            inspection_records: counts.inspection_records,
            maintenance_records: counts.maintenance_records,
            attachments: counts.attachments,
        }))
    }

    /// Borrado lógico: el vehículo pasa a la papelera
    pub async fn delete(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
    ) -> Result<ApiResponse<()>, AppError> {
        user.access.require(ModuleName::Cars, PermissionType::Delete)?;
        if !self.repository.soft_delete(id).await? {
            return Err(not_found_error(translations::CAR));
        }
        info!("🗑️ Vehículo enviado a la papelera: {}", id);

        let message = translations::success(Operation::Delete, translations::CAR);
        self.recorder
            .record(user, client, ActionType::Delete, ModuleName::Cars.as_str(), Some(id), &message)
            .await;

        Ok(ApiResponse::message(message))
    }

    pub async fn restore(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
    ) -> Result<ApiResponse<Car>, AppError> {
        user.access.require(ModuleName::Cars, PermissionType::Delete)?;
        if !self.repository.restore(id).await? {
            return Err(not_found_error(translations::CAR));
        }
        let car = self.find(id).await?;
        info!("♻️ Vehículo restaurado: {}", id);

        let message = translations::success(Operation::Restore, translations::CAR);
        self.recorder
            .record(user, client, ActionType::Restore, ModuleName::Cars.as_str(), Some(id), &message)
            .await;

        Ok(ApiResponse::success_with_message(car, message))
    }

    /// Borrado definitivo de un vehículo que ya está en la papelera
    pub async fn purge(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
        confirm: ConfirmQuery,
    ) -> Result<ApiResponse<()>, AppError> {
        user.access.require(ModuleName::Cars, PermissionType::Delete)?;
        if !confirm.confirmed() {
            return Err(bad_request_error(translations::purge_requires_confirmation()));
        }
        let car = self.find(id).await?;
        if !car.is_deleted() {
            return Err(bad_request_error(translations::purge_requires_soft_delete()));
        }

        let owner = AssetRef::Car(id);
        let attachments = AttachmentRepository::new(self.state.pool.clone()).list_for(owner).await?;
        if !self.repository.purge(id).await? {
            return Err(not_found_error(translations::CAR));
        }
        AttachmentController::new(&self.state).remove_files(&attachments).await;
        info!("💥 Vehículo eliminado definitivamente: {} ({} archivos)", id, attachments.len());

        let message = translations::success(Operation::Delete, translations::CAR);
        self.recorder
            .record(user, client, ActionType::Delete, ModuleName::Cars.as_str(), Some(id), &message)
            .await;

        Ok(ApiResponse::message(message))
    }
}
