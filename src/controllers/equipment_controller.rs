use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::controllers::attachment_controller::AttachmentController;
use crate::controllers::{check_hierarchy, ActionRecorder};
use crate::dto::asset_dto::{ref_name, AssetListQuery, AttachmentResponse, CompactMaintenance, DeletePreview};
use crate::dto::common_dto::ConfirmQuery;
use crate::dto::equipment_dto::{EquipmentCompactResponse, EquipmentDetailResponse, EquipmentRequest};
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::asset::{current_fire_extinguisher, current_record, AssetRef, RecordTable};
use crate::models::attachment::{Attachment, AttachmentKind};
use crate::models::audit::ActionType;
use crate::models::equipment::{Equipment, EquipmentListItem};
use crate::models::lookup::LookupTable;
use crate::models::maintenance::MaintenanceFields;
use crate::models::permission::{ModuleName, PermissionType};
use crate::repositories::{
    AttachmentRepository, EquipmentRepository, LookupRepository, MaintenanceRepository, RecordRepository,
};
use crate::services::expiry::{CurrentExpiryDates, ExpirySummary};
use crate::services::query::Page;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, AppError, AppResult};
use crate::utils::translations::{self, Operation};

fn by_kind(attachments: &[Attachment], kind: AttachmentKind) -> Vec<AttachmentResponse> {
    attachments
        .iter()
        .filter(|a| a.kind == kind)
        .cloned()
        .map(AttachmentResponse::from)
        .collect()
}

fn format_date(date: Option<chrono::NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

pub struct EquipmentController {
    state: AppState,
    repository: EquipmentRepository,
    lookups: LookupRepository,
    records: RecordRepository,
    recorder: ActionRecorder,
}

impl EquipmentController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            repository: EquipmentRepository::new(state.pool.clone()),
            lookups: LookupRepository::new(state.pool.clone()),
            records: RecordRepository::new(state.pool.clone()),
            recorder: ActionRecorder::new(state.pool.clone()),
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<Equipment> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error(translations::EQUIPMENT))
    }

    async fn check_request(&self, request: &EquipmentRequest) -> AppResult<Vec<MaintenanceFields>> {
        let maintenance = request.check()?;
        check_hierarchy(
            &self.lookups,
            &[
                ("department_id", LookupTable::Departments, request.department_id, request.sector_id),
                ("division_id", LookupTable::Divisions, request.division_id, request.department_id),
                (
                    "equipment_model_id",
                    LookupTable::EquipmentModels,
                    request.equipment_model_id,
                    request.manufacturer_id,
                ),
            ],
        )
        .await?;
        Ok(maintenance)
    }

    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        query: AssetListQuery,
    ) -> Result<ApiResponse<Page<EquipmentListItem>>, AppError> {
        user.access.require(ModuleName::Equipment, PermissionType::Read)?;
        let deleted_only = query.deleted_only();
        if deleted_only {
            // Papelera
            user.access.require(ModuleName::Equipment, PermissionType::Delete)?;
        }
        let page = self.repository.list(&query.list, deleted_only).await?;
        Ok(ApiResponse::success(page))
    }

    pub async fn detail(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<ApiResponse<EquipmentDetailResponse>, AppError> {
        user.access.require(ModuleName::Equipment, PermissionType::Read)?;
        let equipment = self.find(id).await?;
        let owner = AssetRef::Equipment(id);

        let references = self.lookups.resolve_refs(&equipment.lookup_refs()).await?;
        let license_records = self.records.list(RecordTable::License, owner).await?;
        let inspection_records = self.records.list(RecordTable::Inspection, owner).await?;
        let fire_extinguisher_records = self.records.list_fire_extinguisher(id).await?;
        let current_license = current_record(&license_records).cloned();
        let current_inspection = current_record(&inspection_records).cloned();
        let current_fire_extinguisher = current_fire_extinguisher(&fire_extinguisher_records).cloned();

        let dates = CurrentExpiryDates {
            inspection_end: current_inspection.as_ref().map(|r| r.end_date),
            license_end: current_license.as_ref().map(|r| r.end_date),
            fire_extinguisher_expiry: current_fire_extinguisher.as_ref().map(|r| r.expiry_date),
        };
        let expiry = ExpirySummary::build(&dates, Utc::now().date_naive(), true);

        let maintenance_records = MaintenanceRepository::new(self.state.pool.clone())
            .list_for(owner)
            .await?;
        let attachments = AttachmentRepository::new(self.state.pool.clone()).list_for(owner).await?;

        Ok(ApiResponse::success(EquipmentDetailResponse {
            status_ar: equipment.status.label_ar(),
            equipment,
            references,
            license_records,
            inspection_records,
            fire_extinguisher_records,
            current_license,
            current_inspection,
            current_fire_extinguisher,
            expiry,
            maintenance_records,
            images: by_kind(&attachments, AttachmentKind::EquipmentImage),
            calibration_certificates: by_kind(&attachments, AttachmentKind::CalibrationCertificate),
            fire_extinguisher_images: by_kind(&attachments, AttachmentKind::FireExtinguisherImage),
        }))
    }

    /// Detalle compacto para la ventana emergente del listado
    pub async fn compact_detail(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<ApiResponse<EquipmentCompactResponse>, AppError> {
        user.access.require(ModuleName::Equipment, PermissionType::Read)?;
        let equipment = self.find(id).await?;
        let owner = AssetRef::Equipment(id);

        let references = self.lookups.resolve_refs(&equipment.lookup_refs()).await?;
        let license_records = self.records.list(RecordTable::License, owner).await?;
        let inspection_records = self.records.list(RecordTable::Inspection, owner).await?;
        let license = current_record(&license_records);
        let inspection = current_record(&inspection_records);
        let maintenance = MaintenanceRepository::new(self.state.pool.clone())
            .list_for(owner)
            .await?;
        let attachments = AttachmentRepository::new(self.state.pool.clone()).list_for(owner).await?;
        let urls = |kind: AttachmentKind| -> Vec<String> {
            attachments.iter().filter(|a| a.kind == kind).map(|a| a.url()).collect()
        };

        Ok(ApiResponse::success(EquipmentCompactResponse {
            id: equipment.id,
            door_no: equipment.door_no.clone(),
            plate_no: equipment.plate_no.clone(),
            manufacture_year: equipment.manufacture_year,
            manufacturer: ref_name(references.get("manufacturer")),
            model: ref_name(references.get("equipment_model")),
            location: ref_name(references.get("location")),
            sector: ref_name(references.get("sector")),
            status: equipment.status,
            status_display: equipment.status.label_ar(),
            license_start_date: format_date(license.map(|r| r.start_date)),
            license_end_date: format_date(license.map(|r| r.end_date)),
            inspection_start_date: format_date(inspection.map(|r| r.start_date)),
            inspection_end_date: format_date(inspection.map(|r| r.end_date)),
            image_urls: urls(AttachmentKind::EquipmentImage),
            calibration_certificates: urls(AttachmentKind::CalibrationCertificate),
            maintenance_records: maintenance.iter().map(CompactMaintenance::from).collect(),
        }))
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        request: EquipmentRequest,
    ) -> Result<ApiResponse<Equipment>, AppError> {
        user.access.require(ModuleName::Equipment, PermissionType::Create)?;
        let maintenance = self.check_request(&request).await?;

        let equipment = self.repository.create(&request, &maintenance).await?;
        info!("🚜 Equipo creado: {} ({})", equipment.door_no, equipment.id);

        let message = translations::success(Operation::Create, translations::EQUIPMENT);
        self.recorder
            .record(user, client, ActionType::Create, ModuleName::Equipment.as_str(), Some(equipment.id), &message)
            .await;

        Ok(ApiResponse::success_with_message(equipment, message))
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
        request: EquipmentRequest,
    ) -> Result<ApiResponse<Equipment>, AppError> {
        user.access.require(ModuleName::Equipment, PermissionType::Update)?;
        let maintenance = self.check_request(&request).await?;

        let equipment = self
            .repository
            .update(id, &request, &maintenance)
            .await?
            .ok_or_else(|| not_found_error(translations::EQUIPMENT))?;
        info!("🚜 Equipo actualizado: {} ({})", equipment.door_no, equipment.id);

        let message = translations::success(Operation::Update, translations::EQUIPMENT);
        self.recorder
            .record(user, client, ActionType::Update, ModuleName::Equipment.as_str(), Some(id), &message)
            .await;

        Ok(ApiResponse::success_with_message(equipment, message))
    }

    pub async fn delete_preview(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<ApiResponse<DeletePreview>, AppError> {
        user.access.require(ModuleName::Equipment, PermissionType::Delete)?;
        let equipment = self.find(id).await?;
        let counts = self.records.counts(AssetRef::Equipment(id)).await?;

        Ok(ApiResponse::success(DeletePreview {
            id,
            label: format!("{} - {}", equipment.door_no, equipment.plate_no),
            is_deleted: equipment.is_deleted(),
            license_records: counts.license_records,
            inspection_records: counts.inspection_records,
            maintenance_records: counts.maintenance_records,
            attachments: counts.attachments,
        }))
    }

    pub async fn delete(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
    ) -> Result<ApiResponse<()>, AppError> {
        user.access.require(ModuleName::Equipment, PermissionType::Delete)?;
        if !self.repository.soft_delete(id).await? {
            return Err(not_found_error(translations::EQUIPMENT));
        }
        info!("🗑️ Equipo enviado a la papelera: {}", id);

        let message = translations::success(Operation::Delete, translations::EQUIPMENT);
        self.recorder
            .record(user, client, ActionType::Delete, ModuleName::Equipment.as_str(), Some(id), &message)
            .await;

        Ok(ApiResponse::message(message))
    }

    pub async fn restore(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
    ) -> Result<ApiResponse<Equipment>, AppError> {
        user.access.require(ModuleName::Equipment, PermissionType::Delete)?;
        if !self.repository.restore(id).await? {
            return Err(not_found_error(translations::EQUIPMENT));
        }
        let equipment = self.find(id).await?;
        info!("♻️ Equipo restaurado: {}", id);

        let message = translations::success(Operation::Restore, translations::EQUIPMENT);
        self.recorder
            .record(user, client, ActionType::Restore, ModuleName::Equipment.as_str(), Some(id), &message)
            .await;

        Ok(ApiResponse::success_with_message(equipment, message))
    }

    pub async fn purge(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
        confirm: ConfirmQuery,
    ) -> Result<ApiResponse<()>, AppError> {
        user.access.require(ModuleName::Equipment, PermissionType::Delete)?;
        if !confirm.confirmed() {
            return Err(bad_request_error(translations::purge_requires_confirmation()));
        }
        let equipment = self.find(id).await?;
        if !equipment.is_deleted() {
            return Err(bad_request_error(translations::purge_requires_soft_delete()));
        }

        let attachments = AttachmentRepository::new(self.state.pool.clone())
            .list_for(AssetRef::Equipment(id))
            .await?;
        if !self.repository.purge(id).await? {
            return Err(not_found_error(translations::EQUIPMENT));
        }
        AttachmentController::new(&self.state).remove_files(&attachments).await;
        info!("💥 Equipo eliminado definitivamente: {} ({} archivos)", id, attachments.len());

        let message = translations::success(Operation::Delete, translations::EQUIPMENT);
        self.recorder
            .record(user, client, ActionType::Delete, ModuleName::Equipment.as_str(), Some(id), &message)
            .await;

        Ok(ApiResponse::message(message))
    }
}
