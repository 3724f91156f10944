use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::attachment_controller::AttachmentController;
use crate::controllers::equipment_controller::EquipmentController;
use crate::controllers::maintenance_controller::MaintenanceController;
use crate::dto::asset_dto::{AssetListQuery, AttachmentResponse, DeletePreview, MaintenanceInput};
use crate::dto::common_dto::ConfirmQuery;
use crate::dto::equipment_dto::{EquipmentCompactResponse, EquipmentDetailResponse, EquipmentRequest};
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::asset::AssetRef;
use crate::models::attachment::AttachmentKind;
use crate::models::equipment::{Equipment, EquipmentListItem};
use crate::models::maintenance::MaintenanceRecord;
use crate::routes::read_files;
use crate::services::query::Page;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_equipment_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_equipment).post(create_equipment))
        .route("/:id", get(get_equipment).put(update_equipment).delete(delete_equipment))
        .route("/:id/detail-json", get(compact_detail))
        .route("/:id/delete-preview", get(delete_preview))
        .route("/:id/restore", post(restore_equipment))
        .route("/:id/purge", delete(purge_equipment))
        .route("/:id/maintenance", get(list_maintenance).post(create_maintenance))
        .route("/:id/images", post(upload_images))
        .route("/:id/calibration-certificates", post(upload_certificates))
        .route("/:id/fire-extinguisher-images", post(upload_fire_extinguisher_images))
}

async fn list_equipment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<AssetListQuery>,
) -> Result<Json<ApiResponse<Page<EquipmentListItem>>>, AppError> {
    let controller = EquipmentController::new(&state);
    Ok(Json(controller.list(&user, query).await?))
}

async fn get_equipment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EquipmentDetailResponse>>, AppError> {
    let controller = EquipmentController::new(&state);
    Ok(Json(controller.detail(&user, id).await?))
}

async fn compact_detail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EquipmentCompactResponse>>, AppError> {
    let controller = EquipmentController::new(&state);
    Ok(Json(controller.compact_detail(&user, id).await?))
}

async fn create_equipment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Json(request): Json<EquipmentRequest>,
) -> Result<Json<ApiResponse<Equipment>>, AppError> {
    let controller = EquipmentController::new(&state);
    Ok(Json(controller.create(&user, &client, request).await?))
}

async fn update_equipment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(request): Json<EquipmentRequest>,
) -> Result<Json<ApiResponse<Equipment>>, AppError> {
    let controller = EquipmentController::new(&state);
    Ok(Json(controller.update(&user, &client, id, request).await?))
}

async fn delete_equipment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = EquipmentController::new(&state);
    Ok(Json(controller.delete(&user, &client, id).await?))
}

async fn delete_preview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletePreview>>, AppError> {
    let controller = EquipmentController::new(&state);
    Ok(Json(controller.delete_preview(&user, id).await?))
}

async fn restore_equipment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Equipment>>, AppError> {
    let controller = EquipmentController::new(&state);
    Ok(Json(controller.restore(&user, &client, id).await?))
}

async fn purge_equipment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = EquipmentController::new(&state);
    Ok(Json(controller.purge(&user, &client, id, confirm).await?))
}

async fn list_maintenance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<MaintenanceRecord>>>, AppError> {
    let controller = MaintenanceController::new(state.pool.clone());
    Ok(Json(controller.list_for(&user, AssetRef::Equipment(id)).await?))
}

async fn create_maintenance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(input): Json<MaintenanceInput>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    let controller = MaintenanceController::new(state.pool.clone());
    Ok(Json(controller.create_for(&user, &client, AssetRef::Equipment(id), input).await?))
}

async fn upload(
    state: &AppState,
    user: &AuthenticatedUser,
    client: &ClientInfo,
    id: Uuid,
    kind: AttachmentKind,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<AttachmentResponse>>>, AppError> {
    let files = read_files(multipart).await?;
    let controller = AttachmentController::new(state);
    Ok(Json(controller.upload(user, client, AssetRef::Equipment(id), kind, files).await?))
}

async fn upload_images(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<AttachmentResponse>>>, AppError> {
    upload(&state, &user, &client, id, AttachmentKind::EquipmentImage, multipart).await
}

async fn upload_certificates(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<AttachmentResponse>>>, AppError> {
    upload(&state, &user, &client, id, AttachmentKind::CalibrationCertificate, multipart).await
}

async fn upload_fire_extinguisher_images(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<AttachmentResponse>>>, AppError> {
    upload(&state, &user, &client, id, AttachmentKind::FireExtinguisherImage, multipart).await
}
