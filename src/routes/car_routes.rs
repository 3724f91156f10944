use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::attachment_controller::AttachmentController;
use crate::controllers::car_controller::CarController;
use crate::controllers::maintenance_controller::MaintenanceController;
use crate::dto::asset_dto::{AssetListQuery, AttachmentResponse, DeletePreview, MaintenanceInput};
use crate::dto::car_dto::{CarDetailResponse, CarRequest};
use crate::dto::common_dto::ConfirmQuery;
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::asset::AssetRef;
use crate::models::attachment::AttachmentKind;
use crate::models::car::{Car, CarListItem};
use crate::models::maintenance::MaintenanceRecord;
use crate::routes::read_files;
use crate::services::query::Page;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_car_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars).post(create_car))
        .route("/:id", get(get_car).put(update_car).delete(delete_car))
        .route("/:id/delete-preview", get(delete_preview))
        .route("/:id/restore", post(restore_car))
        .route("/:id/purge", delete(purge_car))
        .route("/:id/maintenance", get(list_maintenance).post(create_maintenance))
        .route("/:id/images", post(upload_images))
}

async fn list_cars(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<AssetListQuery>,
) -> Result<Json<ApiResponse<Page<CarListItem>>>, AppError> {
    let controller = CarController::new(&state);
    Ok(Json(controller.list(&user, query).await?))
}

async fn get_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CarDetailResponse>>, AppError> {
    let controller = CarController::new(&state);
    Ok(Json(controller.detail(&user, id).await?))
}

async fn create_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Json(request): Json<CarRequest>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let controller = CarController::new(&state);
    Ok(Json(controller.create(&user, &client, request).await?))
}

async fn update_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(request): Json<CarRequest>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let controller = CarController::new(&state);
    Ok(Json(controller.update(&user, &client, id, request).await?))
}

async fn delete_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = CarController::new(&state);
    Ok(Json(controller.delete(&user, &client, id).await?))
}

async fn delete_preview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletePreview>>, AppError> {
    let controller = CarController::new(&state);
    Ok(Json(controller.delete_preview(&user, id).await?))
}

async fn restore_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let controller = CarController::new(&state);
    Ok(Json(controller.restore(&user, &client, id).await?))
}

async fn purge_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = CarController::new(&state);
    Ok(Json(controller.purge(&user, &client, id, confirm).await?))
}

async fn list_maintenance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<MaintenanceRecord>>>, AppError> {
    let controller = MaintenanceController::new(state.pool.clone());
    Ok(Json(controller.list_for(&user, AssetRef::Car(id)).await?))
}

async fn create_maintenance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(input): Json<MaintenanceInput>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    let controller = MaintenanceController::new(state.pool.clone());
    Ok(Json(controller.create_for(&user, &client, AssetRef::Car(id), input).await?))
}

async fn upload_images(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<AttachmentResponse>>>, AppError> {
    let files = read_files(multipart).await?;
    let controller = AttachmentController::new(&state);
    let response = controller
        .upload(&user, &client, AssetRef::Car(id), AttachmentKind::CarImage, files)
        .await?;
    Ok(Json(response))
}
