use axum::{
    extract::{Path, State},
    routing::put,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::maintenance_controller::MaintenanceController;
use crate::dto::asset_dto::MaintenanceInput;
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::maintenance::MaintenanceRecord;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_maintenance_router() -> Router<AppState> {
    Router::new().route("/:id", put(update_maintenance).delete(delete_maintenance))
}

async fn update_maintenance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(input): Json<MaintenanceInput>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    let controller = MaintenanceController::new(state.pool.clone());
    Ok(Json(controller.update(&user, &client, id, input).await?))
}

async fn delete_maintenance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = MaintenanceController::new(state.pool.clone());
    Ok(Json(controller.delete(&user, &client, id).await?))
}
