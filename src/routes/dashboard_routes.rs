use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};

use crate::controllers::dashboard_controller::DashboardController;
use crate::dto::asset_dto::{DashboardQuery, DashboardResponse};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardResponse>>, AppError> {
    let controller = DashboardController::new(state.pool.clone());
    Ok(Json(controller.overview(&user, query).await?))
}
