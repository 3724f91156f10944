use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::lookup_controller::LookupController;
use crate::dto::lookup_dto::{HierarchyQuery, LookupListQuery, LookupRequest, LookupTableInfo};
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::lookup::LookupItem;
use crate::services::query::Page;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_lookup_router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalogue))
        .route("/:table", get(list_items).post(create_item))
        .route("/:table/:id", get(get_item).put(update_item).delete(delete_item))
}

/// Desplegables en cascada sector → departamento → división
pub fn create_hierarchy_router() -> Router<AppState> {
    Router::new()
        .route("/sectors", get(sectors))
        .route("/departments", get(departments))
        .route("/divisions", get(divisions))
}

async fn catalogue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<LookupTableInfo>>>, AppError> {
    let controller = LookupController::new(state.pool.clone());
    Ok(Json(controller.catalogue(&user)?))
}

async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(table): Path<String>,
    Query(query): Query<LookupListQuery>,
) -> Result<Json<ApiResponse<Page<LookupItem>>>, AppError> {
    let controller = LookupController::new(state.pool.clone());
    Ok(Json(controller.list(&user, &table, query).await?))
}

async fn get_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((table, id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<LookupItem>>, AppError> {
    let controller = LookupController::new(state.pool.clone());
    Ok(Json(controller.get(&user, &table, id).await?))
}

async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(table): Path<String>,
    Json(request): Json<LookupRequest>,
) -> Result<Json<ApiResponse<LookupItem>>, AppError> {
    let controller = LookupController::new(state.pool.clone());
    Ok(Json(controller.create(&user, &client, &table, request).await?))
}

async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path((table, id)): Path<(String, Uuid)>,
    Json(request): Json<LookupRequest>,
) -> Result<Json<ApiResponse<LookupItem>>, AppError> {
    let controller = LookupController::new(state.pool.clone());
    Ok(Json(controller.update(&user, &client, &table, id, request).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path((table, id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = LookupController::new(state.pool.clone());
    Ok(Json(controller.delete(&user, &client, &table, id).await?))
}

async fn sectors(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<LookupItem>>>, AppError> {
    let controller = LookupController::new(state.pool.clone());
    Ok(Json(controller.sectors().await?))
}

async fn departments(
    State(state): State<AppState>,
    Query(query): Query<HierarchyQuery>,
) -> Result<Json<ApiResponse<Vec<LookupItem>>>, AppError> {
    let controller = LookupController::new(state.pool.clone());
    Ok(Json(controller.departments(query).await?))
}

async fn divisions(
    State(state): State<AppState>,
    Query(query): Query<HierarchyQuery>,
) -> Result<Json<ApiResponse<Vec<LookupItem>>>, AppError> {
    let controller = LookupController::new(state.pool.clone());
    Ok(Json(controller.divisions(query).await?))
}
