use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::admin_controller::AdminController;
use crate::controllers::audit_controller::{ActionLogPage, AuditController, CsvExport};
use crate::dto::admin_dto::{
    CreateUserRequest, ModulePermissionResponse, PermissionPairRequest, SetPermissionsRequest, UpdateUserRequest,
    UserListQuery, UserPermissionsResponse, UserResponse,
};
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::audit::LoginLogEntry;
use crate::services::audit::{AuditStatistics, LogQuery, StatisticsQuery};
use crate::services::export::content_disposition;
use crate::services::query::Page;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/users/:id/restore", post(restore_user))
        .route("/users/:id/permissions", get(get_permissions).put(replace_permissions))
        .route("/users/:id/permissions/grant", post(grant_permission))
        .route("/users/:id/permissions/revoke", post(revoke_permission))
        .route("/module-permissions", get(module_permissions))
        .route("/statistics", get(statistics))
        .route("/login-logs", get(login_logs))
        .route("/login-logs/export", get(export_login_logs))
        .route("/action-logs", get(action_logs))
        .route("/action-logs/export", get(export_action_logs))
}

fn csv_response(export: CsvExport) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(export.filename)),
        ],
        export.bytes,
    )
        .into_response()
}

async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Page<UserResponse>>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.list_users(&user, query).await?))
}

async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.get_user(&user, id).await?))
}

async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.create_user(&user, &client, request).await?))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.update_user(&user, &client, id, request).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.delete_user(&user, &client, id).await?))
}

async fn restore_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.restore_user(&user, &client, id).await?))
}

async fn get_permissions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserPermissionsResponse>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.get_permissions(&user, id).await?))
}

async fn replace_permissions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(request): Json<SetPermissionsRequest>,
) -> Result<Json<ApiResponse<UserPermissionsResponse>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.replace_permissions(&user, &client, id, request).await?))
}

async fn grant_permission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(request): Json<PermissionPairRequest>,
) -> Result<Json<ApiResponse<UserPermissionsResponse>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.set_permission(&user, &client, id, request, true).await?))
}

async fn revoke_permission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(request): Json<PermissionPairRequest>,
) -> Result<Json<ApiResponse<UserPermissionsResponse>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.set_permission(&user, &client, id, request, false).await?))
}

async fn module_permissions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<ModulePermissionResponse>>>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    Ok(Json(controller.module_permissions(&user).await?))
}

async fn statistics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<ApiResponse<AuditStatistics>>, AppError> {
    let controller = AuditController::new(state.pool.clone());
    Ok(Json(controller.statistics(&user, query).await?))
}

async fn login_logs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<LogQuery>,
) -> Result<Json<ApiResponse<Page<LoginLogEntry>>>, AppError> {
    let controller = AuditController::new(state.pool.clone());
    Ok(Json(controller.login_logs(&user, query).await?))
}

async fn action_logs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<LogQuery>,
) -> Result<Json<ApiResponse<ActionLogPage>>, AppError> {
    let controller = AuditController::new(state.pool.clone());
    Ok(Json(controller.action_logs(&user, query).await?))
}

async fn export_login_logs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<LogQuery>,
) -> Result<Response, AppError> {
    let controller = AuditController::new(state.pool.clone());
    Ok(csv_response(controller.export_login_logs(&user, query).await?))
}

async fn export_action_logs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<LogQuery>,
) -> Result<Response, AppError> {
    let controller = AuditController::new(state.pool.clone());
    Ok(csv_response(controller.export_action_logs(&user, query).await?))
}
