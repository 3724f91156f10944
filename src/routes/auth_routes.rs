use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::controllers::auth_controller::AuthController;
use crate::dto::auth_dto::{CurrentUserResponse, LoginRequest, LoginResponse};
use crate::dto::ApiResponse;
use crate::middleware::{login_rate_limit_middleware, AuthenticatedUser, ClientInfo};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Login público, con rate limiting por IP
pub fn create_login_router(state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/login",
        post(login).layer(middleware::from_fn_with_state(state.clone(), login_rate_limit_middleware)),
    )
}

/// Rutas de sesión que requieren token
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let controller = AuthController::new(&state);
    Ok(Json(controller.login(&client, request).await?))
}

async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AuthController::new(&state);
    Ok(Json(controller.logout(&user, &client).await?))
}

async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<ApiResponse<CurrentUserResponse>> {
    let controller = AuthController::new(&state);
    Json(controller.me(&user))
}
