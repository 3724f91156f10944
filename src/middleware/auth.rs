//! Middleware de autenticación JWT
//!
//! Verifica el token Bearer, carga el usuario con su perfil y permisos y
//! deja un `AuthenticatedUser` en las extensions de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::models::user::User;
use crate::repositories::{PermissionRepository, UserRepository};
use crate::services::rbac::AccessContext;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{extract_token_from_header, verify_token};
use crate::utils::translations;

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub access: AccessContext,
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_token_from_header)
        .ok_or_else(|| AppError::Unauthorized(translations::login_required()))?;

    let claims = verify_token(token, &state.jwt).map_err(|e| {
        debug!("🔑 Token rechazado: {}", e);
        AppError::Unauthorized(translations::invalid_token())
    })?;
    let user_id = claims
        .user_id()
        .map_err(|_| AppError::Unauthorized(translations::invalid_token()))?;

    let row = UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized(translations::invalid_token()))?;

    let grants = PermissionRepository::new(state.pool.clone())
        .grants_for_user(user_id)
        .await?;
    let profile = row.profile();
    let access = AccessContext::new(&row.user, profile.as_ref(), grants);

    if !access.is_active {
        warn!("🔒 Token de una cuenta desactivada: {}", row.user.username);
        return Err(AppError::Unauthorized(translations::account_disabled()));
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user: row.user,
        access,
    });

    Ok(next.run(request).await)
}
