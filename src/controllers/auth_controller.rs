use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::controllers::ActionRecorder;
use crate::dto::auth_dto::{CurrentUserResponse, LoginRequest, LoginResponse};
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::audit::ActionType;
use crate::repositories::{AuditRepository, PermissionRepository, UserRepository};
use crate::services::auth::verify_password;
use crate::services::rbac::AccessContext;
use crate::state::AppState;
use crate::utils::errors::{AppError, FieldErrors};
use crate::utils::jwt::generate_token;
use crate::utils::translations;

const AUTH_MODULE: &str = "auth";

pub struct AuthController {
    state: AppState,
    users: UserRepository,
    audit: AuditRepository,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            users: UserRepository::new(state.pool.clone()),
            audit: AuditRepository::new(state.pool.clone()),
        }
    }

    /// Registra el intento fallido y devuelve el error para el cliente
    async fn reject(&self, client: &ClientInfo, user_id: Option<Uuid>, username: &str, error: AppError) -> AppError {
        if let Err(e) = self
            .audit
            .log_login(user_id, username, client.ip.as_deref(), client.user_agent.as_deref(), false)
            .await
        {
            warn!("⚠️ No se pudo registrar el intento fallido de {}: {}", username, e);
        }
        error
    }

    pub async fn login(
        &self,
        client: &ClientInfo,
        request: LoginRequest,
    ) -> Result<ApiResponse<LoginResponse>, AppError> {
        if let Err(e) = request.validate() {
            return Err(AppError::Fields(FieldErrors::from_validation(&e)));
        }
        let username = request.username.trim();

        let row = match self.users.find_by_username(username).await? {
            Some(row) => row,
            None => {
                warn!("🔒 Login con usuario desconocido: {}", username);
                let error = AppError::Unauthorized(translations::invalid_credentials());
                return Err(self.reject(client, None, username, error).await);
            }
        };

        if !verify_password(&request.password, &row.user.password_hash) {
            warn!("🔒 Contraseña incorrecta para {}", username);
            let error = AppError::Unauthorized(translations::invalid_credentials());
            return Err(self.reject(client, Some(row.user.id), username, error).await);
        }

        let grants = PermissionRepository::new(self.state.pool.clone())
            .grants_for_user(row.user.id)
            .await?;
        let profile = row.profile();
        let access = AccessContext::new(&row.user, profile.as_ref(), grants);
        if !access.is_active {
            warn!("🔒 Login de cuenta desactivada: {}", username);
            let error = AppError::Unauthorized(translations::account_disabled());
            return Err(self.reject(client, Some(row.user.id), username, error).await);
        }

        self.users.update_last_login(row.user.id).await?;
        self.audit
            .log_login(Some(row.user.id), username, client.ip.as_deref(), client.user_agent.as_deref(), true)
            .await?;
        if let Some(ip) = client.ip.as_deref() {
            self.state.login_limiter.reset(ip).await;
        }

        let token = generate_token(row.user.id, &row.user.username, &self.state.jwt)?;
        let user = AuthenticatedUser { user: row.user, access };
        info!("✅ Login exitoso: {} ({:?})", user.user.username, user.access.user_type);

        let message = translations::logged_in();
        ActionRecorder::new(self.state.pool.clone())
            .record(&user, client, ActionType::Login, AUTH_MODULE, Some(user.user.id), &message)
            .await;

        let current = CurrentUserResponse::new(&user.user, &user.access);
        Ok(ApiResponse::success_with_message(
            LoginResponse::bearer(token, self.state.jwt.expiration, current),
            message,
        ))
    }

    /// Los tokens no se revocan: el logout cierra la sesión en la auditoría
    pub async fn logout(&self, user: &AuthenticatedUser, client: &ClientInfo) -> Result<ApiResponse<()>, AppError> {
        if !self.audit.close_latest_login(user.user.id).await? {
            warn!("⚠️ Logout sin sesión abierta para {}", user.user.username);
        }
        info!("👋 Logout: {}", user.user.username);

        let message = translations::logged_out();
        ActionRecorder::new(self.state.pool.clone())
            .record(user, client, ActionType::Logout, AUTH_MODULE, Some(user.user.id), &message)
            .await;

        Ok(ApiResponse::message(message))
    }

    pub fn me(&self, user: &AuthenticatedUser) -> ApiResponse<CurrentUserResponse> {
        ApiResponse::success(CurrentUserResponse::new(&user.user, &user.access))
    }
}
