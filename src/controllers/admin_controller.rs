use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::controllers::ActionRecorder;
use crate::dto::admin_dto::{
    CreateUserRequest, ModulePermissionResponse, PermissionPairRequest, SetPermissionsRequest, UpdateUserRequest,
    UserListQuery, UserPermissionsResponse, UserResponse,
};
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::audit::ActionType;
use crate::models::user::{UserType, UserWithProfile};
use crate::repositories::user_repository::{NewUser, UserChanges, UserFilter};
use crate::repositories::{PermissionRepository, UserRepository};
use crate::services::auth::hash_password;
use crate::services::query::Page;
use crate::services::rbac::{can_manage_user_type, check_permission_assignment, effective_user_type, AccessContext};
use crate::utils::errors::{bad_request_error, not_found_error, AppError, AppResult};
use crate::utils::translations::{self, Localized, Operation};

const USERS_MODULE: &str = "users";
const PERMISSIONS_MODULE: &str = "permissions";

fn target_type(row: &UserWithProfile) -> UserType {
    effective_user_type(&row.user, row.profile().as_ref())
}

fn cannot_change_self() -> Localized {
    Localized::new(
        "You cannot delete or deactivate your own account.",
        "لا يمكنك حذف أو تعطيل حسابك الخاص.",
    )
}

/// ¿Puede el actor gestionar un usuario de ese tipo?
fn ensure_can_manage(actor: &AuthenticatedUser, target: UserType) -> AppResult<()> {
    if can_manage_user_type(actor.access.user_type, target) {
        Ok(())
    } else {
        Err(AppError::Forbidden(translations::permission_denied()))
    }
}

pub struct AdminController {
    users: UserRepository,
    permissions: PermissionRepository,
    recorder: ActionRecorder,
}

impl AdminController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            permissions: PermissionRepository::new(pool.clone()),
            recorder: ActionRecorder::new(pool),
        }
    }

    async fn find_user(&self, id: Uuid) -> AppResult<UserWithProfile> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error(translations::USER))
    }

    pub async fn list_users(
        &self,
        actor: &AuthenticatedUser,
        query: UserListQuery,
    ) -> Result<ApiResponse<Page<UserResponse>>, AppError> {
        actor.access.require_admin()?;
        let filter = UserFilter {
            user_type: query.user_type(),
            is_active: query.is_active(),
        };
        let page = self.users.list(&query.list, filter).await?;
        Ok(ApiResponse::success(page.map(UserResponse::from)))
    }

    pub async fn get_user(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<ApiResponse<UserResponse>, AppError> {
        actor.access.require_admin()?;
        let row = self.find_user(id).await?;
        Ok(ApiResponse::success(UserResponse::from(row)))
    }

    pub async fn create_user(
        &self,
        actor: &AuthenticatedUser,
        client: &ClientInfo,
        request: CreateUserRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        actor.access.require_admin()?;
        request.check()?;
        ensure_can_manage(actor, request.user_type)?;

        let row = self
            .users
            .create(NewUser {
                username: request.username.trim().to_string(),
                email: request.email.trim().to_string(),
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                password_hash: hash_password(&request.password)?,
                is_superuser: request.user_type == UserType::SuperAdmin,
                is_active: request.is_active,
                user_type: request.user_type,
                created_by: Some(actor.user.id),
            })
            .await?;
        info!("👤 Usuario creado: {} ({:?}) por {}", row.user.username, request.user_type, actor.user.username);

        let message = translations::user_saved(Operation::Create, &row.user.username);
        self.recorder
            .record(actor, client, ActionType::Create, USERS_MODULE, Some(row.user.id), &message)
            .await;

        Ok(ApiResponse::success_with_message(UserResponse::from(row), message))
    }

    pub async fn update_user(
        &self,
        actor: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        actor.access.require_admin()?;
        request.check()?;
        let current = self.find_user(id).await?;
        ensure_can_manage(actor, target_type(&current))?;
        if let Some(new_type) = request.user_type {
            ensure_can_manage(actor, new_type)?;
        }
        if id == actor.user.id && request.is_active == Some(false) {
            return Err(bad_request_error(cannot_change_self()));
        }

        let password_hash = match request.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };
        let changes = UserChanges {
            email: request.email.map(|e| e.trim().to_string()),
            first_name: request.first_name.map(|n| n.trim().to_string()),
            last_name: request.last_name.map(|n| n.trim().to_string()),
            password_hash,
            user_type: request.user_type,
            is_active: request.is_active,
        };
        let row = self.users.update(id, changes, actor.user.id).await?;

        let message = translations::user_saved(Operation::Update, &row.user.username);
        self.recorder
            .record(actor, client, ActionType::Update, USERS_MODULE, Some(id), &message)
            .await;

        Ok(ApiResponse::success_with_message(UserResponse::from(row), message))
    }

    /// Borrado lógico: desactiva la cuenta y su perfil
    pub async fn delete_user(
        &self,
        actor: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
    ) -> Result<ApiResponse<()>, AppError> {
        actor.access.require_admin()?;
        if id == actor.user.id {
            return Err(bad_request_error(cannot_change_self()));
        }
        let row = self.find_user(id).await?;
        ensure_can_manage(actor, target_type(&row))?;

        self.users.set_active(id, false).await?;
        info!("🚫 Usuario desactivado: {} por {}", row.user.username, actor.user.username);

        let message = translations::user_saved(Operation::Delete, &row.user.username);
        self.recorder
            .record(actor, client, ActionType::Delete, USERS_MODULE, Some(id), &message)
            .await;

        Ok(ApiResponse::message(message))
    }

    pub async fn restore_user(
        &self,
        actor: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        actor.access.require_admin()?;
        let row = self.find_user(id).await?;
        ensure_can_manage(actor, target_type(&row))?;

        self.users.set_active(id, true).await?;
        let row = self.find_user(id).await?;
        info!("♻️ Usuario reactivado: {}", row.user.username);

        let message = translations::user_saved(Operation::Restore, &row.user.username);
        self.recorder
            .record(actor, client, ActionType::Restore, USERS_MODULE, Some(id), &message)
            .await;

        Ok(ApiResponse::success_with_message(UserResponse::from(row), message))
    }

    async fn permissions_view(&self, row: UserWithProfile) -> AppResult<UserPermissionsResponse> {
        let grants = self.permissions.grants_for_user(row.user.id).await?;
        let profile = row.profile();
        let effective = AccessContext::new(&row.user, profile.as_ref(), grants.clone()).summary();
        Ok(UserPermissionsResponse {
            user: UserResponse::from(row),
            grants,
            effective,
        })
    }

    pub async fn get_permissions(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<ApiResponse<UserPermissionsResponse>, AppError> {
        actor.access.require_admin()?;
        let row = self.find_user(id).await?;
        Ok(ApiResponse::success(self.permissions_view(row).await?))
    }

    /// El asignador debe ser admin y el destino un usuario normal
    async fn assignable_target(&self, actor: &AuthenticatedUser, id: Uuid) -> AppResult<UserWithProfile> {
        actor.access.require_admin()?;
        let row = self.find_user(id).await?;
        check_permission_assignment(actor.access.user_type, target_type(&row)).map_err(bad_request_error)?;
        Ok(row)
    }

    pub async fn replace_permissions(
        &self,
        actor: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
        request: SetPermissionsRequest,
    ) -> Result<ApiResponse<UserPermissionsResponse>, AppError> {
        let pairs = request.pairs()?;
        let row = self.assignable_target(actor, id).await?;

        self.permissions.replace_user_permissions(id, &pairs).await?;
        info!("🔑 Permisos de {} reemplazados ({} pares)", row.user.username, pairs.len());

        let message = translations::permissions_updated(&row.user.username);
        self.recorder
            .record(actor, client, ActionType::PermissionChange, PERMISSIONS_MODULE, Some(id), &message)
            .await;

        Ok(ApiResponse::success_with_message(self.permissions_view(row).await?, message))
    }

    /// Concede (`granted = true`) o revoca un solo par módulo/permiso
    pub async fn set_permission(
        &self,
        actor: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
        request: PermissionPairRequest,
        granted: bool,
    ) -> Result<ApiResponse<UserPermissionsResponse>, AppError> {
        let (module, permission) = request.into_pair()?;
        let row = self.assignable_target(actor, id).await?;

        if !self.permissions.set_grant(id, module, permission, granted).await? {
            return Err(not_found_error(translations::PERMISSIONS));
        }
        info!(
            "🔑 {} {}.{} para {}",
            if granted { "Concedido" } else { "Revocado" },
            module.as_str(),
            permission.as_str(),
            row.user.username
        );

        let message = translations::permissions_updated(&row.user.username);
        self.recorder
            .record(actor, client, ActionType::PermissionChange, PERMISSIONS_MODULE, Some(id), &message)
            .await;

        Ok(ApiResponse::success_with_message(self.permissions_view(row).await?, message))
    }

    pub async fn module_permissions(
        &self,
        actor: &AuthenticatedUser,
    ) -> Result<ApiResponse<Vec<ModulePermissionResponse>>, AppError> {
        actor.access.require_admin()?;
        let permissions = self.permissions.list_module_permissions().await?;
        Ok(ApiResponse::success(
            permissions.into_iter().map(ModulePermissionResponse::from).collect(),
        ))
    }
}
