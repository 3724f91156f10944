use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::permission::{ModulePermission, ModuleName, PermissionGrant, PermissionType};
use crate::models::user::{UserType, UserWithProfile};
use crate::services::auth::check_password_strength;
use crate::services::query::ListQuery;
use crate::services::rbac::effective_user_type;
use crate::utils::errors::{AppError, AppResult, FieldErrors};
use crate::utils::translations::Localized;
use crate::utils::validation::{parse_bool_param, validate_username};

fn check_with_password(
    validation: Result<(), validator::ValidationErrors>,
    password: Option<&str>,
) -> AppResult<()> {
    let mut errors = match validation {
        Ok(()) => FieldErrors::new(),
        Err(e) => FieldErrors::from_validation(&e),
    };
    if let Some(password) = password {
        if let Err(message) = check_password_strength(password) {
            errors.add("password", message);
        }
    }
    errors.into_result()
}

// Request para crear un usuario
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150), custom = "validate_username")]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub first_name: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
    pub user_type: UserType,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl CreateUserRequest {
    pub fn check(&self) -> AppResult<()> {
        check_with_password(self.validate(), Some(&self.password))
    }
}

// Request para actualizar un usuario (campos omitidos no cambian)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub user_type: Option<UserType>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn check(&self) -> AppResult<()> {
        let password = self.password.as_deref().filter(|p| !p.is_empty());
        check_with_password(self.validate(), password)
    }
}

// Listado de usuarios
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    #[serde(flatten)]
    pub list: ListQuery,
    pub user_type: Option<String>,
    pub is_active: Option<String>,
}

impl UserListQuery {
    pub fn user_type(&self) -> Option<UserType> {
        self.user_type.as_deref().and_then(|t| UserType::parse(t.trim()))
    }

    pub fn is_active(&self) -> Option<bool> {
        parse_bool_param(self.is_active.as_deref())
    }
}

// Response de usuario (sin hash de contraseña)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub user_type: UserType,
    pub user_type_ar: &'static str,
    pub has_profile: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<UserWithProfile> for UserResponse {
    fn from(row: UserWithProfile) -> Self {
        let profile = row.profile();
        let user_type = effective_user_type(&row.user, profile.as_ref());
        let is_active = row.user.is_active && profile.as_ref().map_or(true, |p| p.is_active);
        Self {
            full_name: row.user.full_name(),
            user_type,
            user_type_ar: user_type.label_ar(),
            has_profile: profile.is_some(),
            is_active,
            created_by: row.created_by,
            id: row.user.id,
            username: row.user.username,
            email: row.user.email,
            first_name: row.user.first_name,
            last_name: row.user.last_name,
            is_superuser: row.user.is_superuser,
            last_login: row.user.last_login,
            created_at: row.user.created_at,
        }
    }
}

// Par módulo/permiso tal como llega en JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PermissionPairRequest {
    pub module_name: String,
    pub permission_type: String,
}

impl PermissionPairRequest {
    pub fn parse(&self, field: &str, errors: &mut FieldErrors) -> Option<(ModuleName, PermissionType)> {
        let module = ModuleName::parse(self.module_name.trim());
        let permission = PermissionType::parse(self.permission_type.trim());
        if module.is_none() {
            errors.add(
                format!("{}.module_name", field),
                Localized::new(
                    format!("Invalid module '{}'.", self.module_name),
                    format!("الوحدة '{}' غير صالحة.", self.module_name),
                ),
            );
        }
        if permission.is_none() {
            errors.add(
                format!("{}.permission_type", field),
                Localized::new(
                    format!("Invalid permission type '{}'.", self.permission_type),
                    format!("نوع الصلاحية '{}' غير صالح.", self.permission_type),
                ),
            );
        }
        module.zip(permission)
    }

    pub fn into_pair(self) -> AppResult<(ModuleName, PermissionType)> {
        let mut errors = FieldErrors::new();
        match self.parse("permission", &mut errors) {
            Some(pair) => Ok(pair),
            None => Err(AppError::Fields(errors)),
        }
    }
}

// Reemplazo completo del conjunto de permisos de un usuario
#[derive(Debug, Clone, Deserialize)]
pub struct SetPermissionsRequest {
    pub permissions: Vec<PermissionPairRequest>,
}

impl SetPermissionsRequest {
    pub fn pairs(&self) -> AppResult<Vec<(ModuleName, PermissionType)>> {
        let mut errors = FieldErrors::new();
        let mut pairs = Vec::new();
        for (i, item) in self.permissions.iter().enumerate() {
            if let Some(pair) = item.parse(&format!("permissions[{}]", i), &mut errors) {
                if !pairs.contains(&pair) {
                    pairs.push(pair);
                }
            }
        }
        errors.into_result()?;
        Ok(pairs)
    }
}

// Permisos de un usuario: explícitos y efectivos
#[derive(Debug, Serialize)]
pub struct UserPermissionsResponse {
    pub user: UserResponse,
    pub grants: Vec<PermissionGrant>,
    pub effective: BTreeMap<ModuleName, Vec<PermissionType>>,
}

// Catálogo de permisos por módulo
#[derive(Debug, Serialize)]
pub struct ModulePermissionResponse {
    pub id: Uuid,
    pub module_name: ModuleName,
    pub module_name_ar: &'static str,
    pub permission_type: PermissionType,
    pub permission_type_ar: &'static str,
    pub description: String,
}

impl From<ModulePermission> for ModulePermissionResponse {
    fn from(permission: ModulePermission) -> Self {
        Self {
            id: permission.id,
            module_name: permission.module_name,
            module_name_ar: permission.module_name.label_ar(),
            permission_type: permission.permission_type,
            permission_type_ar: permission.permission_type.label_ar(),
            description: permission.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_user_validation() {
        let req: CreateUserRequest = serde_json::from_value(json!({
            "username": "bad name!",
            "email": "not-an-email",
            "password": "1234",
            "user_type": "normal"
        }))
        .unwrap();
        assert!(req.is_active);
        match req.check() {
            Err(AppError::Fields(fields)) => {
                assert!(fields.contains("username"));
                assert!(fields.contains("email"));
                assert!(fields.contains("password"));
            }
            _ => panic!("expected field errors"),
        }
    }

    #[test]
    fn test_update_allows_empty_password() {
        let req = UpdateUserRequest {
            password: Some(String::new()),
            ..Default::default()
        };
        assert!(req.check().is_ok());
    }

    #[test]
    fn test_permission_pairs() {
        let req: SetPermissionsRequest = serde_json::from_value(json!({
            "permissions": [
                {"module_name": "cars", "permission_type": "read"},
                {"module_name": "cars", "permission_type": "read"},
                {"module_name": "equipment", "permission_type": "update"}
            ]
        }))
        .unwrap();
        assert_eq!(
            req.pairs().unwrap(),
            vec![
                (ModuleName::Cars, PermissionType::Read),
                (ModuleName::Equipment, PermissionType::Update)
            ]
        );

        let bad: SetPermissionsRequest = serde_json::from_value(json!({
            "permissions": [{"module_name": "rockets", "permission_type": "launch"}]
        }))
        .unwrap();
        assert!(bad.pairs().is_err());
    }
}
