use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::permission::{ModuleName, PermissionType};
use crate::models::user::{User, UserType};
use crate::services::rbac::AccessContext;

// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: CurrentUserResponse,
}

impl LoginResponse {
    pub fn bearer(token: String, expires_in: u64, user: CurrentUserResponse) -> Self {
        Self {
            token,
            token_type: "Bearer",
            expires_in,
            user,
        }
    }
}

// Usuario autenticado con su resumen de permisos
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub user_type: UserType,
    pub user_type_ar: &'static str,
    pub is_superuser: bool,
    pub is_admin: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub permissions: BTreeMap<ModuleName, Vec<PermissionType>>,
}

impl CurrentUserResponse {
    pub fn new(user: &User, access: &AccessContext) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name(),
            user_type: access.user_type,
            user_type_ar: access.user_type.label_ar(),
            is_superuser: user.is_superuser,
            is_admin: access.is_admin(),
            last_login: user.last_login,
            permissions: access.summary(),
        }
    }
}
