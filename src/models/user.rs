//! Modelo de usuario y perfil RBAC
//!
//! La tabla users guarda las credenciales; user_profiles asigna el tipo de
//! usuario. Un usuario sin perfil se resuelve con las reglas heredadas
//! (superusuario o grupo "Admin").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Grupo heredado que equivale a administrador
pub const LEGACY_ADMIN_GROUP: &str = "Admin";

/// Tipo de usuario - mapea al ENUM user_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    SuperAdmin,
    Admin,
    Normal,
}

impl UserType {
    pub const ALL: [UserType; 3] = [UserType::SuperAdmin, UserType::Admin, UserType::Normal];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::SuperAdmin => "super_admin",
            UserType::Admin => "admin",
            UserType::Normal => "normal",
        }
    }

    pub fn label_ar(&self) -> &'static str {
        match self {
            UserType::SuperAdmin => "مدير عام",
            UserType::Admin => "مدير",
            UserType::Normal => "مستخدم عادي",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    pub fn is_admin_level(&self) -> bool {
        matches!(self, UserType::SuperAdmin | UserType::Admin)
    }
}

/// Fila de la tabla users
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub groups: Vec<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn in_legacy_admin_group(&self) -> bool {
        self.groups.iter().any(|g| g == LEGACY_ADMIN_GROUP)
    }
}

/// Fila de la tabla user_profiles
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub user_type: UserType,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Usuario con su perfil opcional (LEFT JOIN)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserWithProfile {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub user_type: Option<UserType>,
    pub profile_is_active: Option<bool>,
    pub created_by: Option<Uuid>,
}

impl UserWithProfile {
    pub fn profile(&self) -> Option<UserProfile> {
        self.user_type.map(|user_type| UserProfile {
            user_id: self.user.id,
            user_type,
            is_active: self.profile_is_active.unwrap_or(true),
            created_by: self.created_by,
            created_at: self.user.created_at,
            updated_at: self.user.updated_at,
        })
    }
}
