//! Registros de auditoría (solo inserción)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::models::user::UserType;

/// Tipo de acción registrada - mapea al ENUM action_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "action_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Read,
    Update,
    Delete,
    Login,
    Logout,
    PermissionChange,
    Restore,
}

impl ActionType {
    pub const ALL: [ActionType; 8] = [
        ActionType::Create,
        ActionType::Read,
        ActionType::Update,
        ActionType::Delete,
        ActionType::Login,
        ActionType::Logout,
        ActionType::PermissionChange,
        ActionType::Restore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Create => "create",
            ActionType::Read => "read",
            ActionType::Update => "update",
            ActionType::Delete => "delete",
            ActionType::Login => "login",
            ActionType::Logout => "logout",
            ActionType::PermissionChange => "permission_change",
            ActionType::Restore => "restore",
        }
    }

    pub fn label_ar(&self) -> &'static str {
        match self {
            ActionType::Create => "إنشاء",
            ActionType::Read => "عرض",
            ActionType::Update => "تحديث",
            ActionType::Delete => "حذف",
            ActionType::Login => "تسجيل دخول",
            ActionType::Logout => "تسجيل خروج",
            ActionType::PermissionChange => "تغيير الصلاحيات",
            ActionType::Restore => "استعادة",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == value)
    }
}

/// Fila de login_logs con datos del usuario
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LoginLogEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub username: String,
    pub full_name: Option<String>,
    pub user_type: Option<UserType>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub login_time: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
}

/// Fila de action_logs con datos del usuario
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActionLogEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub user_type: Option<UserType>,
    pub action_type: ActionType,
    pub module_name: String,
    pub object_id: Option<String>,
    pub description: String,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Acción a registrar
#[derive(Debug, Clone)]
pub struct NewAction {
    pub user_id: Option<Uuid>,
    pub action_type: ActionType,
    pub module_name: String,
    pub object_id: Option<String>,
    pub description: String,
    pub ip_address: Option<String>,
}
