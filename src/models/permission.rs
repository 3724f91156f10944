//! Modelos de permisos por módulo

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Módulo protegido - mapea al ENUM module_name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[sqlx(type_name = "module_name", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModuleName {
    Cars,
    Equipment,
    GenericTables,
}

impl ModuleName {
    pub const ALL: [ModuleName; 3] = [ModuleName::Cars, ModuleName::Equipment, ModuleName::GenericTables];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleName::Cars => "cars",
            ModuleName::Equipment => "equipment",
            ModuleName::GenericTables => "generic_tables",
        }
    }

    pub fn label_ar(&self) -> &'static str {
        match self {
            ModuleName::Cars => "السيارات",
            ModuleName::Equipment => "المعدات",
            ModuleName::GenericTables => "الجداول العامة",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tipo de permiso CRUD - mapea al ENUM permission_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[sqlx(type_name = "permission_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PermissionType {
    Create,
    Read,
    Update,
    Delete,
}

impl PermissionType {
    pub const ALL: [PermissionType; 4] = [
        PermissionType::Create,
        PermissionType::Read,
        PermissionType::Update,
        PermissionType::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionType::Create => "create",
            PermissionType::Read => "read",
            PermissionType::Update => "update",
            PermissionType::Delete => "delete",
        }
    }

    pub fn label_ar(&self) -> &'static str {
        match self {
            PermissionType::Create => "إنشاء",
            PermissionType::Read => "عرض",
            PermissionType::Update => "تعديل",
            PermissionType::Delete => "حذف",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fila de module_permissions
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ModulePermission {
    pub id: Uuid,
    pub module_name: ModuleName,
    pub permission_type: PermissionType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Permiso explícito de un usuario (join de user_permissions con module_permissions)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct PermissionGrant {
    pub module_name: ModuleName,
    pub permission_type: PermissionType,
    pub granted: bool,
}

impl PermissionGrant {
    pub fn new(module_name: ModuleName, permission_type: PermissionType, granted: bool) -> Self {
        Self {
            module_name,
            permission_type,
            granted,
        }
    }
}

/// Descripción por defecto de cada par módulo/permiso
pub fn default_description(module: ModuleName, permission: PermissionType) -> String {
    format!("{} {}", permission.label_ar(), module.label_ar())
}
