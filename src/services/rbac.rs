//! Resolución de permisos (RBAC)
//!
//! Reglas:
//! - usuario o perfil inactivo: ningún permiso
//! - el tipo del perfil manda; sin perfil, superusuario → super_admin y
//!   grupo heredado "Admin" → admin
//! - super_admin y admin: todos los permisos
//! - normal: solo los pares módulo/permiso concedidos explícitamente

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::permission::{ModuleName, PermissionGrant, PermissionType};
use crate::models::user::{User, UserProfile, UserType};
use crate::utils::errors::{forbidden_error, AppError, AppResult};
use crate::utils::translations::{self, Localized};

/// Tipo efectivo de un usuario, con la regla heredada cuando no hay perfil
pub fn effective_user_type(user: &User, profile: Option<&UserProfile>) -> UserType {
    match profile {
        Some(profile) => profile.user_type,
        None if user.is_superuser => UserType::SuperAdmin,
        None if user.in_legacy_admin_group() => UserType::Admin,
        None => UserType::Normal,
    }
}

/// `effective_user_type` en SQL, sobre los alias `u` (users) y `p` (user_profiles)
pub const EFFECTIVE_USER_TYPE_SQL: &str = "CASE WHEN u.id IS NULL THEN NULL \
     WHEN p.user_type IS NOT NULL THEN p.user_type::text \
     WHEN u.is_superuser THEN 'super_admin' \
     WHEN 'Admin' = ANY(u.groups) THEN 'admin' \
     ELSE 'normal' END";

/// Condición ` AND <tipo efectivo> = $n`
pub fn push_user_type_condition(builder: &mut QueryBuilder<'_, Postgres>, user_type: UserType) {
    builder.push(" AND (");
    builder.push(EFFECTIVE_USER_TYPE_SQL);
    builder.push(") = ");
    builder.push_bind(user_type.as_str());
}

/// Contexto de acceso de un usuario autenticado
#[derive(Debug, Clone, Serialize)]
pub struct AccessContext {
    pub user_id: Uuid,
    pub username: String,
    pub user_type: UserType,
    pub is_active: bool,
    #[serde(skip)]
    grants: Vec<PermissionGrant>,
}

impl AccessContext {
    pub fn new(user: &User, profile: Option<&UserProfile>, grants: Vec<PermissionGrant>) -> Self {
        let is_active = user.is_active && profile.map_or(true, |p| p.is_active);
        Self {
            user_id: user.id,
            username: user.username.clone(),
            user_type: effective_user_type(user, profile),
            is_active,
            grants,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.is_active && self.user_type == UserType::SuperAdmin
    }

    pub fn is_admin(&self) -> bool {
        self.is_active && self.user_type.is_admin_level()
    }

    pub fn has_permission(&self, module: ModuleName, permission: PermissionType) -> bool {
        if !self.is_active {
            return false;
        }
        if self.user_type.is_admin_level() {
            return true;
        }
        self.grants
            .iter()
            .find(|g| g.module_name == module && g.permission_type == permission)
            .map_or(false, |g| g.granted)
    }

    pub fn require(&self, module: ModuleName, permission: PermissionType) -> AppResult<()> {
        if self.has_permission(module, permission) {
            Ok(())
        } else {
            Err(forbidden_error())
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(translations::admin_required()))
        }
    }

    /// Permisos efectivos agrupados por módulo
    pub fn summary(&self) -> BTreeMap<ModuleName, Vec<PermissionType>> {
        let mut out = BTreeMap::new();
        for module in ModuleName::ALL {
            let granted: Vec<PermissionType> = PermissionType::ALL
                .into_iter()
                .filter(|p| self.has_permission(module, *p))
                .collect();
            if !granted.is_empty() {
                out.insert(module, granted);
            }
        }
        out
    }
}

/// ¿Puede `actor` crear, editar, desactivar o restaurar un usuario de tipo `target`?
pub fn can_manage_user_type(actor: UserType, target: UserType) -> bool {
    match actor {
        UserType::SuperAdmin => true,
        UserType::Admin => target == UserType::Normal,
        UserType::Normal => false,
    }
}

/// Tipos de usuario que `actor` puede crear
pub fn creatable_user_types(actor: UserType) -> Vec<UserType> {
    UserType::ALL
        .into_iter()
        .filter(|t| can_manage_user_type(actor, *t))
        .collect()
}

/// Solo un admin/super_admin asigna permisos, y solo a usuarios normales
pub fn check_permission_assignment(assigner: UserType, target: UserType) -> Result<(), Localized> {
    if !assigner.is_admin_level() {
        return Err(Localized::new(
            "Only administrators can assign permissions",
            "فقط المدير يمكنه تعيين الصلاحيات",
        ));
    }
    if target != UserType::Normal {
        return Err(Localized::new(
            "Permissions can only be assigned to normal users",
            "يمكن تعيين الصلاحيات للمستخدمين العاديين فقط",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(is_superuser: bool, groups: &[&str]) -> User {
        User {
            id: Uuid::new_v4(),
            username: "someone".to_string(),
            email: "someone@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            is_superuser,
            is_active: true,
            groups: groups.iter().map(|g| g.to_string()).collect(),
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn profile(user: &User, user_type: UserType) -> UserProfile {
        UserProfile {
            user_id: user.id,
            user_type,
            is_active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_super_admin_and_admin_have_everything() {
        let u = user(false, &[]);
        for user_type in [UserType::SuperAdmin, UserType::Admin] {
            let ctx = AccessContext::new(&u, Some(&profile(&u, user_type)), vec![]);
            for module in ModuleName::ALL {
                for permission in PermissionType::ALL {
                    assert!(ctx.has_permission(module, permission));
                }
            }
        }
    }

    #[test]
    fn test_normal_user_uses_explicit_grants() {
        let u = user(false, &[]);
        let grants = vec![
            PermissionGrant::new(ModuleName::Cars, PermissionType::Read, true),
            PermissionGrant::new(ModuleName::Cars, PermissionType::Delete, false),
        ];
        let ctx = AccessContext::new(&u, Some(&profile(&u, UserType::Normal)), grants);

        assert!(ctx.has_permission(ModuleName::Cars, PermissionType::Read));
        assert!(!ctx.has_permission(ModuleName::Cars, PermissionType::Delete));
        assert!(!ctx.has_permission(ModuleName::Equipment, PermissionType::Read));
        assert!(ctx.require(ModuleName::Cars, PermissionType::Update).is_err());
        assert!(ctx.require_admin().is_err());
    }

    #[test]
    fn test_legacy_fallback_without_profile() {
        let superuser = user(true, &[]);
        assert_eq!(effective_user_type(&superuser, None), UserType::SuperAdmin);

        let group_admin = user(false, &["Admin"]);
        let ctx = AccessContext::new(&group_admin, None, vec![]);
        assert!(ctx.is_admin());
        assert!(ctx.has_permission(ModuleName::GenericTables, PermissionType::Delete));

        let plain = user(false, &["Staff"]);
        let ctx = AccessContext::new(&plain, None, vec![]);
        assert!(!ctx.has_permission(ModuleName::Cars, PermissionType::Read));
    }

    #[test]
    fn test_profile_wins_over_legacy_group() {
        let u = user(false, &["Admin"]);
        assert_eq!(effective_user_type(&u, Some(&profile(&u, UserType::Normal))), UserType::Normal);
    }

    #[test]
    fn test_demoted_superuser_follows_profile() {
        let u = user(true, &[]);
        let ctx = AccessContext::new(&u, Some(&profile(&u, UserType::Normal)), vec![]);

        assert_eq!(ctx.user_type, UserType::Normal);
        assert!(!ctx.is_admin());
        assert!(!ctx.has_permission(ModuleName::Cars, PermissionType::Delete));

        let ctx = AccessContext::new(&u, Some(&profile(&u, UserType::Admin)), vec![]);
        assert_eq!(ctx.user_type, UserType::Admin);
        assert!(!ctx.is_super_admin());
    }

    #[test]
    fn test_user_type_condition_uses_legacy_fallback() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_user_type_condition(&mut builder, UserType::Admin);
        let sql = builder.sql();
        assert!(sql.starts_with("SELECT 1 WHERE TRUE AND (CASE WHEN u.id IS NULL THEN NULL"));
        assert!(sql.contains("WHEN u.is_superuser THEN 'super_admin'"));
        assert!(sql.contains("WHEN 'Admin' = ANY(u.groups) THEN 'admin'"));
        assert!(sql.ends_with("ELSE 'normal' END) = $1"));
    }

    #[test]
    fn test_inactive_users_have_nothing() {
        let mut u = user(true, &[]);
        u.is_active = false;
        let ctx = AccessContext::new(&u, None, vec![]);
        assert!(!ctx.has_permission(ModuleName::Cars, PermissionType::Read));
        assert!(!ctx.is_admin());

        let u = user(false, &[]);
        let mut p = profile(&u, UserType::Admin);
        p.is_active = false;
        let ctx = AccessContext::new(&u, Some(&p), vec![]);
        assert!(!ctx.has_permission(ModuleName::Cars, PermissionType::Read));
    }

    #[test]
    fn test_summary_groups_by_module() {
        let u = user(false, &[]);
        let grants = vec![
            PermissionGrant::new(ModuleName::Equipment, PermissionType::Read, true),
            PermissionGrant::new(ModuleName::Equipment, PermissionType::Create, true),
        ];
        let ctx = AccessContext::new(&u, Some(&profile(&u, UserType::Normal)), grants);
        let summary = ctx.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(
            summary[&ModuleName::Equipment],
            vec![PermissionType::Create, PermissionType::Read]
        );

        let admin = AccessContext::new(&u, Some(&profile(&u, UserType::Admin)), vec![]);
        assert_eq!(admin.summary().len(), 3);
    }

    #[test]
    fn test_user_management_rules() {
        assert_eq!(creatable_user_types(UserType::SuperAdmin).len(), 3);
        assert_eq!(creatable_user_types(UserType::Admin), vec![UserType::Normal]);
        assert!(creatable_user_types(UserType::Normal).is_empty());
        assert!(!can_manage_user_type(UserType::Admin, UserType::Admin));

        assert!(check_permission_assignment(UserType::Admin, UserType::Normal).is_ok());
        assert!(check_permission_assignment(UserType::SuperAdmin, UserType::Admin).is_err());
        assert!(check_permission_assignment(UserType::Normal, UserType::Normal).is_err());
    }
}
