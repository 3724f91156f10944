use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use crate::models::permission::{default_description, ModuleName, ModulePermission, PermissionGrant, PermissionType};
use crate::utils::errors::{AppError, AppResult};

/// Conjunto exacto que queda tras un reemplazo: pares sin repetir, todos concedidos
pub fn replacement_grants(pairs: &[(ModuleName, PermissionType)]) -> Vec<PermissionGrant> {
    pairs
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|(module, permission)| PermissionGrant::new(module, permission, true))
        .collect()
}

/// Id del par en el catálogo; lo crea si falta
async fn module_permission_id(
    conn: &mut PgConnection,
    module: ModuleName,
    permission: PermissionType,
) -> AppResult<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO module_permissions (id, module_name, permission_type, description, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (module_name, permission_type) DO UPDATE SET module_name = EXCLUDED.module_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(module)
    .bind(permission)
    .bind(default_description(module, permission))
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    Ok(id)
}

pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserta los 12 pares módulo/permiso que falten; devuelve cuántos se crearon
    pub async fn create_default_permissions(&self) -> AppResult<u64> {
        let mut created = 0;
        for module in ModuleName::ALL {
            for permission in PermissionType::ALL {
                let result = sqlx::query(
                    r#"
                    INSERT INTO module_permissions (id, module_name, permission_type, description, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (module_name, permission_type) DO NOTHING
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(module)
                .bind(permission)
                .bind(default_description(module, permission))
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;
                created += result.rows_affected();
            }
        }

        if created > 0 {
            info!("🔐 {} permisos de módulo creados", created);
        }
        Ok(created)
    }

    pub async fn list_module_permissions(&self) -> AppResult<Vec<ModulePermission>> {
        let permissions = sqlx::query_as::<_, ModulePermission>(
            "SELECT * FROM module_permissions ORDER BY module_name, permission_type",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    pub async fn grants_for_user(&self, user_id: Uuid) -> AppResult<Vec<PermissionGrant>> {
        let grants = sqlx::query_as::<_, PermissionGrant>(
            r#"
            SELECT mp.module_name, mp.permission_type, up.granted
            FROM user_permissions up
            JOIN module_permissions mp ON mp.id = up.module_permission_id
            WHERE up.user_id = $1
            ORDER BY mp.module_name, mp.permission_type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }

    /// Sustituye el conjunto completo: los pares recibidos quedan concedidos, el resto se elimina
    pub async fn replace_user_permissions(
        &self,
        user_id: Uuid,
        pairs: &[(ModuleName, PermissionType)],
    ) -> AppResult<Vec<PermissionGrant>> {
        let expected = replacement_grants(pairs);
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_permissions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        for grant in &expected {
            let permission_id = module_permission_id(&mut *tx, grant.module_name, grant.permission_type).await?;
            let result = sqlx::query(
                r#"
                INSERT INTO user_permissions (id, user_id, module_permission_id, granted, created_at, updated_at)
                VALUES ($1, $2, $3, TRUE, $4, $4)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(permission_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() != 1 {
                error!(
                    "❌ Permiso {}.{} no insertado para {}",
                    grant.module_name.as_str(),
                    grant.permission_type.as_str(),
                    user_id
                );
                return Err(AppError::Internal(format!(
                    "permission {}.{} was not stored",
                    grant.module_name.as_str(),
                    grant.permission_type.as_str()
                )));
            }
        }

        tx.commit().await?;

        let stored = self.grants_for_user(user_id).await?;
        if stored != expected {
            return Err(AppError::Internal(format!(
                "stored {} permissions, expected {}",
                stored.len(),
                expected.len()
            )));
        }
        Ok(stored)
    }

    /// Concede o revoca un solo par (upsert del flag granted)
    pub async fn set_grant(
        &self,
        user_id: Uuid,
        module: ModuleName,
        permission: PermissionType,
        granted: bool,
    ) -> AppResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let permission_id = module_permission_id(&mut *conn, module, permission).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO user_permissions (id, user_id, module_permission_id, granted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (user_id, module_permission_id) DO UPDATE
            SET granted = EXCLUDED.granted, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(permission_id)
        .bind(granted)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_is_exact_distinct_set() {
        let pairs = [
            (ModuleName::Equipment, PermissionType::Delete),
            (ModuleName::Cars, PermissionType::Read),
            (ModuleName::Cars, PermissionType::Read),
        ];
        let grants = replacement_grants(&pairs);

        assert_eq!(
            grants,
            vec![
                PermissionGrant::new(ModuleName::Cars, PermissionType::Read, true),
                PermissionGrant::new(ModuleName::Equipment, PermissionType::Delete, true),
            ]
        );
    }

    #[test]
    fn test_replacement_drops_previous_grants() {
        let previous = [PermissionGrant::new(ModuleName::Cars, PermissionType::Update, true)];
        let grants = replacement_grants(&[(ModuleName::Cars, PermissionType::Read)]);

        assert!(previous.iter().all(|old| !grants.contains(old)));
        assert!(grants.iter().all(|g| g.granted));
        assert!(replacement_grants(&[]).is_empty());
    }
}
