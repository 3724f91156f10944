use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::maintenance::{MaintenanceFields, MaintenanceRecord, MaintenanceTarget};
use crate::utils::errors::AppResult;

pub struct MaintenanceRepository {
    pool: PgPool,
}

impl MaintenanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Historial de un activo, el más reciente primero
    pub async fn list_for(&self, target: MaintenanceTarget) -> AppResult<Vec<MaintenanceRecord>> {
        let (car_id, equipment_id) = target.columns();
        let records = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            SELECT * FROM maintenance_records
            WHERE car_id IS NOT DISTINCT FROM $1 AND equipment_id IS NOT DISTINCT FROM $2
            ORDER BY maintenance_date DESC NULLS LAST, created_at DESC
            "#,
        )
        .bind(car_id)
        .bind(equipment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<MaintenanceRecord>> {
        let record = sqlx::query_as::<_, MaintenanceRecord>("SELECT * FROM maintenance_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    pub async fn create(&self, target: MaintenanceTarget, fields: &MaintenanceFields) -> AppResult<MaintenanceRecord> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut conn, target, fields).await
    }

    /// Inserta un registro usando la conexión (o transacción) del llamador
    pub async fn insert(
        conn: &mut PgConnection,
        target: MaintenanceTarget,
        fields: &MaintenanceFields,
    ) -> AppResult<MaintenanceRecord> {
        let (car_id, equipment_id) = target.columns();
        let now = Utc::now();
        let record = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            INSERT INTO maintenance_records
                (id, car_id, equipment_id, maintenance_date, restoration_date, cost, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(car_id)
        .bind(equipment_id)
        .bind(fields.maintenance_date)
        .bind(fields.restoration_date)
        .bind(fields.cost)
        .bind(fields.description.as_deref())
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record)
    }

    pub async fn update(&self, id: Uuid, fields: &MaintenanceFields) -> AppResult<Option<MaintenanceRecord>> {
        let record = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            UPDATE maintenance_records
            SET maintenance_date = $2, restoration_date = $3, cost = $4, description = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.maintenance_date)
        .bind(fields.restoration_date)
        .bind(fields.cost)
        .bind(fields.description.as_deref())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM maintenance_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Elimina los registros indicados que pertenezcan al activo; ignora ids ajenos
    pub async fn delete_for(conn: &mut PgConnection, target: MaintenanceTarget, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let (car_id, equipment_id) = target.columns();
        let result = sqlx::query(
            r#"
            DELETE FROM maintenance_records
            WHERE id = ANY($1)
              AND car_id IS NOT DISTINCT FROM $2 AND equipment_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(ids)
        .bind(car_id)
        .bind(equipment_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}
