//! Registros de licencia, inspección y extintor de un activo
//!
//! El formulario envía siempre el conjunto completo, así que guardar
//! significa reemplazar todas las filas del activo.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::asset_dto::{DateRangeInput, FireExtinguisherInput};
use crate::models::asset::{AssetRef, DateRangeRecord, FireExtinguisherRecord, RecordTable};
use crate::utils::errors::AppResult;

/// Recuento de filas dependientes (pantalla de confirmación de borrado)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct RecordCounts {
    pub license_records: i64,
    pub inspection_records: i64,
    pub maintenance_records: i64,
    pub attachments: i64,
}

pub struct RecordRepository {
    pool: PgPool,
}

impl RecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, table: RecordTable, owner: AssetRef) -> AppResult<Vec<DateRangeRecord>> {
        let (car_id, equipment_id) = owner.columns();
        let records = sqlx::query_as::<_, DateRangeRecord>(&format!(
            r#"
            SELECT id, start_date, end_date, created_at FROM {}
            WHERE car_id IS NOT DISTINCT FROM $1 AND equipment_id IS NOT DISTINCT FROM $2
            ORDER BY start_date DESC, created_at DESC
            "#,
            table.table()
        ))
        .bind(car_id)
        .bind(equipment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn list_fire_extinguisher(&self, equipment_id: Uuid) -> AppResult<Vec<FireExtinguisherRecord>> {
        let records = sqlx::query_as::<_, FireExtinguisherRecord>(
            r#"
            SELECT id, inspection_date, expiry_date, created_at FROM fire_extinguisher_records
            WHERE equipment_id = $1
            ORDER BY inspection_date DESC, created_at DESC
            "#,
        )
        .bind(equipment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn counts(&self, owner: AssetRef) -> AppResult<RecordCounts> {
        let (car_id, equipment_id) = owner.columns();
        let counts = sqlx::query_as::<_, RecordCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM license_records
                 WHERE car_id IS NOT DISTINCT FROM $1 AND equipment_id IS NOT DISTINCT FROM $2) AS license_records,
                (SELECT COUNT(*) FROM inspection_records
                 WHERE car_id IS NOT DISTINCT FROM $1 AND equipment_id IS NOT DISTINCT FROM $2) AS inspection_records,
                (SELECT COUNT(*) FROM maintenance_records
                 WHERE car_id IS NOT DISTINCT FROM $1 AND equipment_id IS NOT DISTINCT FROM $2) AS maintenance_records,
                (SELECT COUNT(*) FROM attachments
                 WHERE car_id IS NOT DISTINCT FROM $1 AND equipment_id IS NOT DISTINCT FROM $2) AS attachments
            "#,
        )
        .bind(car_id)
        .bind(equipment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Reemplaza los registros de licencia o inspección del activo
    pub async fn replace(
        conn: &mut PgConnection,
        table: RecordTable,
        owner: AssetRef,
        records: &[DateRangeInput],
    ) -> AppResult<()> {
        let (car_id, equipment_id) = owner.columns();
        sqlx::query(&format!(
            "DELETE FROM {} WHERE car_id IS NOT DISTINCT FROM $1 AND equipment_id IS NOT DISTINCT FROM $2",
            table.table()
        ))
        .bind(car_id)
        .bind(equipment_id)
        .execute(&mut *conn)
        .await?;

        let now = Utc::now();
        for record in records {
            sqlx::query(&format!(
                r#"
                INSERT INTO {} (id, car_id, equipment_id, start_date, end_date, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
                table.table()
            ))
            .bind(Uuid::new_v4())
            .bind(car_id)
            .bind(equipment_id)
            .bind(record.start_date)
            .bind(record.end_date)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn replace_fire_extinguisher(
        conn: &mut PgConnection,
        equipment_id: Uuid,
        records: &[FireExtinguisherInput],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM fire_extinguisher_records WHERE equipment_id = $1")
            .bind(equipment_id)
            .execute(&mut *conn)
            .await?;

        let now = Utc::now();
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO fire_extinguisher_records (id, equipment_id, inspection_date, expiry_date, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(equipment_id)
            .bind(record.inspection_date)
            .bind(record.expiry_date)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}
