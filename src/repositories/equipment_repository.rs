use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::dto::equipment_dto::EquipmentRequest;
use crate::models::asset::{AssetRef, AssetStatus, RecordTable};
use crate::models::equipment::{Equipment, EquipmentListItem};
use crate::models::maintenance::MaintenanceFields;
use crate::repositories::maintenance_repository::MaintenanceRepository;
use crate::repositories::record_repository::RecordRepository;
use crate::services::expiry::{ExpiryFilter, DASHBOARD_LIMIT};
use crate::services::query::{self, ListQuery, ListSpec, Page, Pagination, SearchField, SortOrder};
use crate::utils::errors::AppResult;

pub const EQUIPMENT_LIST_SPEC: ListSpec = ListSpec {
    search_fields: &[
        SearchField { key: "door_no", columns: &["e.door_no"] },
        SearchField { key: "plate_no", columns: &["e.plate_no"] },
        SearchField { key: "manufacturer", columns: &["m.name_en", "m.name_ar"] },
    ],
    default_search_field: "door_no",
    sort_fields: &[
        ("door_no", "e.door_no"),
        ("plate_no", "e.plate_no"),
        ("manufacture_year", "e.manufacture_year"),
        ("manufacturer", "m.name_ar"),
        ("status", "e.status"),
        ("latest_maintenance_date", "mt.maintenance_date"),
        ("inspection_end_date", "ins.end_date"),
        ("license_end_date", "lic.end_date"),
        ("fire_extinguisher_expiry_date", "fe.expiry_date"),
        ("created_at", "e.created_at"),
        ("updated_at", "e.updated_at"),
    ],
    default_sort: ("created_at", SortOrder::Desc),
    tiebreak: "e.id",
};

const EQUIPMENT_FROM: &str = r#"
    FROM equipment e
    LEFT JOIN manufacturers m ON m.id = e.manufacturer_id
    LEFT JOIN LATERAL (
        SELECT maintenance_date, cost FROM maintenance_records
        WHERE equipment_id = e.id
        ORDER BY maintenance_date DESC NULLS LAST, created_at DESC
        LIMIT 1
    ) mt ON TRUE
    LEFT JOIN LATERAL (
        SELECT end_date FROM inspection_records
        WHERE equipment_id = e.id
        ORDER BY start_date DESC, created_at DESC
        LIMIT 1
    ) ins ON TRUE
    LEFT JOIN LATERAL (
        SELECT end_date FROM license_records
        WHERE equipment_id = e.id
        ORDER BY start_date DESC, created_at DESC
        LIMIT 1
    ) lic ON TRUE
    LEFT JOIN LATERAL (
        SELECT expiry_date FROM fire_extinguisher_records
        WHERE equipment_id = e.id
        ORDER BY inspection_date DESC, created_at DESC
        LIMIT 1
    ) fe ON TRUE
"#;

const EQUIPMENT_LIST_COLUMNS: &str = r#"
    SELECT e.*,
           m.name_en AS manufacturer_name_en,
           m.name_ar AS manufacturer_name_ar,
           mt.maintenance_date AS latest_maintenance_date,
           mt.cost AS latest_maintenance_cost,
           ins.end_date AS inspection_end_date,
           lic.end_date AS license_end_date,
           fe.expiry_date AS fire_extinguisher_expiry_date
"#;

fn push_deleted(builder: &mut QueryBuilder<'_, Postgres>, deleted_only: bool) {
    if deleted_only {
        builder.push(" WHERE e.deleted_at IS NOT NULL");
    } else {
        builder.push(" WHERE e.deleted_at IS NULL");
    }
}

pub struct EquipmentRepository {
    pool: PgPool,
}

impl EquipmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &ListQuery, deleted_only: bool) -> AppResult<Page<EquipmentListItem>> {
        let search = EQUIPMENT_LIST_SPEC.resolve_search(query)?;
        let sort = EQUIPMENT_LIST_SPEC.resolve_sort(query);

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM equipment e LEFT JOIN manufacturers m ON m.id = e.manufacturer_id",
        );
        push_deleted(&mut count, deleted_only);
        if let Some(search) = &search {
            query::push_search(&mut count, search);
        }
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let pagination = Pagination::resolve(
            query::parse_page(query.page.as_deref()),
            query::parse_per_page(query.per_page.as_deref(), query::DEFAULT_PAGE_SIZE),
            total,
        );

        let mut builder = QueryBuilder::<Postgres>::new(EQUIPMENT_LIST_COLUMNS);
        builder.push(EQUIPMENT_FROM);
        push_deleted(&mut builder, deleted_only);
        if let Some(search) = &search {
            query::push_search(&mut builder, search);
        }
        query::push_order(&mut builder, sort, EQUIPMENT_LIST_SPEC.tiebreak);
        query::push_limit(&mut builder, &pagination);

        debug!("🔍 Listado de equipos: {}", builder.sql());
        let items = builder
            .build_query_as::<EquipmentListItem>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, pagination })
    }

    pub async fn expiring(&self, filter: &ExpiryFilter) -> AppResult<Vec<EquipmentListItem>> {
        let mut builder = QueryBuilder::<Postgres>::new(EQUIPMENT_LIST_COLUMNS);
        builder.push(EQUIPMENT_FROM);
        push_deleted(&mut builder, false);
        filter.push_condition(&mut builder, true);
        builder.push(" ORDER BY ins.end_date ASC NULLS FIRST, e.id LIMIT ");
        builder.push_bind(DASHBOARD_LIMIT);

        let items = builder
            .build_query_as::<EquipmentListItem>()
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Equipment>> {
        let equipment = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(equipment)
    }

    pub async fn create(&self, request: &EquipmentRequest, maintenance: &[MaintenanceFields]) -> AppResult<Equipment> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let equipment = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (
                id, door_no, plate_no, manufacture_year, manufacturer_id, equipment_model_id,
                location_id, sector_id, department_id, division_id, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.door_no.trim())
        .bind(request.plate_no.trim())
        .bind(request.manufacture_year)
        .bind(request.manufacturer_id)
        .bind(request.equipment_model_id)
        .bind(request.location_id)
        .bind(request.sector_id)
        .bind(request.department_id)
        .bind(request.division_id)
        .bind(request.status)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let owner = AssetRef::Equipment(id);
        RecordRepository::replace(&mut tx, RecordTable::License, owner, &request.license_records).await?;
        RecordRepository::replace(&mut tx, RecordTable::Inspection, owner, &request.inspection_records).await?;
        RecordRepository::replace_fire_extinguisher(&mut tx, id, &request.fire_extinguisher_records).await?;

        if request.status == AssetStatus::UnderMaintenance {
            for fields in maintenance {
                MaintenanceRepository::insert(&mut tx, owner, fields).await?;
            }
        }

        tx.commit().await?;
        Ok(equipment)
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: &EquipmentRequest,
        maintenance: &[MaintenanceFields],
    ) -> AppResult<Option<Equipment>> {
        let mut tx = self.pool.begin().await?;

        let equipment = sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment SET
                door_no = $2, plate_no = $3, manufacture_year = $4, manufacturer_id = $5,
                equipment_model_id = $6, location_id = $7, sector_id = $8, department_id = $9,
                division_id = $10, status = $11, updated_at = $12
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.door_no.trim())
        .bind(request.plate_no.trim())
        .bind(request.manufacture_year)
        .bind(request.manufacturer_id)
        .bind(request.equipment_model_id)
        .bind(request.location_id)
        .bind(request.sector_id)
        .bind(request.department_id)
        .bind(request.division_id)
        .bind(request.status)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let equipment = match equipment {
            Some(equipment) => equipment,
            None => return Ok(None),
        };

        let owner = AssetRef::Equipment(id);
        RecordRepository::replace(&mut tx, RecordTable::License, owner, &request.license_records).await?;
        RecordRepository::replace(&mut tx, RecordTable::Inspection, owner, &request.inspection_records).await?;
        RecordRepository::replace_fire_extinguisher(&mut tx, id, &request.fire_extinguisher_records).await?;
        MaintenanceRepository::delete_for(&mut tx, owner, &request.delete_maintenance_ids).await?;
        for fields in maintenance {
            MaintenanceRepository::insert(&mut tx, owner, fields).await?;
        }

        tx.commit().await?;
        Ok(Some(equipment))
    }

    pub async fn soft_delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE equipment SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn restore(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE equipment SET deleted_at = NULL, updated_at = $2 WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn purge(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1 AND deleted_at IS NOT NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::expiry::ExpiryStatus;
    use chrono::NaiveDate;

    #[test]
    fn test_trash_listing_filter() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM equipment e");
        push_deleted(&mut builder, true);
        assert_eq!(builder.sql(), "SELECT 1 FROM equipment e WHERE e.deleted_at IS NOT NULL");
    }

    #[test]
    fn test_about_to_expire_includes_fire_extinguisher() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let filter = ExpiryFilter::new(ExpiryStatus::AboutToExpire, today, 30);
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1");
        builder.push(EQUIPMENT_FROM);
        push_deleted(&mut builder, false);
        filter.push_condition(&mut builder, true);
        assert!(builder.sql().contains("LEAST(ins.end_date, lic.end_date, fe.expiry_date)"));
    }

    #[test]
    fn test_search_fields() {
        let query = ListQuery {
            search_query: Some("12".to_string()),
            search_field: Some("fleet_no".to_string()),
            ..Default::default()
        };
        // fleet_no solo existe en vehículos
        assert!(EQUIPMENT_LIST_SPEC.resolve_search(&query).is_err());
    }
}
