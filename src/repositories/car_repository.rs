use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::dto::car_dto::CarRequest;
use crate::models::asset::{AssetRef, AssetStatus, RecordTable};
use crate::models::car::{Car, CarListItem};
use crate::models::lookup::LookupRef;
use crate::models::maintenance::MaintenanceFields;
use crate::repositories::lookup_repository::LookupRepository;
use crate::repositories::maintenance_repository::MaintenanceRepository;
use crate::repositories::record_repository::RecordRepository;
use crate::services::expiry::{ExpiryFilter, DASHBOARD_LIMIT};
use crate::services::query::{self, ListQuery, ListSpec, Page, Pagination, SearchField, SortOrder};
use crate::utils::errors::AppResult;

pub const CAR_LIST_SPEC: ListSpec = ListSpec {
    search_fields: &[
        SearchField { key: "fleet_no", columns: &["c.fleet_no"] },
        SearchField { key: "plate_no_en", columns: &["c.plate_no_en"] },
        SearchField { key: "plate_no_ar", columns: &["c.plate_no_ar"] },
        SearchField { key: "manufacturer", columns: &["m.name_en", "m.name_ar"] },
    ],
    default_search_field: "fleet_no",
    sort_fields: &[
        ("fleet_no", "c.fleet_no"),
        ("plate_no_en", "c.plate_no_en"),
        ("plate_no_ar", "c.plate_no_ar"),
        ("manufacturer", "m.name_ar"),
        ("status", "c.status"),
        ("latest_maintenance_date", "mt.maintenance_date"),
        ("inspection_end_date", "ins.end_date"),
        ("license_end_date", "lic.end_date"),
        ("created_at", "c.created_at"),
        ("updated_at", "c.updated_at"),
    ],
    default_sort: ("created_at", SortOrder::Desc),
    tiebreak: "c.id",
};

// Fabricante + último mantenimiento + inspección y licencia vigentes
const CAR_FROM: &str = r#"
    FROM cars c
    LEFT JOIN manufacturers m ON m.id = c.manufacturer_id
    LEFT JOIN LATERAL (
        SELECT maintenance_date, cost FROM maintenance_records
        WHERE car_id = c.id
        ORDER BY maintenance_date DESC NULLS LAST, created_at DESC
        LIMIT 1
    ) mt ON TRUE
    LEFT JOIN LATERAL (
        SELECT end_date FROM inspection_records
        WHERE car_id = c.id
        ORDER BY start_date DESC, created_at DESC
        LIMIT 1
    ) ins ON TRUE
    LEFT JOIN LATERAL (
        SELECT end_date FROM license_records
        WHERE car_id = c.id
        ORDER BY start_date DESC, created_at DESC
        LIMIT 1
    ) lic ON TRUE
"#;

const CAR_LIST_COLUMNS: &str = r#"
    SELECT c.*,
           m.name_en AS manufacturer_name_en,
           m.name_ar AS manufacturer_name_ar,
           mt.maintenance_date AS latest_maintenance_date,
           mt.cost AS latest_maintenance_cost,
           ins.end_date AS inspection_end_date,
           lic.end_date AS license_end_date
"#;

fn push_deleted(builder: &mut QueryBuilder<'_, Postgres>, deleted_only: bool) {
    if deleted_only {
        builder.push(" WHERE c.deleted_at IS NOT NULL");
    } else {
        builder.push(" WHERE c.deleted_at IS NULL");
    }
}

pub struct CarRepository {
    pool: PgPool,
}

impl CarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Listado paginado; `deleted_only` muestra la papelera
    pub async fn list(&self, query: &ListQuery, deleted_only: bool) -> AppResult<Page<CarListItem>> {
        let search = CAR_LIST_SPEC.resolve_search(query)?;
        let sort = CAR_LIST_SPEC.resolve_sort(query);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM cars c LEFT JOIN manufacturers m ON m.id = c.manufacturer_id");
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

        let mut builder = QueryBuilder::<Postgres>::new(CAR_LIST_COLUMNS);
        builder.push(CAR_FROM);
        push_deleted(&mut builder, deleted_only);
        if let Some(search) = &search {
            query::push_search(&mut builder, search);
        }
        query::push_order(&mut builder, sort, CAR_LIST_SPEC.tiebreak);
        query::push_limit(&mut builder, &pagination);

        debug!("🔍 Listado de vehículos: {}", builder.sql());
        let items = builder.build_query_as::<CarListItem>().fetch_all(&self.pool).await?;

        Ok(Page { items, pagination })
    }

    /// Vehículos vencidos o por vencer (panel), por fecha de fin de inspección
    pub async fn expiring(&self, filter: &ExpiryFilter) -> AppResult<Vec<CarListItem>> {
        let mut builder = QueryBuilder::<Postgres>::new(CAR_LIST_COLUMNS);
        builder.push(CAR_FROM);
        push_deleted(&mut builder, false);
        filter.push_condition(&mut builder, false);
        builder.push(" ORDER BY ins.end_date ASC NULLS FIRST, c.id LIMIT ");
        builder.push_bind(DASHBOARD_LIMIT);

        let items = builder.build_query_as::<CarListItem>().fetch_all(&self.pool).await?;
        Ok(items)
    }

    /// Incluye vehículos en la papelera
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Car>> {
        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(car)
    }

    pub async fn visited_regions(&self, car_id: Uuid) -> AppResult<Vec<LookupRef>> {
        let rows: Vec<(Uuid, String, String)> = sqlx::query_as(
            r#"
            SELECT r.id, r.name_en, r.name_ar
            FROM car_visited_regions v
            JOIN regions r ON r.id = v.region_id
            WHERE v.car_id = $1
            ORDER BY r.name_ar
            "#,
        )
        .bind(car_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name_en, name_ar)| LookupRef { id, name_en, name_ar })
            .collect())
    }

    /// Alta completa en una transacción. El mantenimiento inicial solo se guarda
    /// si el vehículo entra en estado "under_maintenance".
    pub async fn create(&self, request: &CarRequest, maintenance: &[MaintenanceFields]) -> AppResult<Car> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let car = sqlx::query_as::<_, Car>(
            r#"
            INSERT INTO cars (
                id, fleet_no, plate_no_en, plate_no_ar,
                administrative_unit_id, sector_id, department_id, division_id, driver_id,
                car_class_id, manufacturer_id, car_model_id, functional_location_id, room_id,
                notification_recipient_id, contract_type_id, activity_id,
                ownership_type, status, location_description, address_details,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22, $22)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.fleet_no.trim())
        .bind(request.plate_no_en.trim())
        .bind(request.plate_no_ar.trim())
        .bind(request.administrative_unit_id)
        .bind(request.sector_id)
        .bind(request.department_id)
        .bind(request.division_id)
        .bind(request.driver_id)
        .bind(request.car_class_id)
        .bind(request.manufacturer_id)
        .bind(request.car_model_id)
        .bind(request.functional_location_id)
        .bind(request.room_id)
        .bind(request.notification_recipient_id)
        .bind(request.contract_type_id)
        .bind(request.activity_id)
        .bind(request.ownership_type)
        .bind(request.status)
        .bind(request.location_description.trim())
        .bind(request.address_details.as_deref().map(str::trim).filter(|a| !a.is_empty()))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let owner = AssetRef::Car(id);
        RecordRepository::replace(&mut tx, RecordTable::License, owner, &request.license_records).await?;
        RecordRepository::replace(&mut tx, RecordTable::Inspection, owner, &request.inspection_records).await?;
        Self::replace_regions(&mut tx, id, &request.region_names()).await?;

        if request.status == AssetStatus::UnderMaintenance {
            for fields in maintenance {
                MaintenanceRepository::insert(&mut tx, owner, fields).await?;
            }
        }

        tx.commit().await?;
        Ok(car)
    }

    /// Edición completa; los mantenimientos nuevos se añaden y los marcados se borran.
    /// Devuelve None si el vehículo no existe o está en la papelera.
    pub async fn update(
        &self,
        id: Uuid,
        request: &CarRequest,
        maintenance: &[MaintenanceFields],
    ) -> AppResult<Option<Car>> {
        let mut tx = self.pool.begin().await?;

        let car = sqlx::query_as::<_, Car>(
            r#"
            UPDATE cars SET
                fleet_no = $2, plate_no_en = $3, plate_no_ar = $4,
                administrative_unit_id = $5, sector_id = $6, department_id = $7, division_id = $8,
                driver_id = $9, car_class_id = $10, manufacturer_id = $11, car_model_id = $12,
                functional_location_id = $13, room_id = $14, notification_recipient_id = $15,
                contract_type_id = $16, activity_id = $17, ownership_type = $18, status = $19,
                location_description = $20, address_details = $21, updated_at = $22
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.fleet_no.trim())
        .bind(request.plate_no_en.trim())
        .bind(request.plate_no_ar.trim())
        .bind(request.administrative_unit_id)
        .bind(request.sector_id)
        .bind(request.department_id)
        .bind(request.division_id)
        .bind(request.driver_id)
        .bind(request.car_class_id)
        .bind(request.manufacturer_id)
        .bind(request.car_model_id)
        .bind(request.functional_location_id)
        .bind(request.room_id)
        .bind(request.notification_recipient_id)
        .bind(request.contract_type_id)
        .bind(request.activity_id)
        .bind(request.ownership_type)
        .bind(request.status)
        .bind(request.location_description.trim())
        .bind(request.address_details.as_deref().map(str::trim).filter(|a| !a.is_empty()))
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let car = match car {
            Some(car) => car,
            None => return Ok(None),
        };

        let owner = AssetRef::Car(id);
        RecordRepository::replace(&mut tx, RecordTable::License, owner, &request.license_records).await?;
        RecordRepository::replace(&mut tx, RecordTable::Inspection, owner, &request.inspection_records).await?;
        Self::replace_regions(&mut tx, id, &request.region_names()).await?;
        MaintenanceRepository::delete_for(&mut tx, owner, &request.delete_maintenance_ids).await?;
        for fields in maintenance {
            MaintenanceRepository::insert(&mut tx, owner, fields).await?;
        }

        tx.commit().await?;
        Ok(Some(car))
    }

    async fn replace_regions(conn: &mut PgConnection, car_id: Uuid, names: &[String]) -> AppResult<()> {
        sqlx::query("DELETE FROM car_visited_regions WHERE car_id = $1")
            .bind(car_id)
            .execute(&mut *conn)
            .await?;

        for name in names {
            let region_id = LookupRepository::get_or_create_region(&mut *conn, name).await?;
            sqlx::query(
                "INSERT INTO car_visited_regions (car_id, region_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(car_id)
            .bind(region_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn soft_delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE cars SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn restore(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE cars SET deleted_at = NULL, updated_at = $2 WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Borrado físico; solo aplica a vehículos que ya están en la papelera
    pub async fn purge(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1 AND deleted_at IS NOT NULL")
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
    fn test_manufacturer_search_uses_join_alias() {
        let query = ListQuery {
            search_query: Some("toy".to_string()),
            search_field: Some("manufacturer".to_string()),
            ..Default::default()
        };
        let search = CAR_LIST_SPEC.resolve_search(&query).unwrap().unwrap();
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM cars c");
        push_deleted(&mut builder, false);
        query::push_search(&mut builder, &search);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM cars c WHERE c.deleted_at IS NULL AND (m.name_en ILIKE $1 OR m.name_ar ILIKE $2)"
        );
    }

    #[test]
    fn test_unknown_sort_falls_back_to_newest() {
        let query = ListQuery {
            sort_by: Some("password".to_string()),
            ..Default::default()
        };
        let sort = CAR_LIST_SPEC.resolve_sort(&query);
        assert_eq!(sort.column, "c.created_at");
        assert_eq!(sort.order, SortOrder::Desc);
    }

    #[test]
    fn test_expiring_sql_has_no_fire_extinguisher_alias() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let filter = ExpiryFilter::new(ExpiryStatus::Expired, today, 30);
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1");
        builder.push(CAR_FROM);
        push_deleted(&mut builder, false);
        filter.push_condition(&mut builder, false);
        assert!(!builder.sql().contains("fe."));
        assert!(builder.sql().contains("ins.end_date IS NULL"));
    }
}
