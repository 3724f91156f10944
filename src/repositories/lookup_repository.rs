use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::lookup_dto::LookupRequest;
use crate::models::lookup::{LookupItem, LookupRef, LookupTable, DUMMY_NAME_AR};
use crate::services::hierarchy;
use crate::services::query::{self, ListQuery, ListSpec, Page, Pagination, SearchField, SortOrder};
use crate::utils::errors::AppResult;

pub const LOOKUP_LIST_SPEC: ListSpec = ListSpec {
    search_fields: &[
        SearchField { key: "name", columns: &["t.name_en", "t.name_ar"] },
        SearchField { key: "name_en", columns: &["t.name_en"] },
        SearchField { key: "name_ar", columns: &["t.name_ar"] },
    ],
    default_search_field: "name",
    sort_fields: &[
        ("name_en", "t.name_en"),
        ("name_ar", "t.name_ar"),
        ("created_at", "t.created_at"),
        ("updated_at", "t.updated_at"),
    ],
    default_sort: ("created_at", SortOrder::Desc),
    tiebreak: "t.id",
};

pub struct LookupRepository {
    pool: PgPool,
}

impl LookupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        table: LookupTable,
        query: &ListQuery,
        parent_id: Option<Uuid>,
    ) -> AppResult<Page<LookupItem>> {
        let search = LOOKUP_LIST_SPEC.resolve_search(query)?;
        let sort = LOOKUP_LIST_SPEC.resolve_sort(query);

        let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {} t WHERE TRUE", table.table()));
        if let Some(search) = &search {
            query::push_search(&mut count, search);
        }
        push_parent(&mut count, parent_id);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let pagination = Pagination::resolve(
            query::parse_page(query.page.as_deref()),
            query::parse_per_page(query.per_page.as_deref(), query::DEFAULT_PAGE_SIZE),
            total,
        );

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT t.* FROM {} t WHERE TRUE", table.table()));
        if let Some(search) = &search {
            query::push_search(&mut builder, search);
        }
        push_parent(&mut builder, parent_id);
        query::push_order(&mut builder, sort, LOOKUP_LIST_SPEC.tiebreak);
        query::push_limit(&mut builder, &pagination);

        let items = builder.build_query_as::<LookupItem>().fetch_all(&self.pool).await?;
        Ok(Page { items, pagination })
    }

    pub async fn find_by_id(&self, table: LookupTable, id: Uuid) -> AppResult<Option<LookupItem>> {
        let item = sqlx::query_as::<_, LookupItem>(&format!("SELECT * FROM {} WHERE id = $1", table.table()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    pub async fn create(&self, table: LookupTable, request: &LookupRequest) -> AppResult<LookupItem> {
        let now = Utc::now();
        let item = sqlx::query_as::<_, LookupItem>(&format!(
            r#"
            INSERT INTO {} (id, name_en, name_ar, is_dummy, parent_id, attributes, created_at, updated_at)
            VALUES ($1, $2, $3, FALSE, $4, $5, $6, $6)
            RETURNING *
            "#,
            table.table()
        ))
        .bind(Uuid::new_v4())
        .bind(request.name_en.trim())
        .bind(request.name_ar.trim())
        .bind(request.parent_id)
        .bind(request.attributes_json())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn update(&self, table: LookupTable, id: Uuid, request: &LookupRequest) -> AppResult<Option<LookupItem>> {
        let item = sqlx::query_as::<_, LookupItem>(&format!(
            r#"
            UPDATE {}
            SET name_en = $2, name_ar = $3, parent_id = $4, attributes = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
            table.table()
        ))
        .bind(id)
        .bind(request.name_en.trim())
        .bind(request.name_ar.trim())
        .bind(request.parent_id)
        .bind(request.attributes_json())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Borrado físico; las claves foráneas RESTRICT protegen las filas en uso
    pub async fn delete(&self, table: LookupTable, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_ref(&self, table: LookupTable, id: Uuid) -> AppResult<Option<LookupRef>> {
        let row: Option<(Uuid, String, String)> =
            sqlx::query_as(&format!("SELECT id, name_en, name_ar FROM {} WHERE id = $1", table.table()))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, name_en, name_ar)| LookupRef { id, name_en, name_ar }))
    }

    /// Resuelve las referencias presentes de un activo: campo → (id, nombres)
    pub async fn resolve_refs(
        &self,
        refs: &[(&'static str, LookupTable, Option<Uuid>)],
    ) -> AppResult<BTreeMap<&'static str, LookupRef>> {
        let mut resolved = BTreeMap::new();
        for (field, table, id) in refs {
            if let Some(id) = id {
                if let Some(reference) = self.find_ref(*table, *id).await? {
                    resolved.insert(*field, reference);
                }
            }
        }
        Ok(resolved)
    }

    /// ¿Pertenece la fila `id` al padre indicado?
    pub async fn belongs_to(&self, table: LookupTable, id: Uuid, parent_id: Uuid) -> AppResult<bool> {
        let belongs: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1 AND parent_id = $2)",
            table.table()
        ))
        .bind(id)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(belongs)
    }

    /// ¿Es una fila "sin especificar"? Estas filas valen bajo cualquier padre
    pub async fn is_dummy(&self, table: LookupTable, id: Uuid) -> AppResult<bool> {
        let dummy: Option<bool> = sqlx::query_scalar(&format!(
            "SELECT is_dummy OR name_ar = $2 FROM {} WHERE id = $1",
            table.table()
        ))
        .bind(id)
        .bind(DUMMY_NAME_AR)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dummy.unwrap_or(false))
    }

    /// Opciones de un nivel de la jerarquía filtradas por su padre (None → todas)
    pub async fn hierarchy_options(&self, table: LookupTable, parent_id: Option<Uuid>) -> AppResult<Vec<LookupItem>> {
        let dummies = sqlx::query_as::<_, LookupItem>(&format!(
            "SELECT * FROM {} WHERE is_dummy OR name_ar = $1",
            table.table()
        ))
        .bind(DUMMY_NAME_AR)
        .fetch_all(&self.pool)
        .await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT t.* FROM {} t WHERE TRUE", table.table()));
        push_parent(&mut builder, parent_id);
        let rows = builder.build_query_as::<LookupItem>().fetch_all(&self.pool).await?;

        Ok(hierarchy::order_options(&dummies, rows))
    }

    /// Busca una región por nombre (árabe o inglés) o la crea, dentro de la transacción del llamador
    pub async fn get_or_create_region(conn: &mut PgConnection, name: &str) -> AppResult<Uuid> {
        let existing: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM regions WHERE name_ar = $1 OR name_en = $1 LIMIT 1")
                .bind(name)
                .fetch_optional(&mut *conn)
                .await?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let now = Utc::now();
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO regions (id, name_en, name_ar, created_at, updated_at)
            VALUES ($1, $2, $2, $3, $3)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }
}

fn push_parent(builder: &mut QueryBuilder<'_, Postgres>, parent_id: Option<Uuid>) {
    if let Some(parent_id) = parent_id {
        builder.push(" AND t.parent_id = ");
        builder.push_bind(parent_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sql_with_parent_and_search() {
        let query = ListQuery {
            search_query: Some("north".to_string()),
            ..Default::default()
        };
        let search = LOOKUP_LIST_SPEC.resolve_search(&query).unwrap().unwrap();
        let mut builder = QueryBuilder::<Postgres>::new("SELECT t.* FROM departments t WHERE TRUE");
        query::push_search(&mut builder, &search);
        push_parent(&mut builder, Some(Uuid::nil()));
        assert_eq!(
            builder.sql(),
            "SELECT t.* FROM departments t WHERE TRUE AND (t.name_en ILIKE $1 OR t.name_ar ILIKE $2) AND t.parent_id = $3"
        );
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let sort = LOOKUP_LIST_SPEC.resolve_sort(&ListQuery::default());
        assert_eq!(sort.column, "t.created_at");
        assert_eq!(sort.order, SortOrder::Desc);
    }
}
