//! Composición de consultas de listado: búsqueda, orden y paginación
//!
//! Cada entidad declara un `ListSpec` con los campos de búsqueda y de orden
//! permitidos. Solo se interpolan en el SQL nombres de columna que vienen de
//! esas listas estáticas; los valores del usuario siempre van como parámetros.

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::utils::errors::{AppError, AppResult};
use crate::utils::translations;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Campo de búsqueda y las columnas SQL que cubre
#[derive(Debug, Clone, Copy)]
pub struct SearchField {
    pub key: &'static str,
    pub columns: &'static [&'static str],
}

/// Dirección de orden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// "desc" ordena descendente; cualquier otro valor, ascendente
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Descripción de los filtros y órdenes permitidos para una entidad
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    pub search_fields: &'static [SearchField],
    pub default_search_field: &'static str,
    /// (clave pública, expresión SQL)
    pub sort_fields: &'static [(&'static str, &'static str)],
    pub default_sort: (&'static str, SortOrder),
    /// Desempate estable, siempre se añade al final del ORDER BY
    pub tiebreak: &'static str,
}

/// Parámetros de listado tal como llegan en la query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search_query: Option<String>,
    pub search_field: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Búsqueda ya validada
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSearch {
    pub pattern: String,
    pub columns: &'static [&'static str],
}

/// Orden ya validado
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSort {
    pub column: &'static str,
    pub order: SortOrder,
}

impl ListSpec {
    /// Búsqueda case-insensitive por subcadena; None si no hay texto
    pub fn resolve_search(&self, query: &ListQuery) -> AppResult<Option<ResolvedSearch>> {
        let text = match query.search_query.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ => return Ok(None),
        };

        let key = query
            .search_field
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(self.default_search_field);

        let field = self
            .search_fields
            .iter()
            .find(|f| f.key == key)
            .ok_or_else(|| AppError::BadRequest(translations::unknown_search_field(key)))?;

        Ok(Some(ResolvedSearch {
            pattern: format!("%{}%", escape_like(text)),
            columns: field.columns,
        }))
    }

    /// Un campo de orden desconocido vuelve al orden por defecto
    pub fn resolve_sort(&self, query: &ListQuery) -> ResolvedSort {
        let requested = query.sort_by.as_deref().map(str::trim).and_then(|key| {
            self.sort_fields
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, column)| *column)
        });

        match requested {
            Some(column) => ResolvedSort {
                column,
                order: SortOrder::parse(query.sort_order.as_deref()),
            },
            None => {
                let (key, order) = self.default_sort;
                let column = self
                    .sort_fields
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, column)| *column)
                    .unwrap_or(self.tiebreak);
                ResolvedSort { column, order }
            }
        }
    }
}

/// Escapa los comodines de LIKE (el escape por defecto de PostgreSQL es '\')
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Añade `AND (col1 ILIKE $n OR col2 ILIKE $n ...)`
pub fn push_search(builder: &mut QueryBuilder<'_, Postgres>, search: &ResolvedSearch) {
    builder.push(" AND (");
    for (i, column) in search.columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder.push(*column);
        builder.push(" ILIKE ");
        builder.push_bind(search.pattern.clone());
    }
    builder.push(")");
}

/// Añade el ORDER BY con desempate estable
pub fn push_order(builder: &mut QueryBuilder<'_, Postgres>, sort: ResolvedSort, tiebreak: &'static str) {
    builder.push(" ORDER BY ");
    builder.push(sort.column);
    builder.push(" ");
    builder.push(sort.order.sql());
    builder.push(" NULLS LAST, ");
    builder.push(tiebreak);
    builder.push(" ");
    builder.push(sort.order.sql());
}

/// Añade LIMIT / OFFSET
pub fn push_limit(builder: &mut QueryBuilder<'_, Postgres>, pagination: &Pagination) {
    builder.push(" LIMIT ");
    builder.push_bind(pagination.per_page);
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
}

/// Número de página solicitado; valores no numéricos o menores que 1 equivalen a 1
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Tamaño de página solicitado, acotado a 1..=MAX_PAGE_SIZE
pub fn parse_per_page(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.clamp(1, MAX_PAGE_SIZE))
        .unwrap_or(default)
}

/// Datos de paginación resueltos contra el total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    /// Una página más allá de la última se ajusta a la última; siempre hay al menos una página
    pub fn resolve(requested_page: i64, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        let total = total.max(0);
        let total_pages = ((total + per_page - 1) / per_page).max(1);
        let page = requested_page.clamp(1, total_pages);

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// Página de resultados
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: ListSpec = ListSpec {
        search_fields: &[
            SearchField { key: "fleet_no", columns: &["c.fleet_no"] },
            SearchField { key: "manufacturer", columns: &["m.name_en", "m.name_ar"] },
        ],
        default_search_field: "fleet_no",
        sort_fields: &[("fleet_no", "c.fleet_no"), ("created_at", "c.created_at")],
        default_sort: ("created_at", SortOrder::Desc),
        tiebreak: "c.id",
    };

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        let mut q = ListQuery::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "search_query" => q.search_query = v,
                "search_field" => q.search_field = v,
                "sort_by" => q.sort_by = v,
                "sort_order" => q.sort_order = v,
                "page" => q.page = v,
                _ => q.per_page = v,
            }
        }
        q
    }

    #[test]
    fn test_empty_search_is_no_filter() {
        assert_eq!(SPEC.resolve_search(&query(&[])).unwrap(), None);
        assert_eq!(SPEC.resolve_search(&query(&[("search_query", "   ")])).unwrap(), None);
    }

    #[test]
    fn test_search_uses_default_field() {
        let search = SPEC.resolve_search(&query(&[("search_query", "AB1")])).unwrap().unwrap();
        assert_eq!(search.pattern, "%AB1%");
        assert_eq!(search.columns, &["c.fleet_no"]);
    }

    #[test]
    fn test_unknown_search_field_rejected() {
        let result = SPEC.resolve_search(&query(&[("search_query", "x"), ("search_field", "password")]));
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_like_wildcards_escaped() {
        assert_eq!(escape_like(r"50%_off\"), r"50\%\_off\\");
        let search = SPEC.resolve_search(&query(&[("search_query", "a_b")])).unwrap().unwrap();
        assert_eq!(search.pattern, r"%a\_b%");
    }

    #[test]
    fn test_sort_resolution() {
        let sort = SPEC.resolve_sort(&query(&[("sort_by", "fleet_no"), ("sort_order", "desc")]));
        assert_eq!(sort, ResolvedSort { column: "c.fleet_no", order: SortOrder::Desc });

        let sort = SPEC.resolve_sort(&query(&[("sort_by", "fleet_no"), ("sort_order", "sideways")]));
        assert_eq!(sort.order, SortOrder::Asc);

        let fallback = SPEC.resolve_sort(&query(&[("sort_by", "1; DROP TABLE cars")]));
        assert_eq!(fallback, ResolvedSort { column: "c.created_at", order: SortOrder::Desc });
    }

    #[test]
    fn test_sql_composition() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT c.* FROM cars c WHERE c.deleted_at IS NULL");
        let search = SPEC
            .resolve_search(&query(&[("search_query", "toyota"), ("search_field", "manufacturer")]))
            .unwrap()
            .unwrap();
        push_search(&mut builder, &search);
        push_order(&mut builder, SPEC.resolve_sort(&ListQuery::default()), SPEC.tiebreak);
        push_limit(&mut builder, &Pagination::resolve(2, 20, 45));

        assert_eq!(
            builder.sql(),
            "SELECT c.* FROM cars c WHERE c.deleted_at IS NULL AND (m.name_en ILIKE $1 OR m.name_ar ILIKE $2) \
             ORDER BY c.created_at DESC NULLS LAST, c.id DESC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn test_pagination_clamping() {
        let p = Pagination::resolve(1, 20, 0);
        assert_eq!((p.page, p.total_pages, p.has_next, p.has_previous), (1, 1, false, false));

        let p = Pagination::resolve(99, 20, 45);
        assert_eq!((p.page, p.total_pages, p.offset()), (3, 3, 40));
        assert!(p.has_previous && !p.has_next);

        let p = Pagination::resolve(2, 20, 45);
        assert!(p.has_next && p.has_previous);
    }

    #[test]
    fn test_page_parsing() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-4")), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_per_page(None, DEFAULT_PAGE_SIZE), 20);
        assert_eq!(parse_per_page(Some("500"), DEFAULT_PAGE_SIZE), 100);
        assert_eq!(parse_per_page(Some("0"), DEFAULT_PAGE_SIZE), 1);
    }
}
