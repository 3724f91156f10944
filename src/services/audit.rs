//! Consultas del registro de auditoría: filtros, paginación y estadísticas
//!
//! Los filtros se traducen a condiciones SQL sobre los alias `l` (login_logs),
//! `a` (action_logs), `u` (users) y `p` (user_profiles).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::models::audit::ActionType;
use crate::models::user::UserType;
use crate::services::query::{escape_like, parse_page};
use crate::services::rbac::push_user_type_condition;
use crate::utils::validation::{non_empty, parse_bool_param, parse_date_param};

pub const LOG_PAGE_SIZES: [i64; 4] = [10, 25, 50, 100];
pub const DEFAULT_LOG_PAGE_SIZE: i64 = 25;
pub const DEFAULT_RETENTION_DAYS: i64 = 90;
pub const DEFAULT_STATISTICS_DAYS: i64 = 30;
pub const TOP_USERS_LIMIT: i64 = 10;

/// Ventana de las estadísticas (?days=)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsQuery {
    pub days: Option<String>,
}

/// Parámetros de los listados de auditoría
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    pub search: Option<String>,
    pub success: Option<String>,
    pub role: Option<String>,
    pub action_type: Option<String>,
    pub module: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl LogQuery {
    pub fn page(&self) -> i64 {
        parse_page(self.page.as_deref())
    }

    /// Solo 10, 25, 50 o 100; cualquier otro valor → 25
    pub fn per_page(&self) -> i64 {
        self.per_page
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|n| LOG_PAGE_SIZES.contains(n))
            .unwrap_or(DEFAULT_LOG_PAGE_SIZE)
    }

    fn pattern(&self) -> Option<String> {
        non_empty(self.search.clone()).map(|s| format!("%{}%", escape_like(&s)))
    }

    fn role(&self) -> Option<UserType> {
        self.role.as_deref().and_then(|r| UserType::parse(r.trim()))
    }
}

fn push_any_ilike(builder: &mut QueryBuilder<'_, Postgres>, columns: &[&str], pattern: &str) {
    builder.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder.push(*column);
        builder.push(" ILIKE ");
        builder.push_bind(pattern.to_string());
    }
    builder.push(")");
}

fn push_date_range(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) {
    if let Some(start) = start {
        builder.push(format!(" AND ({} AT TIME ZONE 'UTC')::date >= ", column));
        builder.push_bind(start);
    }
    if let Some(end) = end {
        builder.push(format!(" AND ({} AT TIME ZONE 'UTC')::date <= ", column));
        builder.push_bind(end);
    }
}

/// Filtros del registro de inicios de sesión
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginLogFilter {
    pub pattern: Option<String>,
    pub success: Option<bool>,
    pub role: Option<UserType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl LoginLogFilter {
    pub fn from_query(query: &LogQuery) -> Self {
        Self {
            pattern: query.pattern(),
            success: parse_bool_param(query.success.as_deref()),
            role: query.role(),
            start_date: parse_date_param(query.start_date.as_deref()),
            end_date: parse_date_param(query.end_date.as_deref()),
        }
    }

    pub fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(pattern) = &self.pattern {
            push_any_ilike(
                builder,
                &["l.username", "u.first_name", "u.last_name", "l.ip_address"],
                pattern,
            );
        }
        if let Some(success) = self.success {
            builder.push(" AND l.success = ");
            builder.push_bind(success);
        }
        if let Some(role) = self.role {
            push_user_type_condition(builder, role);
        }
        push_date_range(builder, "l.login_time", self.start_date, self.end_date);
    }
}

/// Filtros del registro de acciones
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionLogFilter {
    pub pattern: Option<String>,
    pub action_type: Option<ActionType>,
    pub module: Option<String>,
    pub role: Option<UserType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ActionLogFilter {
    pub fn from_query(query: &LogQuery) -> Self {
        Self {
            pattern: query.pattern(),
            action_type: query.action_type.as_deref().and_then(|a| ActionType::parse(a.trim())),
            module: non_empty(query.module.clone()),
            role: query.role(),
            start_date: parse_date_param(query.start_date.as_deref()),
            end_date: parse_date_param(query.end_date.as_deref()),
        }
    }

    pub fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(pattern) = &self.pattern {
            push_any_ilike(
                builder,
                &["u.username", "u.first_name", "u.last_name", "a.description", "a.action_type::text"],
                pattern,
            );
        }
        if let Some(action_type) = self.action_type {
            builder.push(" AND a.action_type = ");
            builder.push_bind(action_type);
        }
        if let Some(module) = &self.module {
            builder.push(" AND a.module_name = ");
            builder.push_bind(module.clone());
        }
        if let Some(role) = self.role {
            push_user_type_condition(builder, role);
        }
        push_date_range(builder, "a.timestamp", self.start_date, self.end_date);
    }
}

/// Porcentaje con dos decimales; 0 si no hay intentos
pub fn success_rate(successful: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (successful as f64 * 10000.0 / total as f64).round() / 100.0
}

/// Ventana de estadísticas en días, acotada a 1..=365
pub fn statistics_days(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|d| d.clamp(1, 365))
        .unwrap_or(DEFAULT_STATISTICS_DAYS)
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, PartialEq)]
pub struct CountByKey {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoginStatistics {
    pub total: i64,
    pub successful: i64,
    pub failed: i64,
    pub unique_users: i64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionStatistics {
    pub total: i64,
    pub by_type: Vec<CountByKey>,
    pub by_module: Vec<CountByKey>,
    pub top_users: Vec<CountByKey>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PermissionStatistics {
    pub module_permissions: i64,
    pub granted: i64,
    pub users_with_grants: i64,
    pub granted_by_module: Vec<CountByKey>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserStatistics {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub by_type: Vec<CountByKey>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditStatistics {
    pub days: i64,
    pub logins: LoginStatistics,
    pub actions: ActionStatistics,
    pub permissions: PermissionStatistics,
    pub users: UserStatistics,
}

/// Resultado de la limpieza de registros antiguos
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub login_logs: u64,
    pub action_logs: u64,
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> LogQuery {
        LogQuery::default()
    }

    #[test]
    fn test_log_page_size_whitelist() {
        let mut q = query();
        assert_eq!(q.per_page(), 25);
        q.per_page = Some("50".to_string());
        assert_eq!(q.per_page(), 50);
        q.per_page = Some("20".to_string());
        assert_eq!(q.per_page(), 25);
        q.per_page = Some("lots".to_string());
        assert_eq!(q.per_page(), 25);
    }

    #[test]
    fn test_invalid_dates_are_ignored() {
        let mut q = query();
        q.start_date = Some("2024-13-45".to_string());
        q.end_date = Some("2024-05-31".to_string());
        let filter = LoginLogFilter::from_query(&q);
        assert_eq!(filter.start_date, None);
        assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2024, 5, 31));
    }

    #[test]
    fn test_login_filter_sql() {
        let mut q = query();
        q.search = Some("ali".to_string());
        q.success = Some("true".to_string());
        q.role = Some("admin".to_string());
        let filter = LoginLogFilter::from_query(&q);

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 WHERE TRUE");
        filter.push_conditions(&mut builder);
        assert!(builder.sql().starts_with(
            "SELECT 1 WHERE TRUE AND (l.username ILIKE $1 OR u.first_name ILIKE $2 \
             OR u.last_name ILIKE $3 OR l.ip_address ILIKE $4) AND l.success = $5 AND (CASE"
        ));
        assert!(builder.sql().ends_with("END) = $6"));
        assert!(builder.sql().contains("WHEN p.user_type IS NOT NULL THEN p.user_type::text"));
    }

    #[test]
    fn test_action_filter_ignores_unknown_values() {
        let mut q = query();
        q.action_type = Some("explode".to_string());
        q.role = Some("root".to_string());
        q.module = Some("cars".to_string());
        let filter = ActionLogFilter::from_query(&q);
        assert_eq!(filter.action_type, None);
        assert_eq!(filter.role, None);

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 WHERE TRUE");
        filter.push_conditions(&mut builder);
        assert_eq!(builder.sql(), "SELECT 1 WHERE TRUE AND a.module_name = $1");
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let mut q = query();
        q.start_date = Some("2024-05-01".to_string());
        q.end_date = Some("2024-05-31".to_string());
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 WHERE TRUE");
        ActionLogFilter::from_query(&q).push_conditions(&mut builder);
        let sql = builder.sql();
        assert!(sql.contains("(a.timestamp AT TIME ZONE 'UTC')::date >= $1"));
        assert!(sql.contains("(a.timestamp AT TIME ZONE 'UTC')::date <= $2"));
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(2, 3), 66.67);
        assert_eq!(success_rate(5, 5), 100.0);
        assert_eq!(statistics_days(None), 30);
        assert_eq!(statistics_days(Some("1000")), 365);
    }
}
