use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::models::audit::{ActionLogEntry, LoginLogEntry, NewAction};
use crate::services::audit::{
    self, ActionLogFilter, ActionStatistics, AuditStatistics, CleanupReport, CountByKey, LogQuery,
    LoginLogFilter, LoginStatistics, PermissionStatistics, UserStatistics, TOP_USERS_LIMIT,
};
use crate::services::query::{Page, Pagination};
use crate::services::rbac::EFFECTIVE_USER_TYPE_SQL;
use crate::utils::errors::AppResult;

const LOGIN_LOG_SELECT: &str = r#"
    SELECT l.id, l.user_id, l.username,
           NULLIF(TRIM(u.first_name || ' ' || u.last_name), '') AS full_name,
           p.user_type, l.ip_address, l.user_agent, l.success, l.login_time, l.logout_time
    FROM login_logs l
    LEFT JOIN users u ON u.id = l.user_id
    LEFT JOIN user_profiles p ON p.user_id = l.user_id
    WHERE TRUE
"#;

const LOGIN_LOG_FROM: &str = r#"
    FROM login_logs l
    LEFT JOIN users u ON u.id = l.user_id
    LEFT JOIN user_profiles p ON p.user_id = l.user_id
    WHERE TRUE
"#;

const ACTION_LOG_SELECT: &str = r#"
    SELECT a.id, a.user_id, u.username,
           NULLIF(TRIM(u.first_name || ' ' || u.last_name), '') AS full_name,
           p.user_type, a.action_type, a.module_name, a.object_id, a.description,
           a.ip_address, a.timestamp
    FROM action_logs a
    LEFT JOIN users u ON u.id = a.user_id
    LEFT JOIN user_profiles p ON p.user_id = a.user_id
    WHERE TRUE
"#;

const ACTION_LOG_FROM: &str = r#"
    FROM action_logs a
    LEFT JOIN users u ON u.id = a.user_id
    LEFT JOIN user_profiles p ON p.user_id = a.user_id
    WHERE TRUE
"#;

pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn log_login(
        &self,
        user_id: Option<Uuid>,
        username: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        success: bool,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO login_logs (id, user_id, username, ip_address, user_agent, success, login_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(username)
        .bind(ip_address)
        .bind(user_agent)
        .bind(success)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Cierra el último inicio de sesión exitoso todavía abierto
    pub async fn close_latest_login(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE login_logs SET logout_time = $2
            WHERE id = (
                SELECT id FROM login_logs
                WHERE user_id = $1 AND success AND logout_time IS NULL
                ORDER BY login_time DESC
                LIMIT 1
            )
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn log_action(&self, action: NewAction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO action_logs (id, user_id, action_type, module_name, object_id, description, ip_address, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(action.user_id)
        .bind(action.action_type)
        .bind(action.module_name)
        .bind(action.object_id)
        .bind(action.description)
        .bind(action.ip_address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_login_logs(&self, query: &LogQuery) -> AppResult<Page<LoginLogEntry>> {
        let filter = LoginLogFilter::from_query(query);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(LOGIN_LOG_FROM);
        filter.push_conditions(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let pagination = Pagination::resolve(query.page(), query.per_page(), total);

        let mut builder = QueryBuilder::<Postgres>::new(LOGIN_LOG_SELECT);
        filter.push_conditions(&mut builder);
        builder.push(" ORDER BY l.login_time DESC, l.id DESC");
        crate::services::query::push_limit(&mut builder, &pagination);

        let items = builder
            .build_query_as::<LoginLogEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, pagination })
    }

    /// Todas las filas filtradas, sin paginar (exportación CSV)
    pub async fn export_login_logs(&self, query: &LogQuery) -> AppResult<Vec<LoginLogEntry>> {
        let filter = LoginLogFilter::from_query(query);
        let mut builder = QueryBuilder::<Postgres>::new(LOGIN_LOG_SELECT);
        filter.push_conditions(&mut builder);
        builder.push(" ORDER BY l.login_time DESC, l.id DESC");

        let rows = builder
            .build_query_as::<LoginLogEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn list_action_logs(&self, query: &LogQuery) -> AppResult<Page<ActionLogEntry>> {
        let filter = ActionLogFilter::from_query(query);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(ACTION_LOG_FROM);
        filter.push_conditions(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let pagination = Pagination::resolve(query.page(), query.per_page(), total);

        let mut builder = QueryBuilder::<Postgres>::new(ACTION_LOG_SELECT);
        filter.push_conditions(&mut builder);
        builder.push(" ORDER BY a.timestamp DESC, a.id DESC");
        crate::services::query::push_limit(&mut builder, &pagination);

        let items = builder
            .build_query_as::<ActionLogEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, pagination })
    }

    pub async fn export_action_logs(&self, query: &LogQuery) -> AppResult<Vec<ActionLogEntry>> {
        let filter = ActionLogFilter::from_query(query);
        let mut builder = QueryBuilder::<Postgres>::new(ACTION_LOG_SELECT);
        filter.push_conditions(&mut builder);
        builder.push(" ORDER BY a.timestamp DESC, a.id DESC");

        let rows = builder
            .build_query_as::<ActionLogEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Módulos presentes en el registro, para los filtros
    pub async fn distinct_modules(&self) -> AppResult<Vec<String>> {
        let modules = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT module_name FROM action_logs ORDER BY module_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(modules)
    }

    pub async fn statistics(&self, days: i64) -> AppResult<AuditStatistics> {
        let since = Utc::now() - Duration::days(days);

        let (total, successful, unique_users): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE success),
                   COUNT(DISTINCT user_id)
            FROM login_logs
            WHERE login_time >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let logins = LoginStatistics {
            total,
            successful,
            failed: total - successful,
            unique_users,
            success_rate: audit::success_rate(successful, total),
        };

        let action_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM action_logs WHERE timestamp >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        let by_type = sqlx::query_as::<_, CountByKey>(
            r#"
            SELECT action_type::text AS key, COUNT(*) AS count
            FROM action_logs WHERE timestamp >= $1
            GROUP BY action_type ORDER BY count DESC, key
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let by_module = sqlx::query_as::<_, CountByKey>(
            r#"
            SELECT module_name AS key, COUNT(*) AS count
            FROM action_logs WHERE timestamp >= $1
            GROUP BY module_name ORDER BY count DESC, key
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let top_users = sqlx::query_as::<_, CountByKey>(
            r#"
            SELECT u.username AS key, COUNT(*) AS count
            FROM action_logs a
            JOIN users u ON u.id = a.user_id
            WHERE a.timestamp >= $1
            GROUP BY u.username ORDER BY count DESC, key
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(TOP_USERS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let actions = ActionStatistics {
            total: action_total,
            by_type,
            by_module,
            top_users,
        };

        let (module_permissions, granted, users_with_grants): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM module_permissions),
                   (SELECT COUNT(*) FROM user_permissions WHERE granted),
                   (SELECT COUNT(DISTINCT user_id) FROM user_permissions WHERE granted)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let granted_by_module = sqlx::query_as::<_, CountByKey>(
            r#"
            SELECT mp.module_name::text AS key, COUNT(*) AS count
            FROM user_permissions up
            JOIN module_permissions mp ON mp.id = up.module_permission_id
            WHERE up.granted
            GROUP BY mp.module_name ORDER BY key
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let permissions = PermissionStatistics {
            module_permissions,
            granted,
            users_with_grants,
            granted_by_module,
        };

        let (user_total, active): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM users")
                .fetch_one(&self.pool)
                .await?;

        let users_by_type = sqlx::query_as::<_, CountByKey>(&format!(
            "SELECT {} AS key, COUNT(*) AS count \
             FROM users u LEFT JOIN user_profiles p ON p.user_id = u.id \
             GROUP BY 1 ORDER BY 1",
            EFFECTIVE_USER_TYPE_SQL
        ))
        .fetch_all(&self.pool)
        .await?;

        let users = UserStatistics {
            total: user_total,
            active,
            inactive: user_total - active,
            by_type: users_by_type,
        };

        Ok(AuditStatistics {
            days,
            logins,
            actions,
            permissions,
            users,
        })
    }

    /// Borra (o cuenta, en modo simulación) los registros anteriores a `days` días
    pub async fn cleanup(
        &self,
        days: i64,
        dry_run: bool,
        keep_login_logs: bool,
        keep_action_logs: bool,
    ) -> AppResult<CleanupReport> {
        let cutoff = Utc::now() - Duration::days(days);
        let mut report = CleanupReport {
            dry_run,
            ..Default::default()
        };

        if !keep_login_logs {
            report.login_logs = if dry_run {
                let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM login_logs WHERE login_time < $1")
                    .bind(cutoff)
                    .fetch_one(&self.pool)
                    .await?;
                count.max(0) as u64
            } else {
                sqlx::query("DELETE FROM login_logs WHERE login_time < $1")
                    .bind(cutoff)
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            };
        }

        if !keep_action_logs {
            report.action_logs = if dry_run {
                let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM action_logs WHERE timestamp < $1")
                    .bind(cutoff)
                    .fetch_one(&self.pool)
                    .await?;
                count.max(0) as u64
            } else {
                sqlx::query("DELETE FROM action_logs WHERE timestamp < $1")
                    .bind(cutoff)
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            };
        }

        info!(
            "🧹 Limpieza de registros (>{} días, simulación: {}): {} accesos, {} acciones",
            days, dry_run, report.login_logs, report.action_logs
        );
        Ok(report)
    }
}
