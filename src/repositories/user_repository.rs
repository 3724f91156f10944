use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::user::{UserType, UserWithProfile};
use crate::services::query::{self, ListQuery, ListSpec, Page, Pagination, SearchField, SortOrder};
use crate::services::rbac::push_user_type_condition;
use crate::utils::errors::AppResult;

const USER_SELECT: &str = r#"
    SELECT u.*, p.user_type, p.is_active AS profile_is_active, p.created_by
    FROM users u
    LEFT JOIN user_profiles p ON p.user_id = u.id
"#;

pub const USER_LIST_SPEC: ListSpec = ListSpec {
    search_fields: &[
        SearchField { key: "username", columns: &["u.username"] },
        SearchField { key: "email", columns: &["u.email"] },
        SearchField { key: "name", columns: &["u.first_name", "u.last_name"] },
        SearchField { key: "all", columns: &["u.username", "u.email", "u.first_name", "u.last_name"] },
    ],
    default_search_field: "all",
    sort_fields: &[
        ("username", "u.username"),
        ("email", "u.email"),
        ("last_login", "u.last_login"),
        ("created_at", "u.created_at"),
    ],
    default_sort: ("created_at", SortOrder::Desc),
    tiebreak: "u.id",
};

/// Datos de alta de un usuario (contraseña ya hasheada)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub user_type: UserType,
    pub created_by: Option<Uuid>,
}

/// Cambios parciales; None deja el valor actual
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
    pub user_type: Option<UserType>,
    pub is_active: Option<bool>,
}

/// Filtros del listado de usuarios
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFilter {
    pub user_type: Option<UserType>,
    pub is_active: Option<bool>,
}

impl UserFilter {
    fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(user_type) = self.user_type {
            push_user_type_condition(builder, user_type);
        }
        if let Some(is_active) = self.is_active {
            builder.push(" AND u.is_active = ");
            builder.push_bind(is_active);
        }
    }
}

/// `users.is_superuser` sigue al tipo de perfil cuando éste cambia
fn superuser_flag(user_type: Option<UserType>) -> Option<bool> {
    user_type.map(|t| t == UserType::SuperAdmin)
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserWithProfile>> {
        let user = sqlx::query_as::<_, UserWithProfile>(&format!("{} WHERE u.id = $1", USER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<UserWithProfile>> {
        let user = sqlx::query_as::<_, UserWithProfile>(&format!("{} WHERE u.username = $1", USER_SELECT))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list(&self, query: &ListQuery, filter: UserFilter) -> AppResult<Page<UserWithProfile>> {
        let search = USER_LIST_SPEC.resolve_search(query)?;
        let sort = USER_LIST_SPEC.resolve_sort(query);

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM users u LEFT JOIN user_profiles p ON p.user_id = u.id WHERE TRUE",
        );
        if let Some(search) = &search {
            query::push_search(&mut count, search);
        }
        filter.push_conditions(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let pagination = Pagination::resolve(
            query::parse_page(query.page.as_deref()),
            query::parse_per_page(query.per_page.as_deref(), query::DEFAULT_PAGE_SIZE),
            total,
        );

        let mut builder = QueryBuilder::<Postgres>::new(USER_SELECT);
        builder.push(" WHERE TRUE");
        if let Some(search) = &search {
            query::push_search(&mut builder, search);
        }
        filter.push_conditions(&mut builder);
        query::push_order(&mut builder, sort, USER_LIST_SPEC.tiebreak);
        query::push_limit(&mut builder, &pagination);

        let items = builder
            .build_query_as::<UserWithProfile>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, pagination })
    }

    /// Crea el usuario y su perfil en una sola transacción
    pub async fn create(&self, new_user: NewUser) -> AppResult<UserWithProfile> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password_hash,
                               is_superuser, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            "#,
        )
        .bind(id)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.password_hash)
        .bind(new_user.is_superuser)
        .bind(new_user.is_active)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, user_type, is_active, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(id)
        .bind(new_user.user_type)
        .bind(new_user.is_active)
        .bind(new_user.created_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, UserWithProfile>(&format!("{} WHERE u.id = $1", USER_SELECT))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Actualiza usuario y perfil; crea el perfil si el usuario no lo tenía
    pub async fn update(&self, id: Uuid, changes: UserChanges, actor: Uuid) -> AppResult<UserWithProfile> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                password_hash = COALESCE($5, password_hash),
                is_active = COALESCE($6, is_active),
                updated_at = $7,
                is_superuser = COALESCE($8, is_superuser)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.password_hash)
        .bind(changes.is_active)
        .bind(now)
        .bind(superuser_flag(changes.user_type))
        .execute(&mut *tx)
        .await?;

        if changes.user_type.is_some() || changes.is_active.is_some() {
            sqlx::query(
                r#"
                INSERT INTO user_profiles (user_id, user_type, is_active, created_by, created_at, updated_at)
                VALUES ($1, COALESCE($2, 'normal'::user_type), COALESCE($3, TRUE), $4, $5, $5)
                ON CONFLICT (user_id) DO UPDATE
                SET user_type = COALESCE($2, user_profiles.user_type),
                    is_active = COALESCE($3, user_profiles.is_active),
                    updated_at = $5
                "#,
            )
            .bind(id)
            .bind(changes.user_type)
            .bind(changes.is_active)
            .bind(actor)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let user = sqlx::query_as::<_, UserWithProfile>(&format!("{} WHERE u.id = $1", USER_SELECT))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Borrado lógico (false) o restauración (true) de la cuenta y su perfil
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<bool> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE users SET is_active = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE user_profiles SET is_active = $2, updated_at = $3 WHERE user_id = $1")
            .bind(id)
            .bind(is_active)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_last_login(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Reemplaza la contraseña y marca la cuenta como superusuario activo
    pub async fn promote_super_admin(&self, id: Uuid, password_hash: &str) -> AppResult<UserWithProfile> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, is_superuser = TRUE, is_active = TRUE, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, user_type, is_active, created_at, updated_at)
            VALUES ($1, 'super_admin', TRUE, $2, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET user_type = 'super_admin', is_active = TRUE, updated_at = $2
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, UserWithProfile>(&format!("{} WHERE u.id = $1", USER_SELECT))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_filter_sql() {
        let filter = UserFilter {
            user_type: Some(UserType::Normal),
            is_active: Some(false),
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM users u WHERE TRUE");
        filter.push_conditions(&mut builder);
        let sql = builder.sql();
        assert!(sql.starts_with("SELECT 1 FROM users u WHERE TRUE AND (CASE WHEN u.id IS NULL"));
        assert!(sql.ends_with("END) = $1 AND u.is_active = $2"));
    }

    #[test]
    fn test_user_type_change_syncs_superuser_flag() {
        assert_eq!(superuser_flag(Some(UserType::Normal)), Some(false));
        assert_eq!(superuser_flag(Some(UserType::Admin)), Some(false));
        assert_eq!(superuser_flag(Some(UserType::SuperAdmin)), Some(true));
        assert_eq!(superuser_flag(None), None);
    }

    #[test]
    fn test_default_search_covers_names() {
        let query = ListQuery {
            search_query: Some("ali".to_string()),
            ..Default::default()
        };
        let search = USER_LIST_SPEC.resolve_search(&query).unwrap().unwrap();
        assert!(search.columns.contains(&"u.first_name"));
        assert_eq!(search.pattern, "%ali%");
    }
}
