//! Repositories for database operations
//!
//! Rows carry unix-millisecond timestamps and soft-deleted rows are filtered
//! out of every read.

use chrono::{DateTime, Utc};
use sqlx::any::{Any, AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{AnyConnection, Row};

use crate::models::User;

pub mod article;
pub mod user;

pub use article::{ArticleFilter, ArticleRepository};
pub use user::UserRepository;

/// Columns selected for a user, in the order `user_from_row` expects
pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password_hash, bio, image, created_at, updated_at, deleted_at";

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn timestamp(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn optional_timestamp(row: &AnyRow, column: &str) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    Ok(row.try_get::<Option<i64>, _>(column)?.map(timestamp))
}

/// Map a user row. `prefix` selects aliased columns from a join.
pub(crate) fn user_from_row(row: &AnyRow, prefix: &str) -> Result<User, sqlx::Error> {
    let column = |name: &str| format!("{prefix}{name}");

    Ok(User {
        id: row.try_get(column("id").as_str())?,
        username: row.try_get(column("username").as_str())?,
        email: row.try_get(column("email").as_str())?,
        password_hash: row.try_get(column("password_hash").as_str())?,
        bio: row.try_get(column("bio").as_str())?,
        image: row.try_get(column("image").as_str())?,
        created_at: timestamp(row.try_get(column("created_at").as_str())?),
        updated_at: timestamp(row.try_get(column("updated_at").as_str())?),
        deleted_at: optional_timestamp(row, &column("deleted_at"))?,
    })
}

/// Insert a user row and return the generated id
pub(crate) async fn insert_user(
    conn: &mut AnyConnection,
    user: &User,
    now: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO users (username, email, password_hash, bio, image, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING id
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(&user.image)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Bind value collected while building a dynamic statement
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Param {
    Int(i64),
    Text(String),
}

/// Incrementally assembled statement with numbered placeholders
#[derive(Debug, Clone)]
pub(crate) struct SqlBuilder {
    sql: String,
    params: Vec<Param>,
}

impl SqlBuilder {
    pub(crate) fn new(initial: &str) -> Self {
        Self {
            sql: initial.to_string(),
            params: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    pub(crate) fn push_bind(&mut self, param: Param) -> &mut Self {
        self.params.push(param);
        self.sql.push_str(&format!("${}", self.params.len()));
        self
    }

    /// Push a comma separated placeholder list for an `IN (...)` clause
    pub(crate) fn push_bind_list(&mut self, values: &[i64]) -> &mut Self {
        for (index, value) in values.iter().enumerate() {
            if index > 0 {
                self.sql.push_str(", ");
            }
            self.push_bind(Param::Int(*value));
        }
        self
    }

    #[cfg(test)]
    pub(crate) fn sql(&self) -> &str {
        &self.sql
    }

    pub(crate) fn build(&self) -> Query<'_, Any, AnyArguments<'_>> {
        let mut query = sqlx::query(&self.sql);
        for param in &self.params {
            query = match param {
                Param::Int(value) => query.bind(*value),
                Param::Text(value) => query.bind(value.clone()),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_builder_numbers_placeholders() {
        let mut builder = SqlBuilder::new("SELECT id FROM articles WHERE deleted_at IS NULL");
        builder
            .push(" AND title = ")
            .push_bind(Param::Text("dragons".to_string()))
            .push(" AND author_id IN (")
            .push_bind_list(&[3, 5, 8])
            .push(") LIMIT ")
            .push_bind(Param::Int(20));

        assert_eq!(
            builder.sql(),
            "SELECT id FROM articles WHERE deleted_at IS NULL AND title = $1 \
             AND author_id IN ($2, $3, $4) LIMIT $5"
        );
        assert_eq!(builder.params.len(), 5);
        assert_eq!(builder.params[4], Param::Int(20));
    }

    #[test]
    fn test_timestamp_round_trip() {
        let now = now_millis();
        assert_eq!(timestamp(now).timestamp_millis(), now);
        assert_eq!(timestamp(0), DateTime::<Utc>::default());
    }
}
