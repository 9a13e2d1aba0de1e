//! User repository for database operations

use conduit_common::Database;
use sqlx::{AnyPool, Row};
use tracing::{debug, info};

use super::{USER_COLUMNS, insert_user, now_millis, timestamp, user_from_row};
use crate::error::{StoreError, StoreResult};
use crate::models::User;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: AnyPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    /// Persist an unsaved user, filling in its id and timestamps
    pub async fn create(&self, user: &mut User) -> StoreResult<()> {
        user.validate().map_err(StoreError::Validation)?;
        info!("Creating new user: {}", user.username);

        let now = now_millis();
        let mut conn = self.pool.acquire().await?;
        let id = insert_user(&mut conn, user, now).await?;

        user.id = id;
        user.created_at = timestamp(now);
        user.updated_at = timestamp(now);
        user.deleted_at = None;
        Ok(())
    }

    /// Write every mutable field of a persisted user
    pub async fn update(&self, user: &mut User) -> StoreResult<()> {
        user.validate().map_err(StoreError::Validation)?;
        if !user.is_persisted() {
            return Err(StoreError::NotFound);
        }
        info!("Updating user: {}", user.id);

        let now = now_millis();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $1, email = $2, password_hash = $3, bio = $4, image = $5, updated_at = $6
            WHERE id = $7 AND deleted_at IS NULL
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.bio)
        .bind(&user.image)
        .bind(now)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        user.updated_at = timestamp(now);
        Ok(())
    }

    /// Find a user by ID
    pub async fn get_by_id(&self, id: i64) -> StoreResult<User> {
        self.find_one("id", FindBy::Id(id)).await
    }

    /// Find a user by email
    pub async fn get_by_email(&self, email: &str) -> StoreResult<User> {
        self.find_one("email", FindBy::Text(email)).await
    }

    /// Find a user by username
    pub async fn get_by_username(&self, username: &str) -> StoreResult<User> {
        self.find_one("username", FindBy::Text(username)).await
    }

    async fn find_one(&self, column: &str, value: FindBy<'_>) -> StoreResult<User> {
        debug!("Finding user by {}", column);

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE {column} = $1 AND deleted_at IS NULL ORDER BY id LIMIT 1"
        );
        let query = sqlx::query(&sql);
        let query = match value {
            FindBy::Id(id) => query.bind(id),
            FindBy::Text(text) => query.bind(text),
        };

        let row = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(user_from_row(&row, "")?)
    }

    /// Record that `follower` follows `followed`. Following twice is a no-op.
    pub async fn follow(&self, follower: &User, followed: &User) -> StoreResult<()> {
        check_pair(follower, followed)?;
        if follower.id == followed.id {
            return Err(StoreError::Validation(
                "Users cannot follow themselves".to_string(),
            ));
        }
        info!("User {} follows {}", follower.id, followed.id);

        sqlx::query(
            r#"
            INSERT INTO follows (from_user_id, to_user_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(follower.id)
        .bind(followed.id)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a follow edge. Removing a missing edge is not an error.
    pub async fn unfollow(&self, follower: &User, followed: &User) -> StoreResult<()> {
        check_pair(follower, followed)?;
        info!("User {} unfollows {}", follower.id, followed.id);

        sqlx::query("DELETE FROM follows WHERE from_user_id = $1 AND to_user_id = $2")
            .bind(follower.id)
            .bind(followed.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Whether `follower` follows `followed`. Unsaved users follow nobody.
    pub async fn is_following(&self, follower: &User, followed: &User) -> StoreResult<bool> {
        if !follower.is_persisted() || !followed.is_persisted() {
            return Ok(false);
        }

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE from_user_id = $1 AND to_user_id = $2",
        )
        .bind(follower.id)
        .bind(followed.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Ids of every live user `user` follows, ascending
    pub async fn get_following_user_ids(&self, user: &User) -> StoreResult<Vec<i64>> {
        if !user.is_persisted() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT f.to_user_id
            FROM follows f
            JOIN users u ON u.id = f.to_user_id
            WHERE f.from_user_id = $1 AND u.deleted_at IS NULL
            ORDER BY f.to_user_id
            "#,
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await?;

        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("to_user_id"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

enum FindBy<'a> {
    Id(i64),
    Text(&'a str),
}

fn check_pair(follower: &User, followed: &User) -> StoreResult<()> {
    if !follower.is_persisted() || !followed.is_persisted() {
        return Err(StoreError::Validation(
            "Both users must be saved before following".to_string(),
        ));
    }
    Ok(())
}
