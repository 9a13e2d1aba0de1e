//! Article repository for database operations
//!
//! Articles own their tag links, comments and favorites. Every multi-row write
//! runs in a single transaction so a failure leaves no partial state behind.

use conduit_common::Database;
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, AnyPool, Row};
use tracing::{debug, info, warn};

use super::{Param, SqlBuilder, now_millis, timestamp, user_from_row};
use crate::error::{StoreError, StoreResult};
use crate::models::{Article, Comment, Tag, User};
use crate::validation::{validate_page, validate_required};

const ARTICLE_SELECT: &str = r#"
    SELECT a.id, a.title, a.description, a.body, a.author_id, a.favorites_count,
           a.created_at, a.updated_at, a.deleted_at,
           u.id AS u_id, u.username AS u_username, u.email AS u_email,
           u.password_hash AS u_password_hash, u.bio AS u_bio, u.image AS u_image,
           u.created_at AS u_created_at, u.updated_at AS u_updated_at,
           u.deleted_at AS u_deleted_at
    FROM articles a
    JOIN users u ON u.id = a.author_id
    WHERE a.deleted_at IS NULL AND u.deleted_at IS NULL"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.body, c.author_id, c.article_id, c.created_at, c.updated_at, c.deleted_at,
           u.id AS u_id, u.username AS u_username, u.email AS u_email,
           u.password_hash AS u_password_hash, u.bio AS u_bio, u.image AS u_image,
           u.created_at AS u_created_at, u.updated_at AS u_updated_at,
           u.deleted_at AS u_deleted_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
    JOIN articles a ON a.id = c.article_id
    WHERE c.deleted_at IS NULL AND u.deleted_at IS NULL AND a.deleted_at IS NULL"#;

/// Optional filters for [`ArticleRepository::get_articles`]. All set filters
/// must match.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleFilter<'a> {
    pub tag_name: Option<&'a str>,
    pub author_username: Option<&'a str>,
    pub favorited_by: Option<&'a User>,
}

impl<'a> ArticleFilter<'a> {
    pub fn tag(mut self, name: &'a str) -> Self {
        self.tag_name = Some(name);
        self
    }

    pub fn author(mut self, username: &'a str) -> Self {
        self.author_username = Some(username);
        self
    }

    pub fn favorited_by(mut self, user: &'a User) -> Self {
        self.favorited_by = Some(user);
        self
    }
}

/// Article repository
#[derive(Clone)]
pub struct ArticleRepository {
    pool: AnyPool,
}

impl ArticleRepository {
    /// Create a new article repository
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    /// Persist an unsaved article together with its tags and comments
    ///
    /// Tags without an id reuse the oldest live tag of the same name or are
    /// created. On success the article, its tags and comments carry their
    /// generated ids and timestamps.
    pub async fn create(&self, article: &mut Article) -> StoreResult<()> {
        article.validate().map_err(StoreError::Validation)?;
        for comment in &article.comments {
            comment.validate().map_err(StoreError::Validation)?;
        }
        info!("Creating article: {}", article.title);

        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        let authors: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1 AND deleted_at IS NULL")
                .bind(article.author_id)
                .fetch_one(&mut *tx)
                .await?;
        if authors == 0 {
            warn!("Rolling back article create: author {} missing", article.author_id);
            return Err(StoreError::ForeignKey(format!(
                "author {} does not exist",
                article.author_id
            )));
        }

        let article_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO articles (title, description, body, author_id, favorites_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, $5, $5)
            RETURNING id
            "#,
        )
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.body)
        .bind(article.author_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut tags = Vec::with_capacity(article.tags.len());
        for tag in &article.tags {
            let stored = resolve_tag(&mut tx, tag, now).await?;
            sqlx::query(
                "INSERT INTO article_tags (article_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(article_id)
            .bind(stored.id)
            .execute(&mut *tx)
            .await?;
            tags.push(stored);
        }

        let mut comment_ids = Vec::with_capacity(article.comments.len());
        for comment in &article.comments {
            comment_ids.push(insert_comment(&mut tx, comment, article_id, now).await?);
        }

        tx.commit().await?;

        article.id = article_id;
        article.favorites_count = 0;
        article.created_at = timestamp(now);
        article.updated_at = timestamp(now);
        article.deleted_at = None;
        article.tags = tags;
        for (comment, id) in article.comments.iter_mut().zip(comment_ids) {
            comment.id = id;
            comment.article_id = article_id;
            comment.created_at = timestamp(now);
            comment.updated_at = timestamp(now);
        }
        Ok(())
    }

    /// Write the title, description and body of a live article
    pub async fn update(&self, article: &mut Article) -> StoreResult<()> {
        article.validate().map_err(StoreError::Validation)?;
        if !article.is_persisted() {
            return Err(StoreError::NotFound);
        }
        info!("Updating article: {}", article.id);

        let now = now_millis();
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET title = $1, description = $2, body = $3, updated_at = $4
            WHERE id = $5 AND deleted_at IS NULL
            "#,
        )
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.body)
        .bind(now)
        .bind(article.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        article.updated_at = timestamp(now);
        Ok(())
    }

    /// Soft-delete an article
    pub async fn delete(&self, article: &Article) -> StoreResult<()> {
        if !article.is_persisted() {
            return Err(StoreError::Validation(
                "Article must be saved before deleting".to_string(),
            ));
        }
        info!("Deleting article: {}", article.id);

        let now = now_millis();
        let result = sqlx::query(
            "UPDATE articles SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(article.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Fetch a live article with its author and tags
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Article> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("{ARTICLE_SELECT} AND a.id = $1");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(StoreError::NotFound)?;

        let mut article = article_from_row(&row)?;
        article.tags = load_tags(&mut conn, article.id).await?;
        Ok(article)
    }

    /// List live articles newest first
    ///
    /// With `favorited_by` set, the user's favorites are paged in insertion
    /// order first and the remaining filters apply within that page.
    pub async fn get_articles(
        &self,
        filter: &ArticleFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Article>> {
        validate_page(limit, offset).map_err(StoreError::Validation)?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        debug!(
            "Listing articles (tag: {:?}, author: {:?}, favorited: {})",
            filter.tag_name,
            filter.author_username,
            filter.favorited_by.is_some()
        );

        let mut conn = self.pool.acquire().await?;

        let favorite_ids = match filter.favorited_by {
            Some(user) => {
                if !user.is_persisted() {
                    return Ok(Vec::new());
                }
                let rows = sqlx::query(
                    r#"
                    SELECT f.article_id FROM favorite_articles f
                    JOIN articles a ON a.id = f.article_id
                    JOIN users u ON u.id = a.author_id
                    WHERE f.user_id = $1 AND a.deleted_at IS NULL AND u.deleted_at IS NULL
                    ORDER BY f.created_at, f.article_id
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(user.id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&mut *conn)
                .await?;
                let ids = rows
                    .iter()
                    .map(|row| row.try_get::<i64, _>("article_id"))
                    .collect::<Result<Vec<_>, _>>()?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                Some(ids)
            }
            None => None,
        };

        let mut builder = SqlBuilder::new(ARTICLE_SELECT);
        if let Some(tag_name) = filter.tag_name.filter(|name| !name.is_empty()) {
            builder
                .push(
                    " AND a.id IN (SELECT link.article_id FROM article_tags link \
                     JOIN tags t ON t.id = link.tag_id \
                     WHERE t.deleted_at IS NULL AND t.name = ",
                )
                .push_bind(Param::Text(tag_name.to_string()))
                .push(")");
        }
        if let Some(username) = filter.author_username.filter(|name| !name.is_empty()) {
            builder
                .push(" AND u.username = ")
                .push_bind(Param::Text(username.to_string()));
        }
        if let Some(ids) = &favorite_ids {
            builder.push(" AND a.id IN (").push_bind_list(ids).push(")");
        }
        builder
            .push(" ORDER BY a.created_at DESC, a.id DESC LIMIT ")
            .push_bind(Param::Int(limit));
        if favorite_ids.is_none() {
            builder.push(" OFFSET ").push_bind(Param::Int(offset));
        }

        let rows = builder.build().fetch_all(&mut *conn).await?;
        hydrate(&mut conn, rows).await
    }

    /// Live articles written by any of `author_ids`, newest first
    pub async fn get_feed_articles(
        &self,
        author_ids: &[i64],
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Article>> {
        validate_page(limit, offset).map_err(StoreError::Validation)?;
        if author_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        debug!("Loading feed for {} authors", author_ids.len());

        let mut conn = self.pool.acquire().await?;
        let mut builder = SqlBuilder::new(ARTICLE_SELECT);
        builder
            .push(" AND a.author_id IN (")
            .push_bind_list(author_ids)
            .push(") ORDER BY a.created_at DESC, a.id DESC LIMIT ")
            .push_bind(Param::Int(limit))
            .push(" OFFSET ")
            .push_bind(Param::Int(offset));

        let rows = builder.build().fetch_all(&mut *conn).await?;
        hydrate(&mut conn, rows).await
    }

    /// Mark `article` as a favorite of `user` and bump its counter
    ///
    /// Favoriting twice fails with `Duplicate` and changes nothing. On success
    /// `article.favorites_count` holds the stored count.
    pub async fn add_favorite(&self, article: &mut Article, user: &User) -> StoreResult<()> {
        check_favorite_pair(article, user)?;
        info!("User {} favorites article {}", user.id, article.id);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO favorite_articles (user_id, article_id, created_at) VALUES ($1, $2, $3)",
        )
        .bind(user.id)
        .bind(article.id)
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;

        let count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE articles SET favorites_count = favorites_count + 1
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING favorites_count
            "#,
        )
        .bind(article.id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(count) = count else {
            warn!("Rolling back favorite: article {} is gone", article.id);
            return Err(StoreError::NotFound);
        };

        tx.commit().await?;
        article.favorites_count = count;
        Ok(())
    }

    /// Remove a favorite. Removing a missing favorite leaves the count alone.
    pub async fn delete_favorite(&self, article: &mut Article, user: &User) -> StoreResult<()> {
        check_favorite_pair(article, user)?;
        info!("User {} unfavorites article {}", user.id, article.id);

        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM favorite_articles WHERE user_id = $1 AND article_id = $2")
            .bind(user.id)
            .bind(article.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let sql = if removed > 0 {
            r#"
            UPDATE articles SET favorites_count = favorites_count - 1
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING favorites_count
            "#
        } else {
            "SELECT favorites_count FROM articles WHERE id = $1 AND deleted_at IS NULL"
        };
        let count: Option<i64> = sqlx::query_scalar(sql)
            .bind(article.id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(count) = count else {
            warn!("Rolling back unfavorite: article {} is gone", article.id);
            return Err(StoreError::NotFound);
        };

        tx.commit().await?;
        article.favorites_count = count;
        Ok(())
    }

    /// Whether `user` has favorited `article`. Unsaved aggregates never match.
    pub async fn is_favorited(&self, article: &Article, user: &User) -> StoreResult<bool> {
        if !article.is_persisted() || !user.is_persisted() {
            return Ok(false);
        }

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM favorite_articles WHERE user_id = $1 AND article_id = $2",
        )
        .bind(user.id)
        .bind(article.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Persist a comment on a live article
    pub async fn create_comment(&self, comment: &mut Comment) -> StoreResult<()> {
        comment.validate().map_err(StoreError::Validation)?;
        info!("Creating comment on article {}", comment.article_id);

        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        let articles: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM articles WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(comment.article_id)
        .fetch_one(&mut *tx)
        .await?;
        if articles == 0 {
            return Err(StoreError::ForeignKey(format!(
                "article {} does not exist",
                comment.article_id
            )));
        }

        let id = insert_comment(&mut tx, comment, comment.article_id, now).await?;
        tx.commit().await?;

        comment.id = id;
        comment.created_at = timestamp(now);
        comment.updated_at = timestamp(now);
        comment.deleted_at = None;
        Ok(())
    }

    /// Soft-delete a comment
    pub async fn delete_comment(&self, comment: &Comment) -> StoreResult<()> {
        if !comment.is_persisted() {
            return Err(StoreError::Validation(
                "Comment must be saved before deleting".to_string(),
            ));
        }
        info!("Deleting comment: {}", comment.id);

        let now = now_millis();
        let result = sqlx::query(
            "UPDATE comments SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(comment.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Fetch a live comment with its author
    pub async fn get_comment_by_id(&self, id: i64) -> StoreResult<Comment> {
        let sql = format!("{COMMENT_SELECT} AND c.id = $1");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(comment_from_row(&row)?)
    }

    /// Live comments on `article` in creation order
    pub async fn get_comments(&self, article: &Article) -> StoreResult<Vec<Comment>> {
        if !article.is_persisted() {
            return Ok(Vec::new());
        }

        let sql = format!("{COMMENT_SELECT} AND c.article_id = $1 ORDER BY c.id");
        let rows = sqlx::query(&sql)
            .bind(article.id)
            .fetch_all(&self.pool)
            .await?;

        let comments = rows
            .iter()
            .map(comment_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    /// Every live tag, by id
    pub async fn get_tags(&self) -> StoreResult<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at, deleted_at
            FROM tags
            WHERE deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let tags = rows
            .iter()
            .map(tag_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }
}

fn check_favorite_pair(article: &Article, user: &User) -> StoreResult<()> {
    if !article.is_persisted() || !user.is_persisted() {
        return Err(StoreError::Validation(
            "Article and user must be saved before favoriting".to_string(),
        ));
    }
    Ok(())
}

/// Stored tag to link: the caller's tag by id, the oldest live tag of the
/// same name, or a freshly inserted one
async fn resolve_tag(conn: &mut AnyConnection, tag: &Tag, now: i64) -> StoreResult<Tag> {
    if tag.id > 0 {
        let row = sqlx::query(
            "SELECT id, name, created_at, updated_at, deleted_at FROM tags WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(tag.id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| StoreError::ForeignKey(format!("tag {} does not exist", tag.id)))?;
        return Ok(tag_from_row(&row)?);
    }
    validate_required("Tag name", &tag.name).map_err(StoreError::Validation)?;

    let existing = sqlx::query(
        r#"
        SELECT id, name, created_at, updated_at, deleted_at FROM tags
        WHERE name = $1 AND deleted_at IS NULL
        ORDER BY id LIMIT 1
        "#,
    )
    .bind(&tag.name)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(row) = existing {
        return Ok(tag_from_row(&row)?);
    }

    let id = sqlx::query_scalar(
        "INSERT INTO tags (name, created_at, updated_at) VALUES ($1, $2, $2) RETURNING id",
    )
    .bind(&tag.name)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(Tag {
        id,
        name: tag.name.clone(),
        created_at: timestamp(now),
        updated_at: timestamp(now),
        deleted_at: None,
    })
}

async fn insert_comment(
    conn: &mut AnyConnection,
    comment: &Comment,
    article_id: i64,
    now: i64,
) -> StoreResult<i64> {
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO comments (body, author_id, article_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING id
        "#,
    )
    .bind(&comment.body)
    .bind(comment.author_id)
    .bind(article_id)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

async fn load_tags(conn: &mut AnyConnection, article_id: i64) -> StoreResult<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.created_at, t.updated_at, t.deleted_at
        FROM tags t
        JOIN article_tags link ON link.tag_id = t.id
        WHERE link.article_id = $1 AND t.deleted_at IS NULL
        ORDER BY t.id
        "#,
    )
    .bind(article_id)
    .fetch_all(conn)
    .await?;

    let tags = rows
        .iter()
        .map(tag_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

/// Map article rows and attach their tags
async fn hydrate(conn: &mut AnyConnection, rows: Vec<AnyRow>) -> StoreResult<Vec<Article>> {
    let mut articles = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut article = article_from_row(row)?;
        article.tags = load_tags(conn, article.id).await?;
        articles.push(article);
    }
    Ok(articles)
}

fn article_from_row(row: &AnyRow) -> Result<Article, sqlx::Error> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        body: row.try_get("body")?,
        author_id: row.try_get("author_id")?,
        author: Some(user_from_row(row, "u_")?),
        tags: Vec::new(),
        comments: Vec::new(),
        favorites_count: row.try_get("favorites_count")?,
        created_at: timestamp(row.try_get("created_at")?),
        updated_at: timestamp(row.try_get("updated_at")?),
        deleted_at: row.try_get::<Option<i64>, _>("deleted_at")?.map(timestamp),
    })
}

fn comment_from_row(row: &AnyRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        body: row.try_get("body")?,
        author_id: row.try_get("author_id")?,
        author: Some(user_from_row(row, "u_")?),
        article_id: row.try_get("article_id")?,
        created_at: timestamp(row.try_get("created_at")?),
        updated_at: timestamp(row.try_get("updated_at")?),
        deleted_at: row.try_get::<Option<i64>, _>("deleted_at")?.map(timestamp),
    })
}

fn tag_from_row(row: &AnyRow) -> Result<Tag, sqlx::Error> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: timestamp(row.try_get("created_at")?),
        updated_at: timestamp(row.try_get("updated_at")?),
        deleted_at: row.try_get::<Option<i64>, _>("deleted_at")?.map(timestamp),
    })
}
