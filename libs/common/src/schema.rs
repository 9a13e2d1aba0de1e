//! Table definitions for the blogging schema
//!
//! Both backends share one logical schema. Identifier columns differ between
//! PostgreSQL and SQLite, everything else is written once. Timestamps are unix
//! milliseconds and every integer column is 64 bits wide.

use crate::database::Backend;

/// Ordered DDL statements for `backend`. Every statement is idempotent.
pub fn statements(backend: Backend) -> Vec<String> {
    let pk = match backend {
        Backend::Postgres => "BIGSERIAL PRIMARY KEY",
        Backend::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
    };

    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS users (
                id {pk},
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                bio TEXT NOT NULL DEFAULT '',
                image TEXT NOT NULL DEFAULT '',
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                deleted_at BIGINT
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS articles (
                id {pk},
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                body TEXT NOT NULL,
                author_id BIGINT NOT NULL REFERENCES users (id),
                favorites_count BIGINT NOT NULL DEFAULT 0 CHECK (favorites_count >= 0),
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                deleted_at BIGINT
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS tags (
                id {pk},
                name TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                deleted_at BIGINT
            )"
        ),
        "CREATE TABLE IF NOT EXISTS article_tags (
            article_id BIGINT NOT NULL REFERENCES articles (id),
            tag_id BIGINT NOT NULL REFERENCES tags (id),
            PRIMARY KEY (article_id, tag_id)
        )"
        .to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS comments (
                id {pk},
                body TEXT NOT NULL,
                author_id BIGINT NOT NULL REFERENCES users (id),
                article_id BIGINT NOT NULL REFERENCES articles (id),
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                deleted_at BIGINT
            )"
        ),
        "CREATE TABLE IF NOT EXISTS follows (
            from_user_id BIGINT NOT NULL REFERENCES users (id),
            to_user_id BIGINT NOT NULL REFERENCES users (id),
            created_at BIGINT NOT NULL,
            PRIMARY KEY (from_user_id, to_user_id),
            CHECK (from_user_id <> to_user_id)
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS favorite_articles (
            user_id BIGINT NOT NULL REFERENCES users (id),
            article_id BIGINT NOT NULL REFERENCES articles (id),
            created_at BIGINT NOT NULL,
            PRIMARY KEY (user_id, article_id)
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS idx_articles_author_id ON articles (author_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_comments_article_id ON comments (article_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_follows_from_user_id ON follows (from_user_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_favorite_articles_article_id ON favorite_articles (article_id)"
            .to_string(),
    ]
}
