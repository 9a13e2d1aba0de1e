//! Shared fixtures for the store integration tests

#![allow(dead_code)]

use conduit_api::{Article, ArticleRepository, User, UserRepository};
use conduit_common::Database;

pub type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub struct Stores {
    pub database: Database,
    pub users: UserRepository,
    pub articles: ArticleRepository,
}

pub async fn stores() -> Stores {
    let database = Database::new_test_handle()
        .await
        .expect("Failed to open test database");
    Stores::new(database)
}

/// Unsaved user with a placeholder hash, skipping the cost of Argon2
pub fn new_user(username: &str) -> User {
    User {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "placeholder-hash".to_string(),
        ..User::default()
    }
}

impl Stores {
    pub fn new(database: Database) -> Self {
        Self {
            users: UserRepository::new(&database),
            articles: ArticleRepository::new(&database),
            database,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        let mut user = new_user(username);
        self.users
            .create(&mut user)
            .await
            .expect("Failed to create user");
        user
    }

    pub async fn article(&self, title: &str, author: &User, tags: &[&str]) -> Article {
        let mut article = Article::new(title, "", "body", author.id).with_tags(tags);
        self.articles
            .create(&mut article)
            .await
            .expect("Failed to create article");
        article
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar(sql)
            .fetch_one(self.database.pool())
            .await
            .expect("Failed to count rows")
    }
}
