//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;
use crate::validation::validate_required;

/// Comment entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub author_id: i64,
    /// Hydrated on reads
    pub author: Option<User>,
    pub article_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn new(body: &str, author_id: i64, article_id: i64) -> Self {
        Self {
            body: body.to_string(),
            author_id,
            article_id,
            ..Self::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_required("Body", &self.body)?;
        if self.author_id <= 0 {
            return Err("Comment author is required".to_string());
        }
        Ok(())
    }
}
