//! Article model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Comment, Tag, User};
use crate::validation::validate_required;

/// Article aggregate
///
/// `tags` and `comments` set on an unsaved article are written together with
/// it. `author` and `tags` are hydrated on reads, `comments` are loaded
/// separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub body: String,
    pub author_id: i64,
    pub author: Option<User>,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
    pub favorites_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn new(title: &str, description: &str, body: &str, author_id: i64) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            body: body.to_string(),
            author_id,
            ..Self::default()
        }
    }

    /// Attach tags by name
    pub fn with_tags(mut self, names: &[&str]) -> Self {
        self.tags.extend(names.iter().map(|name| Tag::new(name)));
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|tag| tag.name.as_str()).collect()
    }

    /// Apply an edit. Empty arguments leave the field untouched.
    pub fn overwrite(&mut self, title: &str, description: &str, body: &str) {
        if !title.is_empty() {
            self.title = title.to_string();
        }
        if !description.is_empty() {
            self.description = description.to_string();
        }
        if !body.is_empty() {
            self.body = body.to_string();
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_required("Title", &self.title)?;
        validate_required("Body", &self.body)?;
        if self.author_id <= 0 {
            return Err("Article author is required".to_string());
        }
        for tag in &self.tags {
            if tag.id <= 0 {
                validate_required("Tag name", &tag.name)?;
            }
        }
        Ok(())
    }
}
