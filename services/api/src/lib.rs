//! Conduit stores
//!
//! Entities, the user and article repositories, and seeding, all backed by the
//! shared [`conduit_common::Database`] handle.

pub mod error;
pub mod models;
pub mod repositories;
pub mod seed;
pub mod validation;

pub use error::{SeedError, StoreError, StoreResult};
pub use models::{Article, Comment, PasswordError, Tag, User};
pub use repositories::{ArticleFilter, ArticleRepository, UserRepository};
