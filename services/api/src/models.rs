//! Domain aggregates owned by the stores

pub mod article;
pub mod comment;
pub mod tag;
pub mod user;

// Re-export for convenience
pub use article::Article;
pub use comment::Comment;
pub use tag::Tag;
pub use user::{PasswordError, User, hash_password};
