//! Token service for the Conduit blogging backend
//!
//! Mints and verifies the bearer tokens that identify users, and resolves the
//! authenticated user id from request metadata.

pub mod context;
pub mod error;
pub mod extractor;
pub mod jwt;

pub use context::{AuthorizationSource, RequestContext};
pub use error::{TokenError, TokenResult};
pub use extractor::{AuthUser, MaybeUser};
pub use jwt::{Claims, TokenService, extract, generate, generate_at};
