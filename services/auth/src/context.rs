//! Request metadata carrying the bearer token
//!
//! The token service only ever reads the `authorization` key. Anything that
//! can hand out that value implements [`AuthorizationSource`]: the transport
//! neutral [`RequestContext`] used by RPC handlers, and HTTP header maps.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use std::collections::HashMap;

use crate::jwt::AUTH_SCHEME;

/// Metadata key holding `Token <token>`
pub const AUTHORIZATION_KEY: &str = "authorization";

/// Something that may carry an authorization value
pub trait AuthorizationSource {
    fn authorization(&self) -> Option<&str>;
}

/// Case-insensitive request metadata
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    metadata: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose authorization value is `Token <token>`
    pub fn with_token(token: &str) -> Self {
        let mut context = Self::new();
        context.insert(AUTHORIZATION_KEY, format!("{}{}", AUTH_SCHEME, token));
        context
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.metadata.insert(key.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl AuthorizationSource for RequestContext {
    fn authorization(&self) -> Option<&str> {
        self.get(AUTHORIZATION_KEY)
    }
}

impl AuthorizationSource for HeaderMap {
    fn authorization(&self) -> Option<&str> {
        self.get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_keys_are_case_insensitive() {
        let mut context = RequestContext::new();
        context.insert("Authorization", "Token abc");

        assert_eq!(context.get("AUTHORIZATION"), Some("Token abc"));
        assert_eq!(context.authorization(), Some("Token abc"));
        assert_eq!(RequestContext::new().authorization(), None);
    }

    #[test]
    fn test_header_map_source() {
        let mut headers = HeaderMap::new();
        assert_eq!(headers.authorization(), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(headers.authorization(), Some("Token abc"));
    }
}
