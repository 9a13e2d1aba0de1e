//! Custom error types for the token service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failures while minting or verifying bearer tokens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No signing secret was configured
    #[error("JWT secret is not configured")]
    SecretMissing,

    /// Tokens can only be minted for persisted users
    #[error("User id must be greater than zero")]
    InvalidUserId,

    #[error("Failed to sign token: {0}")]
    SigningFailed(String),

    /// The request carried no authorization value
    #[error("Authorization token is missing")]
    MissingToken,

    #[error("Authorization token is malformed")]
    MalformedToken,

    #[error("Token has expired")]
    Expired,

    /// `nbf` lies in the future
    #[error("Token is not valid yet")]
    NotYetValid,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token claims are unreadable: {0}")]
    ClaimsUnreadable(String),
}

impl TokenError {
    /// Whether the failure is the caller's fault rather than the server's
    pub fn is_unauthorized(&self) -> bool {
        !matches!(
            self,
            TokenError::SecretMissing | TokenError::SigningFailed(_) | TokenError::InvalidUserId
        )
    }
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let status = if self.is_unauthorized() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for token results
pub type TokenResult<T> = Result<T, TokenError>;
