//! JWT service for token generation and validation
//!
//! Tokens are compact three-segment JWS strings signed with HMAC-SHA-256.
//! They carry the user id as `sub` plus `iat`, `nbf` and `exp` (seconds since
//! the epoch) and stay valid for 72 hours. There is no revocation.
//!
//! The process-wide service reads `JWT_SECRET` once, on first use. Callers
//! that manage their own secret build a [`TokenService`] directly.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, error};

use crate::context::AuthorizationSource;
use crate::error::{TokenError, TokenResult};

/// Environment variable holding the signing secret
pub const SECRET_ENV: &str = "JWT_SECRET";

/// Authorization scheme prefix expected in request metadata
pub const AUTH_SCHEME: &str = "Token ";

/// Lifetime of a freshly minted token
pub const TOKEN_LIFETIME_HOURS: i64 = 72;

static GLOBAL: OnceLock<TokenService> = OnceLock::new();

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID, as a decimal string
    pub sub: String,
    /// Issued at time
    pub iat: i64,
    /// Not valid before
    pub nbf: i64,
    /// Expiration time
    pub exp: i64,
}

impl Claims {
    fn new(user_id: u64, issued_at: DateTime<Utc>, lifetime: Duration) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: user_id.to_string(),
            iat,
            nbf: iat,
            exp: (issued_at + lifetime).timestamp(),
        }
    }

    /// Numeric user id carried in `sub`
    pub fn user_id(&self) -> TokenResult<u64> {
        match self.sub.parse::<u64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(TokenError::ClaimsUnreadable(format!(
                "subject is not a user id: {:?}",
                self.sub
            ))),
        }
    }
}

/// JWT service
#[derive(Clone)]
pub struct TokenService {
    keys: Option<(EncodingKey, DecodingKey)>,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    /// Initialize a service signing with `secret`; `None` leaves it unconfigured
    pub fn new(secret: Option<&[u8]>) -> Self {
        let keys = secret.map(|secret| {
            (
                EncodingKey::from_secret(secret),
                DecodingKey::from_secret(secret),
            )
        });

        // Time claims are checked by hand against the caller's clock
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            keys,
            validation,
            lifetime: Duration::hours(TOKEN_LIFETIME_HOURS),
        }
    }

    /// Create a service from the `JWT_SECRET` environment variable
    ///
    /// An unset or empty variable yields a service whose every operation
    /// fails with [`TokenError::SecretMissing`].
    pub fn from_env() -> Self {
        let secret = std::env::var(SECRET_ENV)
            .ok()
            .filter(|secret| !secret.is_empty());
        if secret.is_none() {
            debug!("{} is not set; token operations will fail", SECRET_ENV);
        }
        Self::new(secret.as_deref().map(str::as_bytes))
    }

    /// Process-wide service, configured from the environment on first use
    pub fn global() -> &'static TokenService {
        GLOBAL.get_or_init(Self::from_env)
    }

    pub fn has_secret(&self) -> bool {
        self.keys.is_some()
    }

    /// Mint a token for `user_id` issued now
    pub fn generate(&self, user_id: u64) -> TokenResult<String> {
        self.generate_at(user_id, Utc::now())
    }

    /// Mint a token for `user_id` issued at `issued_at`
    pub fn generate_at(&self, user_id: u64, issued_at: DateTime<Utc>) -> TokenResult<String> {
        if user_id == 0 {
            return Err(TokenError::InvalidUserId);
        }
        let (encoding_key, _) = self.keys.as_ref().ok_or(TokenError::SecretMissing)?;

        let claims = Claims::new(user_id, issued_at, self.lifetime);
        encode(&Header::new(Algorithm::HS256), &claims, encoding_key)
            .map_err(|e| TokenError::SigningFailed(e.to_string()))
    }

    /// Verify `token` and check its time claims against `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> TokenResult<Claims> {
        let (_, decoding_key) = self.keys.as_ref().ok_or(TokenError::SecretMissing)?;

        if token.split('.').count() != 3 {
            return Err(TokenError::MalformedToken);
        }
        decode_header(token).map_err(|_| TokenError::MalformedToken)?;

        let claims = decode::<Claims>(token, decoding_key, &self.validation)
            .map_err(|e| {
                error!("Failed to validate token: {}", e);
                classify(e)
            })?
            .claims;

        let now = now.timestamp();
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        if claims.nbf > now {
            return Err(TokenError::NotYetValid);
        }

        Ok(claims)
    }

    /// Resolve the user id from the authorization value in `source`
    pub fn extract<S: AuthorizationSource + ?Sized>(&self, source: &S) -> TokenResult<u64> {
        self.extract_at(source, Utc::now())
    }

    /// [`TokenService::extract`] evaluated at `now`
    pub fn extract_at<S: AuthorizationSource + ?Sized>(
        &self,
        source: &S,
        now: DateTime<Utc>,
    ) -> TokenResult<u64> {
        let value = source.authorization().ok_or(TokenError::MissingToken)?;
        let token = value
            .strip_prefix(AUTH_SCHEME)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(TokenError::MalformedToken)?;

        self.verify_at(token, now)?.user_id()
    }
}

fn classify(error: jsonwebtoken::errors::Error) -> TokenError {
    match error.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => {
            TokenError::ClaimsUnreadable(error.to_string())
        }
        _ => TokenError::MalformedToken,
    }
}

/// Mint a token with the process-wide service
pub fn generate(user_id: u64) -> TokenResult<String> {
    TokenService::global().generate(user_id)
}

/// Mint a token issued at `issued_at` with the process-wide service
pub fn generate_at(user_id: u64, issued_at: DateTime<Utc>) -> TokenResult<String> {
    TokenService::global().generate_at(user_id, issued_at)
}

/// Resolve the authenticated user id with the process-wide service
pub fn extract<S: AuthorizationSource + ?Sized>(source: &S) -> TokenResult<u64> {
    TokenService::global().extract(source)
}
