//! Signed session tokens (compact JWS, HMAC-SHA256).
//!
//! Tokens are stateless bearer credentials: the server keeps no session table,
//! so a token stays valid until it expires or the signing key changes.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::claims::{Claims, validate_claims};
use crate::user::User;

/// Lifetime of a freshly issued token, in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;

const EXPECTED_ALG: &str = "HS256";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing secret is empty")]
    MissingSecret,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Verification seam used by request middleware.
pub trait TokenVerifier: Send + Sync {
    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError>;
}

/// Issues and verifies HS256 session tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Build a service around `secret`.
    ///
    /// An empty or whitespace-only secret is a fatal misconfiguration.
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.iter().all(u8::is_ascii_whitespace) {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` so callers can inject the clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    /// Service with the default one-hour token lifetime.
    pub fn with_default_ttl(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        Self::new(secret, default_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user`, valid from now for the configured TTL.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encoding(format!("expiry overflows with ttl {}", self.ttl)))?;

        let claims = Claims {
            user_id: user.id,
            login: user.login.clone(),
            role: user.role.clone(),
            issued_at: now,
            expires_at,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify a token against the current wall clock.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against an explicit clock reading.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let header = split_segments(token)?;
        ensure_expected_alg(header)?;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

pub fn default_ttl() -> Duration {
    Duration::seconds(DEFAULT_TOKEN_TTL_SECS)
}

impl TokenVerifier for TokenService {
    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        TokenService::verify_at(self, token, now)
    }
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &EXPECTED_ALG)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Require exactly `header.payload.signature`; returns the header segment.
fn split_segments(token: &str) -> Result<&str, TokenError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };
    if header.is_empty() || payload.is_empty() {
        return Err(TokenError::Malformed);
    }
    Ok(header)
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Reject any declared algorithm other than ours before touching the MAC.
fn ensure_expected_alg(header_segment: &str) -> Result<(), TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(header_segment)
        .map_err(|_| TokenError::Malformed)?;
    let header: RawHeader = serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;
    if header.alg != EXPECTED_ALG {
        return Err(TokenError::InvalidSignature);
    }
    Ok(())
}
