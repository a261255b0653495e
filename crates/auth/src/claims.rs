use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tablebook_core::UserId;

use crate::token::TokenError;
use crate::Role;

/// Session token claims.
///
/// Timestamps are carried as Unix seconds on the wire (`iat`/`exp`) so the
/// payload stays compatible with standard JWT tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal identifier.
    pub user_id: UserId,

    /// Login at the time the token was issued.
    pub login: String,

    /// Role at the time the token was issued.
    pub role: Role,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

/// Check the time window of already-authenticated claims.
///
/// A token is still valid at the exact second it expires; it is rejected once
/// `now` is strictly past `expires_at`.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenError::Malformed);
    }
    if now > claims.expires_at {
        return Err(TokenError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn claims_at(issued_at: DateTime<Utc>, ttl: Duration) -> Claims {
        Claims {
            user_id: UserId::new(1),
            login: "alice".to_string(),
            role: Role::USER,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn valid_inside_window() {
        let claims = claims_at(t0(), Duration::hours(1));
        assert_eq!(validate_claims(&claims, t0()), Ok(()));
        assert_eq!(validate_claims(&claims, t0() + Duration::minutes(59)), Ok(()));
        assert_eq!(validate_claims(&claims, t0() + Duration::hours(1)), Ok(()));
    }

    #[test]
    fn expired_after_window() {
        let claims = claims_at(t0(), Duration::hours(1));
        assert_eq!(
            validate_claims(&claims, t0() + Duration::hours(1) + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn inverted_window_is_malformed() {
        let claims = claims_at(t0(), Duration::zero());
        assert_eq!(validate_claims(&claims, t0()), Err(TokenError::Malformed));
    }

    #[test]
    fn wire_format_uses_unix_seconds() {
        let claims = claims_at(t0(), Duration::hours(1));
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["user_id"], 1);
        assert_eq!(json["login"], "alice");
        assert_eq!(json["role"], "user");
        assert_eq!(json["iat"], t0().timestamp());
        assert_eq!(json["exp"], (t0() + Duration::hours(1)).timestamp());
    }
}
