use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use evently_core::UserId;

use crate::token::TokenError;

/// Validity window of an issued token.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// Claims carried by an identity token.
///
/// Wire shape: `{"email": string, "userId": number, "exp": unix-seconds}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub email: String,

    /// Subject identifier.
    #[serde(rename = "userId")]
    pub user_id: UserId,

    /// Expiration, seconds since the unix epoch.
    pub exp: i64,
}

impl TokenClaims {
    /// Claims for a token issued at `issued_at`, expiring one hour later.
    pub fn new(user_id: UserId, email: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            user_id,
            exp: issued_at.timestamp() + TOKEN_TTL_SECS,
        }
    }
}

/// Deterministically validate the time-bound part of the claims.
///
/// Signature verification happens before this, in [`crate::token`].
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}
