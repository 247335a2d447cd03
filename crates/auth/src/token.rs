//! Signed identity tokens (HS256 JWT).
//!
//! Verification failures carry a [`TokenError`] internally for logging, but
//! callers only ever see [`AuthError::InvalidToken`].

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use evently_core::UserId;

use crate::claims::{validate_claims, TokenClaims};

/// Scheme prefix required on the `Authorization` header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Caller-visible authentication failure.
///
/// Each variant has one fixed message no matter which internal check failed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Internal reason a token was rejected or could not be produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("authorization header does not carry a Bearer token")]
    MissingBearer,

    #[error("token rejected: {0}")]
    Decode(String),

    #[error("token has expired")]
    Expired,

    #[error("token could not be signed: {0}")]
    Encode(String),
}

/// Issues and verifies identity tokens.
pub trait TokenService: Send + Sync {
    /// Sign a token for `user_id`, valid for one hour from `now`.
    fn issue(&self, user_id: UserId, email: &str, now: DateTime<Utc>) -> Result<String, TokenError>;

    /// Verify a raw `Authorization` header value and return the subject.
    fn verify(&self, raw_header: &str, now: DateTime<Utc>) -> Result<UserId, AuthError>;
}

/// HMAC-SHA256 token service keyed by a process-wide secret.
///
/// Only `HS256` is accepted on verification; tokens signed with any other
/// algorithm (including other HMAC widths) are rejected.
#[derive(Clone)]
pub struct Hs256TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenService {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock in `validate_claims`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    fn decode(&self, raw_header: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let token = raw_header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TokenError::MissingBearer)?;

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| TokenError::Decode(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for Hs256TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenService").finish_non_exhaustive()
    }
}

impl TokenService for Hs256TokenService {
    fn issue(&self, user_id: UserId, email: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = TokenClaims::new(user_id, email, now);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    fn verify(&self, raw_header: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        match self.decode(raw_header, now) {
            Ok(claims) => Ok(claims.user_id),
            Err(reason) => {
                tracing::debug!(%reason, "token verification failed");
                Err(AuthError::InvalidToken)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn service() -> Hs256TokenService {
        Hs256TokenService::new(SECRET)
    }

    fn bearer(token: &str) -> String {
        format!("{BEARER_PREFIX}{token}")
    }

    #[test]
    fn issued_token_verifies_to_subject() {
        let svc = service();
        let token = svc.issue(UserId::new(1), "a@example.com", now()).unwrap();

        let subject = svc.verify(&bearer(&token), now() + Duration::minutes(59)).unwrap();
        assert_eq!(subject, UserId::new(1));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service();
        let token = svc.issue(UserId::new(1), "a@example.com", now()).unwrap();

        let at_expiry = now() + Duration::seconds(crate::claims::TOKEN_TTL_SECS);
        assert_eq!(svc.verify(&bearer(&token), at_expiry), Err(AuthError::InvalidToken));
    }

    #[test]
    fn missing_or_wrong_scheme_is_rejected() {
        let svc = service();
        let token = svc.issue(UserId::new(1), "a@example.com", now()).unwrap();

        let headers = [
            token.clone(),
            format!("Basic {token}"),
            format!("bearer {token}"),
            "Bearer ".to_string(),
            String::new(),
        ];
        for header in headers {
            assert_eq!(svc.verify(&header, now()), Err(AuthError::InvalidToken), "header: {header:?}");
        }
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = Hs256TokenService::new("other-secret")
            .issue(UserId::new(1), "a@example.com", now())
            .unwrap();

        assert_eq!(service().verify(&bearer(&token), now()), Err(AuthError::InvalidToken));
    }

    #[test]
    fn token_signed_with_other_hmac_width_is_rejected() {
        let claims = TokenClaims::new(UserId::new(1), "a@example.com", now());
        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let token = jsonwebtoken::encode(
                &Header::new(alg),
                &claims,
                &EncodingKey::from_secret(SECRET.as_bytes()),
            )
            .unwrap();

            assert_eq!(service().verify(&bearer(&token), now()), Err(AuthError::InvalidToken));
        }
    }

    #[test]
    fn token_without_subject_is_rejected() {
        let claims = json!({ "email": "a@example.com", "exp": now().timestamp() + 60 });
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(service().verify(&bearer(&token), now()), Err(AuthError::InvalidToken));
    }

    #[test]
    fn token_without_expiry_is_rejected() {
        let claims = json!({ "email": "a@example.com", "userId": 1 });
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(service().verify(&bearer(&token), now()), Err(AuthError::InvalidToken));
    }

    #[test]
    fn debug_output_hides_keys() {
        assert_eq!(format!("{:?}", service()), "Hs256TokenService { .. }");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        const BASE64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: verify(issue(u, e)) == u before expiry.
            #[test]
            fn round_trip_returns_subject(
                raw_id in 1i64..i64::MAX,
                email in "[a-z]{1,12}@[a-z]{1,12}\\.[a-z]{2,3}",
                elapsed in 0i64..crate::claims::TOKEN_TTL_SECS,
            ) {
                let svc = service();
                let token = svc.issue(UserId::new(raw_id), &email, now()).unwrap();
                let subject = svc.verify(&bearer(&token), now() + Duration::seconds(elapsed));
                prop_assert_eq!(subject, Ok(UserId::new(raw_id)));
            }

            /// Property: replacing any character of the token breaks verification.
            #[test]
            fn any_altered_character_is_detected(
                position in any::<prop::sample::Index>(),
                replacement in any::<prop::sample::Index>(),
            ) {
                let svc = service();
                let token = svc.issue(UserId::new(7), "a@example.com", now()).unwrap();

                let mut bytes = token.into_bytes();
                let at = position.index(bytes.len());
                let mut candidate = BASE64URL[replacement.index(BASE64URL.len())];
                if candidate == bytes[at] {
                    candidate = if candidate == b'A' { b'B' } else { b'A' };
                }
                bytes[at] = candidate;
                let tampered = String::from_utf8(bytes).unwrap();

                prop_assert_eq!(svc.verify(&bearer(&tampered), now()), Err(AuthError::InvalidToken));
            }
        }
    }
}
