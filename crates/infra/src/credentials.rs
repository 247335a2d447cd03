//! Login credential validation over a [`UserStore`].

use std::sync::{Arc, OnceLock};

use evently_auth::{AuthError, PasswordHasher, verify_credentials};
use evently_core::UserId;

use crate::store::UserStore;

const DECOY_PASSWORD: &str = "evently-decoy-password";

/// Checks a supplied email/password pair against stored digests.
///
/// Verification runs on the blocking pool. An unknown email is checked
/// against a decoy digest, hashed once on first use.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    decoy_digest: Arc<OnceLock<String>>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            users,
            hasher,
            decoy_digest: Arc::new(OnceLock::new()),
        }
    }

    /// Every failure, lookup errors included, is [`AuthError::InvalidCredentials`].
    pub async fn validate(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let record = match self.users.find_credentials_by_email(email.trim()).await {
            Ok(record) => record,
            Err(err) => {
                tracing::error!(error = %err, "credential lookup failed");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let hasher = Arc::clone(&self.hasher);
        let decoy_digest = Arc::clone(&self.decoy_digest);
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let decoy = decoy_digest.get_or_init(|| match hasher.hash(DECOY_PASSWORD) {
                Ok(digest) => digest,
                Err(err) => {
                    tracing::warn!(error = %err, "decoy digest unavailable");
                    String::new()
                }
            });
            verify_credentials(record.as_ref(), &password, hasher.as_ref(), decoy)
        })
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "credential check task failed");
            Err(AuthError::InvalidCredentials)
        })
    }
}

impl core::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}
