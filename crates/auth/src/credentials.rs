//! Login credential checks.

use evently_core::UserId;

use crate::password::PasswordHasher;
use crate::token::AuthError;

/// What storage knows about a login identity.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user_id: UserId,
    pub email: String,
    pub password_digest: String,
}

impl core::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Decide a login attempt given the stored record (if any).
///
/// Unknown identity and wrong password both yield
/// [`AuthError::InvalidCredentials`]. With no record the password is still
/// checked against `decoy_digest`, so both failures cost one verification.
pub fn verify_credentials<H>(
    record: Option<&StoredCredentials>,
    supplied_password: &str,
    hasher: &H,
    decoy_digest: &str,
) -> Result<UserId, AuthError>
where
    H: PasswordHasher + ?Sized,
{
    match record {
        Some(record) if hasher.verify(supplied_password, &record.password_digest) => {
            Ok(record.user_id)
        }
        Some(_) => Err(AuthError::InvalidCredentials),
        None => {
            let _ = hasher.verify(supplied_password, decoy_digest);
            Err(AuthError::InvalidCredentials)
        }
    }
}
