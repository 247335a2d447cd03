//! `evently-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod password;
pub mod token;

pub use authorize::{authorize_owner_action, AuthzError};
pub use claims::{validate_claims, TokenClaims, TOKEN_TTL_SECS};
pub use credentials::{verify_credentials, StoredCredentials};
pub use password::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
pub use token::{AuthError, Hs256TokenService, TokenError, TokenService, BEARER_PREFIX};
