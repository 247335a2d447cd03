use thiserror::Error;

use evently_core::UserId;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Forbidden")]
    NotOwner,
}

/// Ownership gate: a mutation may proceed only when the acting subject is the
/// resource's recorded owner.
///
/// - No IO
/// - No panics
/// - `resource_owner` must come from a read made inside the same unit of work
///   as the write it guards
pub fn authorize_owner_action(subject: UserId, resource_owner: UserId) -> Result<(), AuthzError> {
    if subject == resource_owner {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}
