use crate::store::StoreError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Map a sqlx error into the storage taxonomy.
///
/// A unique violation becomes `Conflict`, a foreign-key violation names the
/// referenced row that vanished. Everything else is a backend failure.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => StoreError::Conflict(msg),
                Some(FOREIGN_KEY_VIOLATION) => missing_reference(db_err.constraint()),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// `events_user_id_fkey` and `registrations_user_id_fkey` point at users;
/// any other foreign key points at an event.
fn missing_reference(constraint: Option<&str>) -> StoreError {
    match constraint {
        Some(name) if name.ends_with("_user_id_fkey") => StoreError::UnknownUser,
        _ => StoreError::NotFound,
    }
}
