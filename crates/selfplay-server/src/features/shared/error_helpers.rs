//! Database error handling utilities
//!
//! ```rust,ignore
//! sqlx::query("INSERT INTO networks ...")
//!     .execute(&mut *tx)
//!     .await
//!     .map_err(|e| map_unique_violation(e, UploadNetworkError::AlreadyExists(sha.clone()), UploadNetworkError::Database))?;
//! ```

use sqlx::Error as SqlxError;

/// Check if the error is a unique constraint violation
pub fn is_unique_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_unique_violation();
    }
    false
}

/// Check if the error is a foreign key violation
pub fn is_foreign_key_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_foreign_key_violation();
    }
    false
}

/// Return `unique_error` on a unique violation, otherwise wrap the error
pub fn map_unique_violation<E, F>(error: SqlxError, unique_error: E, default_wrapper: F) -> E
where
    F: FnOnce(SqlxError) -> E,
{
    if is_unique_violation(&error) {
        unique_error
    } else {
        default_wrapper(error)
    }
}
