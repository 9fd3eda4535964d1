//! Error types for the PostgreSQL storage backend.

use medrec_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// Errors specific to the PostgreSQL storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Query or connection failure reported by the driver.
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored row could not be turned back into a domain value.
    #[error("Corrupt row: {message}")]
    CorruptRow { message: String },
}

impl PostgresError {
    /// Creates a new corrupt row error.
    #[must_use]
    pub fn corrupt_row(message: impl Into<String>) -> Self {
        Self::CorruptRow {
            message: message.into(),
        }
    }
}

/// Maps a unique constraint name to the message shown to the client.
fn conflict_message(constraint: &str) -> Option<StorageError> {
    match constraint {
        "users_email_key" => Some(StorageError::conflict("User already exists")),
        "patients_owner_email_key" => Some(StorageError::duplicate("Patient", "email")),
        "patients_owner_phone_key" => Some(StorageError::duplicate("Patient", "phone")),
        "patients_owner_fullname_key" => Some(StorageError::duplicate("Patient", "fullname")),
        _ => None,
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Database(SqlxError::Database(db_err)) => {
                if db_err.is_unique_violation() {
                    return db_err
                        .constraint()
                        .and_then(conflict_message)
                        .unwrap_or_else(|| StorageError::conflict("Record already exists"));
                }
                if db_err.is_foreign_key_violation()
                    && db_err.constraint() == Some("diagnoses_patient_fkey")
                {
                    return StorageError::not_found("Patient", "referenced by diagnosis");
                }
                StorageError::internal(db_err.to_string())
            }
            PostgresError::Database(
                e @ (SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_)),
            ) => StorageError::connection_error(e.to_string()),
            PostgresError::Database(e) => StorageError::internal(e.to_string()),
            PostgresError::Migration(e) => StorageError::internal(format!("Migration error: {e}")),
            PostgresError::CorruptRow { message } => {
                StorageError::internal(format!("Corrupt row: {message}"))
            }
        }
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;
