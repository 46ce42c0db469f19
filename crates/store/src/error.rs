use thiserror::Error;

/// Errors that can occur when interacting with the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record that must exist was not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A unique constraint was violated (e.g. duplicate email).
    #[error("Duplicate value for {field}")]
    UniqueViolation { field: String },

    /// The backend could not be reached. Safe to retry.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into a record.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true for connectivity failures that may succeed on retry.
    ///
    /// Business outcomes (not found, duplicates) are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Database(err) => matches!(
                err,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connectivity_errors_are_transient() {
        assert!(StoreError::Unavailable("down".to_string()).is_transient());
        assert!(StoreError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_transient());
        assert!(
            !StoreError::UniqueViolation {
                field: "email".to_string()
            }
            .is_transient()
        );
        assert!(
            !StoreError::NotFound {
                entity: "Product",
                id: "p-1".to_string()
            }
            .is_transient()
        );
    }
}
