//! Database error types.

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to connect to the database.
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    /// Failed to execute a query.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// A SERIALIZABLE transaction lost a read/write conflict (SQLSTATE 40001).
    #[error("serialization failure: {0}")]
    SerializationFailure(#[source] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),

    /// Migration directory not found in the current environment.
    #[error("migration directory not found; tried {tried}. Last error: {last_error}. Run from repo root or services/villa-api.")]
    MigrationDirNotFound { tried: String, last_error: String },
}

impl DbError {
    /// Classify a query error, separating serialization failures that are
    /// safe to retry from everything else.
    pub fn from_query(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some(SERIALIZATION_FAILURE) {
                return DbError::SerializationFailure(err);
            }
        }
        DbError::Query(err)
    }

    /// Returns true if retrying the whole transaction may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::SerializationFailure(_))
    }
}

const SERIALIZATION_FAILURE: &str = "40001";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_retryable() {
        let err = DbError::from_query(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Query(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_serialization_failure_is_retryable() {
        assert!(DbError::SerializationFailure(sqlx::Error::PoolTimedOut).is_retryable());
    }
}
