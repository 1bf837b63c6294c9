//! Store error types.

use thiserror::Error;
use villa_id::{IdError, VillaId};

use crate::db::DbError;

/// Errors returned by [`VillaStore`](super::VillaStore) backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No villa with this id exists.
    #[error("villa not found: {0}")]
    NotFound(VillaId),

    /// A villa with the same name (ignoring case) already exists.
    #[error("villa name already taken: {0}")]
    DuplicateName(String),

    /// The in-memory collection lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// No further id can be allocated.
    #[error(transparent)]
    Id(#[from] IdError),

    /// A stored row violates the villa model.
    #[error("corrupt villa row: {0}")]
    Corrupt(String),

    /// The durable backend failed.
    #[error(transparent)]
    Database(#[from] DbError),
}

impl StoreError {
    /// Returns true for failures of the backing store itself, as opposed to
    /// domain outcomes like a missing villa.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            StoreError::LockPoisoned
                | StoreError::Id(_)
                | StoreError::Corrupt(_)
                | StoreError::Database(_)
        )
    }
}
