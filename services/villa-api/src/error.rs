//! Failure taxonomy of the villa service.

use serde::Serialize;
use thiserror::Error;
use villa_id::VillaId;

use crate::store::StoreError;

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Classified outcome of a failed villa operation.
#[derive(Debug, Error)]
pub enum VillaError {
    /// Missing or malformed input.
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    /// Another villa already uses this name.
    #[error("villa with the name '{name}' already exists")]
    Conflict { name: String },

    /// No villa at the requested id.
    #[error("villa {0} not found")]
    NotFound(VillaId),

    /// One or more fields hold invalid values.
    #[error("validation failed for {} field(s)", .0.len())]
    ValidationFailed(Vec<FieldViolation>),

    /// Storage failure or broken invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VillaError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    /// Short machine-readable code for the failure class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. } => code,
            Self::Conflict { .. } => "villa_name_exists",
            Self::NotFound(_) => "villa_not_found",
            Self::ValidationFailed(_) => "validation_failed",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for VillaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::DuplicateName(name) => Self::Conflict { name },
            other => Self::Internal(other.to_string()),
        }
    }
}
