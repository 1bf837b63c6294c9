//! # villa-id
//!
//! Typed identifiers for the villa API.
//!
//! ## Design Principles
//!
//! - Villa ids are system-assigned; names are user-controlled labels
//! - A villa id is always a positive integer, so `0` can mean "unassigned"
//!   on the wire without leaking into typed code
//! - Request ids are opaque correlation tokens in the form `req_{ulid}`
//!
//! Examples:
//! - `42` (a [`VillaId`], serialized as a JSON number)
//! - `req_01HV4Z2WQXKJNM8GPQY6VBKC3D` (a [`RequestId`])

mod error;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
