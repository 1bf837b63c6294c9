//! Villa storage.
//!
//! [`VillaStore`] is the contract every backend satisfies:
//! - `list` returns villas in insertion order
//! - `insert` allocates the id and rejects case-insensitive name collisions
//!   atomically with the write
//! - `replace` and `remove` fail with [`StoreError::NotFound`] instead of
//!   writing to a missing row
//! - `replace` under [`NameRule::Unique`] checks the name atomically with
//!   the write
//!
//! Two backends ship: [`MemoryVillaStore`] (volatile) and
//! [`PgVillaStore`](crate::db::PgVillaStore) (Postgres).

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryVillaStore;

use async_trait::async_trait;
use villa_id::VillaId;

use crate::model::{Villa, VillaFields};

/// Name rule for [`VillaStore::replace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameRule {
    /// The new name may collide with another villa.
    #[default]
    Shared,
    /// No other villa may hold the name, ignoring case.
    Unique,
}

/// Authoritative collection of villas.
#[async_trait]
pub trait VillaStore: Send + Sync {
    /// Snapshot of all villas, in insertion order.
    async fn list(&self) -> Result<Vec<Villa>, StoreError>;

    /// Villa with exactly this id.
    async fn get(&self, id: VillaId) -> Result<Villa, StoreError>;

    /// Villa whose name matches `name` ignoring case, if any.
    async fn find_by_name(&self, name: &str) -> Result<Option<Villa>, StoreError>;

    /// Store a new villa under a freshly allocated id.
    async fn insert(&self, fields: VillaFields) -> Result<Villa, StoreError>;

    /// Overwrite every mutable field of the villa at `id`.
    async fn replace(
        &self,
        id: VillaId,
        fields: VillaFields,
        names: NameRule,
    ) -> Result<Villa, StoreError>;

    /// Delete the villa at `id`.
    async fn remove(&self, id: VillaId) -> Result<(), StoreError>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
