//! In-memory villa store.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;
use villa_id::VillaId;

use super::{NameRule, StoreError, VillaStore};
use crate::allocator::IdAllocator;
use crate::model::{name_key, Villa, VillaFields};

struct Inner {
    villas: Vec<Villa>,
    allocator: IdAllocator,
}

/// Volatile store backed by a `Vec` behind a single `RwLock`.
///
/// Every mutation, including id allocation and the name check on insert,
/// happens under the write lock. Reads take the read lock and clone.
/// Clone-friendly via Arc.
#[derive(Clone)]
pub struct MemoryVillaStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for MemoryVillaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVillaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                villas: Vec::new(),
                allocator: IdAllocator::new(),
            })),
        }
    }

    /// Create a store holding the two demo villas.
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            // A fresh lock cannot be poisoned.
            let mut guard = store.inner.write().unwrap_or_else(|e| e.into_inner());
            let inner = &mut *guard;
            for fields in seed_villas() {
                let Ok(id) = inner.allocator.allocate(inner.villas.iter().map(|v| v.id)) else {
                    break;
                };
                inner.villas.push(fields.with_id(id));
            }
        }
        store
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}

fn seed_villas() -> Vec<VillaFields> {
    vec![
        VillaFields {
            name: "Pool View".to_string(),
            sqft: 100,
            occupancy: 4,
            ..Default::default()
        },
        VillaFields {
            name: "Beach View".to_string(),
            sqft: 300,
            occupancy: 3,
            ..Default::default()
        },
    ]
}

#[async_trait]
impl VillaStore for MemoryVillaStore {
    async fn list(&self) -> Result<Vec<Villa>, StoreError> {
        Ok(self.read()?.villas.clone())
    }

    async fn get(&self, id: VillaId) -> Result<Villa, StoreError> {
        self.read()?
            .villas
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Villa>, StoreError> {
        let key = name_key(name);
        Ok(self
            .read()?
            .villas
            .iter()
            .find(|v| v.name_key() == key)
            .cloned())
    }

    async fn insert(&self, fields: VillaFields) -> Result<Villa, StoreError> {
        let mut guard = self.write()?;
        let inner = &mut *guard;

        let key = fields.name_key();
        if inner.villas.iter().any(|v| v.name_key() == key) {
            return Err(StoreError::DuplicateName(fields.name));
        }

        let id = inner.allocator.allocate(inner.villas.iter().map(|v| v.id))?;
        let villa = fields.with_id(id);
        inner.villas.push(villa.clone());

        debug!(villa_id = %id, "Inserted villa into memory store");
        Ok(villa)
    }

    async fn replace(
        &self,
        id: VillaId,
        fields: VillaFields,
        names: NameRule,
    ) -> Result<Villa, StoreError> {
        let mut inner = self.write()?;
        let index = inner
            .villas
            .iter()
            .position(|v| v.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if names == NameRule::Unique {
            let key = fields.name_key();
            if inner.villas.iter().any(|v| v.id != id && v.name_key() == key) {
                return Err(StoreError::DuplicateName(fields.name));
            }
        }

        let villa = fields.with_id(id);
        inner.villas[index] = villa.clone();
        Ok(villa)
    }

    async fn remove(&self, id: VillaId) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let index = inner
            .villas
            .iter()
            .position(|v| v.id == id)
            .ok_or(StoreError::NotFound(id))?;

        // `remove` rather than `swap_remove` keeps insertion order.
        inner.villas.remove(index);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
