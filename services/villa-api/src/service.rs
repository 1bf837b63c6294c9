//! Villa resource service.
//!
//! Orchestrates validation, identity allocation, patch application and the
//! store for each operation. Every failure comes back as a classified
//! [`VillaError`]; nothing here panics on bad input.

use std::sync::Arc;

use tracing::{error, info, warn};
use villa_id::VillaId;

use crate::error::VillaError;
use crate::model::{Villa, VillaDto};
use crate::patch::{apply_patch, PatchOperation};
use crate::store::{NameRule, StoreError, VillaStore};
use crate::validation::{require_id, Validator};

/// Behavior switches for the service.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Reject replace/patch renames that collide with another villa's name.
    pub unique_names_on_update: bool,
}

/// Entry point for villa operations, generic over the storage backend.
#[derive(Clone)]
pub struct VillaService {
    store: Arc<dyn VillaStore>,
    config: ServiceConfig,
}

impl VillaService {
    pub fn new(store: Arc<dyn VillaStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    /// The backing store.
    pub fn store(&self) -> &dyn VillaStore {
        self.store.as_ref()
    }

    fn name_rule(&self) -> NameRule {
        if self.config.unique_names_on_update {
            NameRule::Unique
        } else {
            NameRule::Shared
        }
    }

    fn validator(&self) -> Validator<'_> {
        Validator::new(self.store.as_ref(), self.config.unique_names_on_update)
    }

    /// All villas, in insertion order.
    pub async fn list(&self) -> Result<Vec<Villa>, VillaError> {
        self.store.list().await.map_err(storage_failure)
    }

    /// The villa at `id`.
    pub async fn get(&self, id: i64) -> Result<Villa, VillaError> {
        let id = require_id(id)?;
        self.store.get(id).await.map_err(|e| lookup_failure(id, e))
    }

    /// Create a villa from a payload without id.
    pub async fn create(&self, payload: Option<VillaDto>) -> Result<Villa, VillaError> {
        let fields = self.validator().validate_create(payload).await?;
        let name = fields.name.clone();

        // The store re-checks the name under its own lock, so a racing create
        // that passed validation still ends up as a conflict.
        let villa = self.store.insert(fields).await.map_err(|e| match e {
            StoreError::DuplicateName(_) => {
                error!(name = %name, "Villa name already exists");
                VillaError::from(e)
            }
            other => storage_failure(other),
        })?;

        info!(villa_id = %villa.id, name = %villa.name, "Villa created");
        Ok(villa)
    }

    /// Overwrite every mutable field of an existing villa.
    pub async fn replace(&self, id: i64, payload: Option<VillaDto>) -> Result<Villa, VillaError> {
        let (id, fields) = self.validator().validate_replace(id, payload).await?;
        let villa = self
            .store
            .replace(id, fields, self.name_rule())
            .await
            .map_err(|e| lookup_failure(id, e))?;

        info!(villa_id = %id, "Villa replaced");
        Ok(villa)
    }

    /// Apply a patch document to an existing villa.
    pub async fn patch(
        &self,
        id: i64,
        operations: Option<Vec<PatchOperation>>,
    ) -> Result<Villa, VillaError> {
        let validator = self.validator();
        let (current, operations) = validator.validate_patch(id, operations).await?;

        let candidate = apply_patch(&current, &operations).map_err(|violations| {
            warn!(
                villa_id = %current.id,
                violations = violations.len(),
                "Patch rejected"
            );
            VillaError::ValidationFailed(violations)
        })?;
        validator.validate_patched_name(&candidate).await?;

        let (id, fields) = candidate.into_parts();
        let villa = self
            .store
            .replace(id, fields, self.name_rule())
            .await
            .map_err(|e| lookup_failure(id, e))?;

        info!(villa_id = %id, operations = operations.len(), "Villa patched");
        Ok(villa)
    }

    /// Delete the villa at `id`.
    pub async fn delete(&self, id: i64) -> Result<(), VillaError> {
        let id = require_id(id)?;
        self.store
            .remove(id)
            .await
            .map_err(|e| lookup_failure(id, e))?;

        info!(villa_id = %id, "Villa deleted");
        Ok(())
    }
}

fn lookup_failure(id: VillaId, err: StoreError) -> VillaError {
    match err {
        StoreError::NotFound(_) => {
            warn!(villa_id = %id, "Villa was not found");
            VillaError::NotFound(id)
        }
        StoreError::DuplicateName(name) => {
            warn!(villa_id = %id, name = %name, "Villa name already exists");
            VillaError::Conflict { name }
        }
        other => storage_failure(other),
    }
}

fn storage_failure(err: StoreError) -> VillaError {
    error!(error = %err, "Villa store failure");
    VillaError::from(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryVillaStore;
    use serde_json::json;

    fn service() -> VillaService {
        VillaService::new(Arc::new(MemoryVillaStore::new()), ServiceConfig::default())
    }

    fn dto(name: &str) -> VillaDto {
        VillaDto {
            name: name.to_string(),
            sqft: 100,
            occupancy: 4,
            ..Default::default()
        }
    }

    fn ops(value: serde_json::Value) -> Option<Vec<PatchOperation>> {
        Some(serde_json::from_value(value).unwrap())
    }

    #[tokio::test]
    async fn test_lifecycle_scenario() {
        let svc = service();

        let created = svc.create(Some(dto("Pool View"))).await.unwrap();
        assert_eq!(created.id.value(), 1);

        let dup = svc.create(Some(dto("pool view"))).await.unwrap_err();
        assert!(matches!(dup, VillaError::Conflict { .. }));

        let fetched = svc.get(1).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.sqft, 100);
        assert_eq!(fetched.occupancy, 4);

        svc.delete(1).await.unwrap();
        assert!(matches!(svc.get(1).await.unwrap_err(), VillaError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_invalid_and_missing() {
        let svc = service();
        assert_eq!(svc.get(0).await.unwrap_err().code(), "invalid_villa_id");
        assert!(matches!(svc.get(999).await.unwrap_err(), VillaError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_then_get_preserves_fields() {
        let svc = service();
        let payload = VillaDto {
            details: "Sea breeze".to_string(),
            amenity: "Pool".to_string(),
            image_url: "https://img/1.png".to_string(),
            rate: 320.5,
            ..dto("Sea Villa")
        };
        let created = svc.create(Some(payload.clone())).await.unwrap();
        let fetched = svc.get(created.id.value()).await.unwrap();

        assert_eq!(fetched.name, payload.name);
        assert_eq!(fetched.details, payload.details);
        assert_eq!(fetched.amenity, payload.amenity);
        assert_eq!(fetched.image_url, payload.image_url);
        assert_eq!(fetched.rate, payload.rate);
    }

    #[tokio::test]
    async fn test_deleted_id_is_not_reused() {
        let svc = service();
        let first = svc.create(Some(dto("A"))).await.unwrap();
        svc.delete(first.id.value()).await.unwrap();
        let second = svc.create(Some(dto("B"))).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_deleted_name_can_be_reused() {
        let svc = service();
        let first = svc.create(Some(dto("A"))).await.unwrap();
        svc.delete(first.id.value()).await.unwrap();
        assert!(svc.create(Some(dto("a"))).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_invalid_and_missing() {
        let svc = service();
        assert_eq!(svc.delete(-1).await.unwrap_err().code(), "invalid_villa_id");
        assert!(matches!(svc.delete(3).await.unwrap_err(), VillaError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_replace_is_idempotent() {
        let svc = service();
        let created = svc.create(Some(dto("A"))).await.unwrap();
        let id = created.id.value();
        let payload = VillaDto {
            id,
            rate: 99.0,
            ..dto("A renamed")
        };

        svc.replace(id, Some(payload.clone())).await.unwrap();
        let once = svc.list().await.unwrap();
        svc.replace(id, Some(payload)).await.unwrap();
        let twice = svc.list().await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice[0].name, "A renamed");
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let svc = service();
        let payload = VillaDto { id: 5, ..dto("Nowhere") };
        assert!(matches!(
            svc.replace(5, Some(payload)).await.unwrap_err(),
            VillaError::NotFound(_)
        ));
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_mismatch_is_bad_request() {
        let svc = service();
        svc.create(Some(dto("A"))).await.unwrap();
        let payload = VillaDto { id: 2, ..dto("A") };
        assert_eq!(
            svc.replace(1, Some(payload)).await.unwrap_err().code(),
            "id_mismatch"
        );
    }

    #[tokio::test]
    async fn test_patch_commits_valid_candidate() {
        let svc = service();
        let created = svc.create(Some(dto("A"))).await.unwrap();
        let patched = svc
            .patch(
                created.id.value(),
                ops(json!([{ "op": "replace", "path": "/rate", "value": 150 }])),
            )
            .await
            .unwrap();
        assert_eq!(patched.rate, 150.0);
        assert_eq!(svc.get(created.id.value()).await.unwrap().rate, 150.0);
    }

    #[tokio::test]
    async fn test_invalid_patch_leaves_store_untouched() {
        let svc = service();
        let created = svc.create(Some(dto("A"))).await.unwrap();
        let err = svc
            .patch(
                created.id.value(),
                ops(json!([
                    { "op": "replace", "path": "/name", "value": "B" },
                    { "op": "replace", "path": "/sqft", "value": "big" }
                ])),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, VillaError::ValidationFailed(ref v) if v.len() == 1));
        assert_eq!(svc.get(created.id.value()).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_patch_failures() {
        let svc = service();
        assert_eq!(svc.patch(1, None).await.unwrap_err().code(), "missing_body");
        assert_eq!(
            svc.patch(0, Some(Vec::new())).await.unwrap_err().code(),
            "invalid_villa_id"
        );
        assert!(matches!(
            svc.patch(8, Some(Vec::new())).await.unwrap_err(),
            VillaError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_strict_patch_rename_conflicts() {
        let svc = VillaService::new(
            Arc::new(MemoryVillaStore::new()),
            ServiceConfig {
                unique_names_on_update: true,
            },
        );
        svc.create(Some(dto("A"))).await.unwrap();
        let b = svc.create(Some(dto("B"))).await.unwrap();

        let err = svc
            .patch(
                b.id.value(),
                ops(json!([{ "op": "replace", "path": "/name", "value": "A" }])),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VillaError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_strict_concurrent_renames_admit_one() {
        let svc = VillaService::new(
            Arc::new(MemoryVillaStore::new()),
            ServiceConfig {
                unique_names_on_update: true,
            },
        );
        let mut ids = Vec::new();
        for name in ["A", "B", "C", "D", "E", "F"] {
            ids.push(svc.create(Some(dto(name))).await.unwrap().id.value());
        }

        let mut handles = Vec::new();
        for id in ids {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.patch(
                    id,
                    ops(json!([{ "op": "replace", "path": "/name", "value": "Contested" }])),
                )
                .await
            }));
        }

        let mut renamed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => renamed += 1,
                Err(e) => assert!(matches!(e, VillaError::Conflict { .. })),
            }
        }
        assert_eq!(renamed, 1);
    }

    #[tokio::test]
    async fn test_names_stay_unique_across_creates() {
        let svc = service();
        for name in ["Pool View", "POOL VIEW", "Beach View", "beach view", "Garden"] {
            let _ = svc.create(Some(dto(name))).await;
        }

        let mut keys: Vec<_> = svc
            .list()
            .await
            .unwrap()
            .iter()
            .map(|v| v.name_key())
            .collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(total, 3);
    }
}
