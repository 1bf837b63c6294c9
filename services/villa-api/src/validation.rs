//! Request validation.
//!
//! Checks run in a fixed order: absent payload, then ids, then field
//! constraints, then anything that needs the store (name uniqueness,
//! existence). A request that fails an earlier stage never reaches a later
//! one.

use tracing::{error, warn};
use villa_id::VillaId;

use crate::error::{FieldViolation, VillaError};
use crate::model::{Villa, VillaDto, VillaFields, MAX_NAME_LEN};
use crate::patch::PatchOperation;
use crate::store::VillaStore;

/// Convert a raw path id into a [`VillaId`].
pub fn require_id(raw: i64) -> Result<VillaId, VillaError> {
    VillaId::new(raw).map_err(|_| {
        error!(villa_id = raw, "Villa id is not valid");
        VillaError::bad_request("invalid_villa_id", format!("Id {raw} is not valid"))
    })
}

/// Field constraints shared by create, replace and patch.
pub fn field_violations(fields: &VillaFields) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if fields.name.trim().is_empty() {
        violations.push(FieldViolation::new("name", "name is required"));
    } else if fields.name.chars().count() > MAX_NAME_LEN {
        violations.push(FieldViolation::new(
            "name",
            format!("name cannot exceed {MAX_NAME_LEN} characters"),
        ));
    }

    if fields.occupancy < 0 {
        violations.push(FieldViolation::new(
            "occupancy",
            "occupancy must not be negative",
        ));
    }

    if !fields.rate.is_finite() || fields.rate < 0.0 {
        violations.push(FieldViolation::new(
            "rate",
            "rate must be a non-negative number",
        ));
    }

    if fields.sqft < 0 {
        violations.push(FieldViolation::new("sqft", "sqft must not be negative"));
    }

    violations
}

/// Fail with `ValidationFailed` if any field constraint is broken.
pub fn check_fields(fields: &VillaFields) -> Result<(), VillaError> {
    let violations = field_violations(fields);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(VillaError::ValidationFailed(violations))
    }
}

/// Structural checks for a create payload.
pub fn create_payload(payload: Option<VillaDto>) -> Result<VillaFields, VillaError> {
    let Some(dto) = payload else {
        return Err(VillaError::bad_request(
            "missing_body",
            "Villa payload is required",
        ));
    };

    if dto.id != 0 {
        error!(villa_id = dto.id, "Create request carried an id");
        return Err(VillaError::bad_request(
            "id_not_allowed",
            "Id must not be supplied when creating a villa",
        ));
    }

    let fields = VillaFields::from(dto);
    check_fields(&fields)?;
    Ok(fields)
}

/// Structural checks for a full replace payload.
pub fn replace_payload(
    path_id: i64,
    payload: Option<VillaDto>,
) -> Result<(VillaId, VillaFields), VillaError> {
    let Some(dto) = payload else {
        return Err(VillaError::bad_request(
            "missing_body",
            "Villa payload is required",
        ));
    };

    if dto.id != path_id {
        return Err(VillaError::bad_request(
            "id_mismatch",
            format!("Id {} in body does not match id {path_id} in path", dto.id),
        ));
    }

    let id = require_id(path_id)?;
    let fields = VillaFields::from(dto);
    check_fields(&fields)?;
    Ok((id, fields))
}

/// Structural checks for a patch request.
pub fn patch_request(
    path_id: i64,
    operations: Option<Vec<PatchOperation>>,
) -> Result<(VillaId, Vec<PatchOperation>), VillaError> {
    let Some(operations) = operations else {
        return Err(VillaError::bad_request(
            "missing_body",
            "Patch document is required",
        ));
    };

    let id = require_id(path_id)?;
    Ok((id, operations))
}

/// Validation that needs to look at the store.
pub struct Validator<'a> {
    store: &'a dyn VillaStore,
    unique_names_on_update: bool,
}

impl<'a> Validator<'a> {
    pub fn new(store: &'a dyn VillaStore, unique_names_on_update: bool) -> Self {
        Self {
            store,
            unique_names_on_update,
        }
    }

    /// Full create validation. Returns the fields to insert.
    pub async fn validate_create(
        &self,
        payload: Option<VillaDto>,
    ) -> Result<VillaFields, VillaError> {
        let fields = create_payload(payload)?;
        self.ensure_name_free(&fields.name, None).await?;
        Ok(fields)
    }

    /// Full replace validation. Returns the target id and new fields.
    pub async fn validate_replace(
        &self,
        path_id: i64,
        payload: Option<VillaDto>,
    ) -> Result<(VillaId, VillaFields), VillaError> {
        let (id, fields) = replace_payload(path_id, payload)?;
        if self.unique_names_on_update {
            self.ensure_name_free(&fields.name, Some(id)).await?;
        }
        Ok((id, fields))
    }

    /// Full patch validation. Returns the current villa and the operations.
    pub async fn validate_patch(
        &self,
        path_id: i64,
        operations: Option<Vec<PatchOperation>>,
    ) -> Result<(Villa, Vec<PatchOperation>), VillaError> {
        let (id, operations) = patch_request(path_id, operations)?;
        let current = self.store.get(id).await.inspect_err(|e| {
            if !e.is_backend_failure() {
                warn!(villa_id = %id, "Villa to patch was not found");
            }
        })?;
        Ok((current, operations))
    }

    /// Name uniqueness after a patch, when enabled.
    pub async fn validate_patched_name(&self, villa: &Villa) -> Result<(), VillaError> {
        if self.unique_names_on_update {
            self.ensure_name_free(&villa.name, Some(villa.id)).await?;
        }
        Ok(())
    }

    /// Fail with `Conflict` if another villa already uses `name`.
    async fn ensure_name_free(&self, name: &str, owner: Option<VillaId>) -> Result<(), VillaError> {
        match self.store.find_by_name(name).await? {
            Some(existing) if Some(existing.id) != owner => {
                error!(name = %name, existing_id = %existing.id, "Villa name already exists");
                Err(VillaError::Conflict {
                    name: name.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}
