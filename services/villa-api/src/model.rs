//! Villa resource types.
//!
//! [`VillaDto`] is the wire representation accepted on create and replace;
//! its `id` is a raw integer where `0` means "not assigned yet".
//! [`Villa`] is the canonical stored form and always carries a real
//! [`VillaId`].

use serde::{Deserialize, Serialize};
use villa_id::VillaId;

/// Maximum length of a villa name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// A stored villa.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Villa {
    pub id: VillaId,
    pub name: String,
    pub details: String,
    pub amenity: String,
    pub image_url: String,
    pub occupancy: i32,
    pub rate: f64,
    pub sqft: i32,
}

/// Villa payload as sent by clients.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillaDto {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub amenity: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub occupancy: i32,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub sqft: i32,
}

/// The mutable attributes of a villa, without any identifier.
///
/// This is what a store receives on insert: the id is always allocated by
/// the store itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VillaFields {
    pub name: String,
    pub details: String,
    pub amenity: String,
    pub image_url: String,
    pub occupancy: i32,
    pub rate: f64,
    pub sqft: i32,
}

impl VillaFields {
    /// Attach an identifier, producing a stored villa.
    pub fn with_id(self, id: VillaId) -> Villa {
        Villa {
            id,
            name: self.name,
            details: self.details,
            amenity: self.amenity,
            image_url: self.image_url,
            occupancy: self.occupancy,
            rate: self.rate,
            sqft: self.sqft,
        }
    }

    /// Lowercased name used for uniqueness comparisons.
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }
}

impl From<VillaDto> for VillaFields {
    fn from(dto: VillaDto) -> Self {
        Self {
            name: dto.name,
            details: dto.details,
            amenity: dto.amenity,
            image_url: dto.image_url,
            occupancy: dto.occupancy,
            rate: dto.rate,
            sqft: dto.sqft,
        }
    }
}

impl Villa {
    /// Split into identifier and mutable fields.
    pub fn into_parts(self) -> (VillaId, VillaFields) {
        (
            self.id,
            VillaFields {
                name: self.name,
                details: self.details,
                amenity: self.amenity,
                image_url: self.image_url,
                occupancy: self.occupancy,
                rate: self.rate,
                sqft: self.sqft,
            },
        )
    }

    /// Lowercased name used for uniqueness comparisons.
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }
}

/// Case-insensitive comparison key for villa names.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}
