//! Patch application.
//!
//! A patch is an ordered list of JSON Patch style operations against the
//! flat villa object. Operations are applied to a copy; a failing operation
//! is recorded and skipped so every problem in the document is reported at
//! once. The caller commits the candidate only when no violation was found.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FieldViolation;
use crate::model::Villa;
use crate::validation::field_violations;

/// Patch operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Copy,
    Move,
    Test,
}

/// One operation of a patch document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// Patchable villa attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Name,
    Details,
    Amenity,
    ImageUrl,
    Occupancy,
    Rate,
    Sqft,
}

impl Field {
    fn parse(path: &str) -> Option<Self> {
        let name = path.strip_prefix('/')?.to_ascii_lowercase();
        let field = match name.as_str() {
            "id" => Self::Id,
            "name" => Self::Name,
            "details" => Self::Details,
            "amenity" => Self::Amenity,
            "imageurl" | "image_url" => Self::ImageUrl,
            "occupancy" => Self::Occupancy,
            "rate" => Self::Rate,
            "sqft" => Self::Sqft,
            _ => return None,
        };
        Some(field)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Details => "details",
            Self::Amenity => "amenity",
            Self::ImageUrl => "imageUrl",
            Self::Occupancy => "occupancy",
            Self::Rate => "rate",
            Self::Sqft => "sqft",
        }
    }

    fn get(self, villa: &Villa) -> Value {
        match self {
            Self::Id => Value::from(villa.id.value()),
            Self::Name => Value::from(villa.name.clone()),
            Self::Details => Value::from(villa.details.clone()),
            Self::Amenity => Value::from(villa.amenity.clone()),
            Self::ImageUrl => Value::from(villa.image_url.clone()),
            Self::Occupancy => Value::from(villa.occupancy),
            Self::Rate => Value::from(villa.rate),
            Self::Sqft => Value::from(villa.sqft),
        }
    }

    fn set(self, villa: &mut Villa, value: &Value) -> Result<(), String> {
        match self {
            Self::Id => return Err("id is immutable".to_string()),
            Self::Name => villa.name = text(value)?,
            Self::Details => villa.details = text(value)?,
            Self::Amenity => villa.amenity = text(value)?,
            Self::ImageUrl => villa.image_url = text(value)?,
            Self::Occupancy => villa.occupancy = integer(value)?,
            Self::Rate => villa.rate = number(value)?,
            Self::Sqft => villa.sqft = integer(value)?,
        }
        Ok(())
    }

    fn reset(self, villa: &mut Villa) -> Result<(), String> {
        match self {
            Self::Id => return Err("id is immutable".to_string()),
            Self::Name => villa.name.clear(),
            Self::Details => villa.details.clear(),
            Self::Amenity => villa.amenity.clear(),
            Self::ImageUrl => villa.image_url.clear(),
            Self::Occupancy => villa.occupancy = 0,
            Self::Rate => villa.rate = 0.0,
            Self::Sqft => villa.sqft = 0,
        }
        Ok(())
    }

    fn matches(self, villa: &Villa, expected: &Value) -> bool {
        match self {
            Self::Id | Self::Occupancy | Self::Sqft | Self::Rate => {
                match (self.get(villa).as_f64(), expected.as_f64()) {
                    (Some(actual), Some(expected)) => actual == expected,
                    _ => false,
                }
            }
            _ => self.get(villa) == *expected,
        }
    }
}

fn text(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "must be a string".to_string())
}

fn integer(value: &Value) -> Result<i32, String> {
    // Whole floats such as `5.0` count as integers; `5.5` does not.
    let whole = value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64)
            .map(|n| n as i64)
    });
    whole
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| "must be a 32-bit integer".to_string())
}

fn number(value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| "must be a number".to_string())
}

fn resolve(path: &str) -> Result<Field, FieldViolation> {
    Field::parse(path).ok_or_else(|| FieldViolation::new(path, "unknown field"))
}

fn apply_one(candidate: &mut Villa, operation: &PatchOperation) -> Result<(), FieldViolation> {
    let target = resolve(&operation.path)?;
    let violation = |message: String| FieldViolation::new(target.as_str(), message);

    match operation.op {
        PatchOp::Add | PatchOp::Replace => {
            let value = operation
                .value
                .as_ref()
                .ok_or_else(|| violation("value is required".to_string()))?;
            target.set(candidate, value).map_err(violation)
        }
        PatchOp::Remove => target.reset(candidate).map_err(violation),
        PatchOp::Test => {
            let value = operation
                .value
                .as_ref()
                .ok_or_else(|| violation("value is required".to_string()))?;
            if target.matches(candidate, value) {
                Ok(())
            } else {
                Err(violation(format!(
                    "test failed: expected {value}, found {}",
                    target.get(candidate)
                )))
            }
        }
        PatchOp::Copy | PatchOp::Move => {
            let from = operation
                .from
                .as_deref()
                .ok_or_else(|| violation("from is required".to_string()))?;
            let source = resolve(from)?;
            if source == target {
                return Ok(());
            }

            let value = source.get(candidate);
            target.set(candidate, &value).map_err(violation)?;
            if operation.op == PatchOp::Move {
                source
                    .reset(candidate)
                    .map_err(|message| FieldViolation::new(source.as_str(), message))?;
            }
            Ok(())
        }
    }
}

/// Apply `operations` in order to a copy of `current`.
///
/// Returns the patched villa, or every violation found: one per failing
/// operation plus any field constraint the result breaks.
pub fn apply_patch(
    current: &Villa,
    operations: &[PatchOperation],
) -> Result<Villa, Vec<FieldViolation>> {
    let mut candidate = current.clone();
    let mut violations = Vec::new();

    for operation in operations {
        let mut attempt = candidate.clone();
        match apply_one(&mut attempt, operation) {
            Ok(()) => candidate = attempt,
            Err(violation) => violations.push(violation),
        }
    }

    let (_, fields) = candidate.clone().into_parts();
    violations.extend(field_violations(&fields));

    if violations.is_empty() {
        Ok(candidate)
    } else {
        Err(violations)
    }
}
