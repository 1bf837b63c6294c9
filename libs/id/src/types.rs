//! Typed ID definitions.

use crate::IdError;

// =============================================================================
// Villa
// =============================================================================

/// Identifier of a stored villa.
///
/// Always strictly positive. The wire format uses `0` to mean "not yet
/// assigned", which is represented in typed code by the absence of a
/// `VillaId` rather than by a sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VillaId(i64);

impl VillaId {
    /// The first id handed out by an empty store.
    pub const FIRST: Self = Self(1);

    /// Creates a VillaId, rejecting zero and negative values.
    pub fn new(id: i64) -> Result<Self, IdError> {
        if id <= 0 {
            return Err(IdError::NotPositive(id));
        }
        Ok(Self(id))
    }

    /// Returns the underlying i64 value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Returns the id following this one.
    pub fn next(&self) -> Result<Self, IdError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(IdError::Exhausted(self.0))
    }

    /// Parses an ID from its decimal text form, as found in a URL path.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        let raw = s
            .parse::<i64>()
            .map_err(|_| IdError::NotANumber(s.to_string()))?;

        Self::new(raw)
    }
}

impl std::fmt::Display for VillaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for VillaId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<i64> for VillaId {
    type Error = IdError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<VillaId> for i64 {
    fn from(id: VillaId) -> Self {
        id.0
    }
}

impl serde::Serialize for VillaId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for VillaId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i64::deserialize(deserializer)?;
        Self::new(id).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Correlation id attached to every HTTP request and error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(crate::Ulid);

impl RequestId {
    /// The prefix for request ids.
    pub const PREFIX: &'static str = "req";

    /// Creates a new request id with a fresh ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(crate::Ulid::new())
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn ulid(&self) -> crate::Ulid {
        self.0
    }

    /// Parses a request id in the form `req_{ulid}`.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        let Some((prefix, ulid_str)) = s.split_once('_') else {
            return Err(IdError::MissingSeparator);
        };

        if prefix != Self::PREFIX {
            return Err(IdError::InvalidPrefix {
                expected: Self::PREFIX,
                actual: prefix.to_string(),
            });
        }

        let ulid = ulid_str
            .parse::<crate::Ulid>()
            .map_err(|e| IdError::InvalidUlid(e.to_string()))?;

        Ok(Self(ulid))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", Self::PREFIX, self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_villa_id_parse() {
        let id: VillaId = "42".parse().unwrap();
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_villa_id_rejects_zero() {
        let result: Result<VillaId, _> = "0".parse();
        assert_eq!(result.unwrap_err(), IdError::NotPositive(0));
    }

    #[test]
    fn test_villa_id_rejects_negative() {
        let err = VillaId::try_from(-3).unwrap_err();
        assert!(matches!(err, IdError::NotPositive(_)));
    }

    #[test]
    fn test_villa_id_rejects_text() {
        let result: Result<VillaId, _> = "abc".parse();
        assert!(matches!(result.unwrap_err(), IdError::NotANumber(_)));
    }

    #[test]
    fn test_villa_id_empty() {
        let result: Result<VillaId, _> = " ".parse();
        assert_eq!(result.unwrap_err(), IdError::Empty);
    }

    #[test]
    fn test_villa_id_json_is_number() {
        let id = VillaId::new(7).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let parsed: VillaId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_villa_id_json_rejects_zero() {
        let parsed: Result<VillaId, _> = serde_json::from_str("0");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_villa_id_next() {
        assert_eq!(VillaId::FIRST.next().unwrap().value(), 2);
    }

    #[test]
    fn test_villa_id_next_at_max_is_exhausted() {
        let last = VillaId::new(i64::MAX).unwrap();
        assert_eq!(last.next(), Err(IdError::Exhausted(i64::MAX)));
    }

    #[test]
    fn test_request_id_prefix() {
        let id = RequestId::new();
        assert!(id.to_string().starts_with("req_"));
    }

    #[test]
    fn test_request_id_roundtrip() {
        let id = RequestId::new();
        let parsed: RequestId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_request_id_invalid_prefix() {
        let result: Result<RequestId, _> = "org_01HV4Z2WQXKJNM8GPQY6VBKC3D".parse();
        assert!(matches!(
            result.unwrap_err(),
            IdError::InvalidPrefix { .. }
        ));
    }

    #[test]
    fn test_request_id_missing_separator() {
        let result: Result<RequestId, _> = "req01HV4Z2WQXKJNM8GPQY6VBKC3D".parse();
        assert_eq!(result.unwrap_err(), IdError::MissingSeparator);
    }

    proptest! {
        #[test]
        fn positive_ids_parse_from_their_display(raw in 1i64..=i64::MAX) {
            let id = VillaId::new(raw).unwrap();
            let parsed: VillaId = id.to_string().parse().unwrap();
            prop_assert_eq!(parsed, id);
        }

        #[test]
        fn non_positive_ids_are_rejected(raw in i64::MIN..=0i64) {
            prop_assert!(VillaId::new(raw).is_err());
        }
    }
}
