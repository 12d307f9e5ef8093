//! Structural revision identifier of the persisted data format.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::migration::MigrationError;

/// An ordered `(major, minor, patch)` triple.
///
/// Ordering is lexicographic over the three components. Two equal versions
/// mean "no migration needed". Serializes as `"major.minor.patch"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SchemaVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `"major.minor.patch"`.
    ///
    /// Pre-release and build metadata are rejected: a schema version names a
    /// released store layout.
    pub fn parse(value: &str) -> Result<Self, MigrationError> {
        let parsed = semver::Version::parse(value.trim())
            .map_err(|_| MigrationError::invalid_schema_version(value))?;

        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(MigrationError::invalid_schema_version(value));
        }

        Ok(Self::new(parsed.major, parsed.minor, parsed.patch))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<SchemaVersion> for semver::Version {
    fn from(version: SchemaVersion) -> Self {
        semver::Version::new(version.major, version.minor, version.patch)
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let version = SchemaVersion::parse("2.10.3").unwrap();
        assert_eq!(version, SchemaVersion::new(2, 10, 3));
        assert_eq!(version.to_string(), "2.10.3");
    }

    #[test]
    fn test_ordering_is_numeric_per_component() {
        assert!(SchemaVersion::new(1, 2, 0) < SchemaVersion::new(1, 10, 0));
        assert!(SchemaVersion::new(1, 9, 9) < SchemaVersion::new(2, 0, 0));
        assert!(SchemaVersion::new(1, 0, 1) > SchemaVersion::new(1, 0, 0));
    }

    #[test]
    fn test_invalid_versions_are_rejected() {
        for raw in ["", "1.2", "1.2.x", "one.two.three", "1.2.3-beta.1", "1.2.3+build"] {
            let err = SchemaVersion::parse(raw).unwrap_err();
            assert_eq!(err, MigrationError::invalid_schema_version(raw), "{raw}");
        }
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&SchemaVersion::new(1, 4, 0)).unwrap();
        assert_eq!(json, "\"1.4.0\"");

        let back: SchemaVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SchemaVersion::new(1, 4, 0));
        assert!(serde_json::from_str::<SchemaVersion>("\"garbage\"").is_err());
    }
}
