//! Schema versioning utilities

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchemaError};

/// A schema version in the `major-minor-patch.revision` form
///
/// The `major.minor.patch` triple is a plain semantic version. The revision
/// counts non-structural edits (descriptions, defaults) that never change
/// the wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    /// Semantic version (e.g., "1.2.3")
    pub version: Version,
    /// Sub-revision, rendered after the dot
    pub revision: u64,
}

impl SchemaVersion {
    /// Create a new schema version
    pub fn new(major: u64, minor: u64, patch: u64, revision: u64) -> Self {
        Self {
            version: Version::new(major, minor, patch),
            revision,
        }
    }

    /// Parse `1-2-3.4` or `1-2-3` (revision 0)
    pub fn parse(version_str: &str) -> Result<Self> {
        let invalid = || SchemaError::InvalidVersion(version_str.to_string());

        let (triple, revision) = match version_str.split_once('.') {
            Some((triple, rev)) => (triple, parse_component(rev).ok_or_else(invalid)?),
            None => (version_str, 0),
        };

        let parts: Vec<&str> = triple.split('-').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut nums = [0u64; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = parse_component(part).ok_or_else(invalid)?;
        }

        Ok(Self::new(nums[0], nums[1], nums[2], revision))
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    /// Get the version string without revision (e.g., "1-2-3")
    pub fn triple_string(&self) -> String {
        format!(
            "{}-{}-{}",
            self.version.major, self.version.minor, self.version.patch
        )
    }

    /// Check if this is a major version bump from another version
    pub fn is_major_bump_from(&self, other: &SchemaVersion) -> bool {
        self.version.major > other.version.major
    }

    /// Bump major version
    pub fn bump_major(&self) -> Self {
        Self::new(self.version.major + 1, 0, 0, 0)
    }

    /// Bump minor version
    pub fn bump_minor(&self) -> Self {
        Self::new(self.version.major, self.version.minor + 1, 0, 0)
    }

    /// Bump patch version
    pub fn bump_patch(&self) -> Self {
        Self::new(
            self.version.major,
            self.version.minor,
            self.version.patch + 1,
            0,
        )
    }

    /// Bump revision only
    pub fn bump_revision(&self) -> Self {
        Self {
            version: self.version.clone(),
            revision: self.revision + 1,
        }
    }
}

fn parse_component(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0, 0)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.triple_string(), self.revision)
    }
}

impl FromStr for SchemaVersion {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<SchemaVersion> for String {
    fn from(v: SchemaVersion) -> Self {
        v.to_string()
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.version
            .cmp(&other.version)
            .then(self.revision.cmp(&other.revision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        let v = SchemaVersion::parse("1-2-3.4").unwrap();
        assert_eq!(v.major(), 1);
        assert_eq!(v.minor(), 2);
        assert_eq!(v.patch(), 3);
        assert_eq!(v.revision, 4);
        assert_eq!(v.to_string(), "1-2-3.4");
    }

    #[test]
    fn test_version_without_revision() {
        let v = SchemaVersion::parse("1-0-0").unwrap();
        assert_eq!(v.to_string(), "1-0-0.0");
    }

    #[test]
    fn test_invalid_versions() {
        for bad in ["", "1-0", "1.0.0", "1-0-0.", "a-b-c.d", "1-0-0.0.0", "-1-0-0.0"] {
            assert!(SchemaVersion::parse(bad).is_err(), "{} should fail", bad);
        }
    }

    #[test]
    fn test_version_ordering() {
        let a = SchemaVersion::parse("1-0-0.0").unwrap();
        let b = SchemaVersion::parse("1-0-0.1").unwrap();
        let c = SchemaVersion::parse("1-1-0.0").unwrap();
        let d = SchemaVersion::parse("2-0-0.0").unwrap();
        assert!(a < b && b < c && c < d);
        assert!(d.is_major_bump_from(&c));
    }

    #[test]
    fn test_version_bumps() {
        let v = SchemaVersion::parse("1-2-3.4").unwrap();
        assert_eq!(v.bump_major().to_string(), "2-0-0.0");
        assert_eq!(v.bump_minor().to_string(), "1-3-0.0");
        assert_eq!(v.bump_patch().to_string(), "1-2-4.0");
        assert_eq!(v.bump_revision().to_string(), "1-2-3.5");
    }

    #[test]
    fn test_version_serde() {
        let v = SchemaVersion::parse("3-1-0.2").unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"3-1-0.2\"");
        let back: SchemaVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
