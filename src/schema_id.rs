//! Schema identifiers
//!
//! A schema id is a fully qualified, versioned name for one message schema:
//!
//! ```text
//! vendor:package:category:message:version
//!
//! acme:videos:event:video-uploaded:1-0-0.0
//! acme:users:command:register-user:1-1-0.2
//! acme:api.videos:request:get-video:1-0-0.0
//! acme:videos::video:1-0-0.0            (no category)
//! ```
//!
//! Dropping the version yields the curie (`vendor:package:category:message`),
//! which is what message refs point at. Parsed ids and curies are interned
//! per input string in process-wide caches.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::version::SchemaVersion;

/// Longest schema id accepted, in bytes
pub const MAX_SCHEMA_ID_LENGTH: usize = 255;

/// Pattern a schema id string must match
pub const SCHEMA_ID_PATTERN: &str =
    r"^([a-z0-9-]+):([a-z0-9\.-]+):([a-z0-9-]+)?:([a-z0-9-]+):([0-9]+-[0-9]+-[0-9]+\.[0-9]+)$";

/// Pattern a curie string must match
pub const CURIE_PATTERN: &str = r"^([a-z0-9-]+):([a-z0-9\.-]+):([a-z0-9-]+)?:([a-z0-9-]+)$";

/// Category reserved for composition-only schemas
pub const MIXIN_CATEGORY: &str = "mixin";

static SCHEMA_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SCHEMA_ID_PATTERN).expect("schema id regex is valid"));

static CURIE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CURIE_PATTERN).expect("curie regex is valid"));

static SCHEMA_IDS: LazyLock<RwLock<HashMap<String, Arc<SchemaId>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

static CURIES: LazyLock<RwLock<HashMap<String, Arc<SchemaCurie>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Read from an interning cache, tolerating a poisoned lock.
fn cached<T>(cache: &RwLock<HashMap<String, Arc<T>>>, key: &str) -> Option<Arc<T>> {
    let guard = cache.read().unwrap_or_else(|e| e.into_inner());
    guard.get(key).cloned()
}

/// Insert into an interning cache unless another caller won the race.
fn intern<T>(cache: &RwLock<HashMap<String, Arc<T>>>, key: &str, value: T) -> Arc<T> {
    let mut guard = cache.write().unwrap_or_else(|e| e.into_inner());
    Arc::clone(
        guard
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(value)),
    )
}

/// The version-less part of a schema id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaCurie {
    vendor: String,
    package: String,
    category: Option<String>,
    message: String,
}

impl SchemaCurie {
    /// Parse a `vendor:package:category:message` string
    pub fn parse(curie: &str) -> Result<Arc<SchemaCurie>> {
        if let Some(hit) = cached(&CURIES, curie) {
            return Ok(hit);
        }

        let caps = CURIE_REGEX
            .captures(curie)
            .ok_or_else(|| SchemaError::InvalidSchemaId {
                id: curie.to_string(),
                reason: format!("curie must match the pattern [{}]", CURIE_PATTERN),
            })?;

        let parsed = SchemaCurie {
            vendor: caps[1].to_string(),
            package: caps[2].to_string(),
            category: caps.get(3).map(|m| m.as_str().to_string()),
            message: caps[4].to_string(),
        };

        Ok(intern(&CURIES, curie, parsed))
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Mixins only compose other schemas and are never instantiated.
    pub fn is_mixin(&self) -> bool {
        self.category.as_deref() == Some(MIXIN_CATEGORY)
    }
}

impl fmt::Display for SchemaCurie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.vendor,
            self.package,
            self.category.as_deref().unwrap_or(""),
            self.message
        )
    }
}

impl Serialize for SchemaCurie {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A fully qualified, versioned schema identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaId {
    id: String,
    curie: Arc<SchemaCurie>,
    version: SchemaVersion,
}

impl SchemaId {
    /// Parse a schema id string
    ///
    /// Parsing the same string twice returns the same shared instance.
    pub fn parse(schema_id: &str) -> Result<Arc<SchemaId>> {
        if let Some(hit) = cached(&SCHEMA_IDS, schema_id) {
            return Ok(hit);
        }

        if schema_id.len() > MAX_SCHEMA_ID_LENGTH {
            return Err(SchemaError::InvalidSchemaId {
                id: schema_id.to_string(),
                reason: format!(
                    "schema id cannot be greater than {} bytes, {} given",
                    MAX_SCHEMA_ID_LENGTH,
                    schema_id.len()
                ),
            });
        }

        let caps = SCHEMA_ID_REGEX
            .captures(schema_id)
            .ok_or_else(|| SchemaError::InvalidSchemaId {
                id: schema_id.to_string(),
                reason: format!("schema id must match the pattern [{}]", SCHEMA_ID_PATTERN),
            })?;

        let curie_str = format!(
            "{}:{}:{}:{}",
            &caps[1],
            &caps[2],
            caps.get(3).map(|m| m.as_str()).unwrap_or(""),
            &caps[4]
        );
        let curie = SchemaCurie::parse(&curie_str)?;
        let version = SchemaVersion::parse(&caps[5])?;
        let id = format!("{}:{}", curie, version);

        Ok(intern(
            &SCHEMA_IDS,
            schema_id,
            SchemaId { id, curie, version },
        ))
    }

    /// Canonical string form
    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn curie(&self) -> &Arc<SchemaCurie> {
        &self.curie
    }

    /// Curie plus major version (e.g., `acme:videos:event:video-uploaded:v1`)
    pub fn curie_major(&self) -> String {
        format!("{}:v{}", self.curie, self.version.major())
    }

    pub fn vendor(&self) -> &str {
        self.curie.vendor()
    }

    pub fn package(&self) -> &str {
        self.curie.package()
    }

    pub fn category(&self) -> Option<&str> {
        self.curie.category()
    }

    pub fn message(&self) -> &str {
        self.curie.message()
    }

    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl Serialize for SchemaId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de> Deserialize<'de> for SchemaId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SchemaId::parse(&raw)
            .map(|id| (*id).clone())
            .map_err(serde::de::Error::custom)
    }
}
