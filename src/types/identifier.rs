//! Opaque string identifiers

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, SchemaError};

/// Longest identifier accepted, in bytes
pub const MAX_IDENTIFIER_BYTES: usize = 255;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_/.:-]+$").expect("identifier regex is valid"));

/// A non-empty id made of `[\w/.:-]`, at most 255 bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.len() > MAX_IDENTIFIER_BYTES {
            return Err(SchemaError::validation(
                "identifier",
                &value,
                format!("must be at most {} bytes", MAX_IDENTIFIER_BYTES),
            ));
        }
        if !IDENTIFIER_REGEX.is_match(&value) {
            return Err(SchemaError::validation(
                "identifier",
                &value,
                "must match [\\w/.:-]+",
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
