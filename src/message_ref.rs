//! References to messages
//!
//! A message ref links one message to another (correlation, "links", etc.)
//! in the form `vendor:package:category:message:id#tag`, the tag being optional.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::schema_id::SchemaCurie;

/// Id used when a ref points at a kind rather than one instance
pub const NULL_ID: &str = "null";

static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_/.:-]+$").expect("ref id regex is valid"));

static TAG_SCRUB_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("ref tag regex is valid"));

/// A reference to one message instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    curie: Arc<SchemaCurie>,
    id: String,
    tag: Option<String>,
}

/// Array form of a message ref
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageRefParts {
    curie: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
}

impl MessageRef {
    /// Create a ref, normalizing the id and tag
    ///
    /// A blank id becomes `null`. The tag is lower-cased with every character
    /// outside `[\w.-]` replaced by `-`; an empty tag is dropped.
    pub fn new(curie: Arc<SchemaCurie>, id: &str, tag: Option<&str>) -> Result<Self> {
        let raw = format!("{}:{}", curie, id);

        if curie.is_mixin() {
            return Err(SchemaError::Logic(format!(
                "mixin [{}] cannot be used in a MessageRef",
                curie
            )));
        }

        let id = match id.trim() {
            "" => NULL_ID.to_string(),
            trimmed => trimmed.to_string(),
        };

        if !ID_REGEX.is_match(&id) {
            return Err(SchemaError::InvalidMessageRef {
                value: raw,
                reason: format!("id [{}] must match [\\w/.:-]+", id),
            });
        }

        let tag = tag
            .map(|t| TAG_SCRUB_REGEX.replace_all(t, "-").to_lowercase())
            .filter(|t| !t.is_empty());

        Ok(Self { curie, id, tag })
    }

    /// Parse a `curie:id#tag` string
    pub fn parse(value: &str) -> Result<Self> {
        let (reference, tag) = match value.split_once('#') {
            Some((reference, tag)) => (reference, Some(tag)),
            None => (value, None),
        };

        let mut parts: Vec<&str> = reference.splitn(5, ':').collect();
        let id = match parts.pop() {
            Some(id) if parts.len() == 4 => id,
            _ => {
                return Err(SchemaError::InvalidMessageRef {
                    value: value.to_string(),
                    reason: "expected the form vendor:package:category:message:id#tag".into(),
                })
            }
        };

        let curie = SchemaCurie::parse(&parts.join(":")).map_err(|e| {
            SchemaError::InvalidMessageRef {
                value: value.to_string(),
                reason: e.to_string(),
            }
        })?;

        Self::new(curie, id, tag)
    }

    /// Build a ref from its array form (`{curie, id, tag}`)
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let parts: MessageRefParts = serde_json::from_value(value.clone())?;
        let curie = SchemaCurie::parse(&parts.curie)?;
        Self::new(
            curie,
            parts.id.as_deref().unwrap_or(NULL_ID),
            parts.tag.as_deref(),
        )
    }

    /// Array form of this ref
    pub fn to_value(&self) -> serde_json::Value {
        let parts = MessageRefParts {
            curie: self.curie.to_string(),
            id: Some(self.id.clone()),
            tag: self.tag.clone(),
        };
        serde_json::to_value(parts).unwrap_or(serde_json::Value::Null)
    }

    pub fn curie(&self) -> &Arc<SchemaCurie> {
        &self.curie
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn has_id(&self) -> bool {
        self.id != NULL_ID
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn has_tag(&self) -> bool {
        self.tag.is_some()
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.curie, self.id)?;
        if let Some(tag) = &self.tag {
            write!(f, "#{}", tag)?;
        }
        Ok(())
    }
}
