//! Message schemas
//!
//! A [`Schema`] is the ordered, name-unique field set of one message kind,
//! identified by a versioned [`SchemaId`]. Schemas are immutable once built.
//!
//! Every schema starts with the reserved `_schema` field, which carries the
//! schema id of the message it belongs to. Fields contributed by [`Mixin`]s
//! follow the schema's own fields.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Result, SchemaError};
use crate::field::{Field, FieldBuilder};
use crate::schema_id::{SchemaCurie, SchemaId, SCHEMA_ID_PATTERN};
use crate::types::value::Value;
use crate::types::Type;

/// Name of the field holding a message's schema id
pub const SCHEMA_FIELD_NAME: &str = "_schema";

/// A composition-only field set shared by several schemas
#[derive(Debug, Clone)]
pub struct Mixin {
    id: Arc<SchemaId>,
    fields: Vec<Field>,
}

impl Mixin {
    /// Define a mixin; its id must be in the `mixin` category
    pub fn new(id: &str, fields: Vec<Field>) -> Result<Self> {
        let id = SchemaId::parse(id)?;
        if !id.curie().is_mixin() {
            return Err(SchemaError::Logic(format!(
                "schema [{}] is not a mixin, the category must be [mixin]",
                id
            )));
        }
        Ok(Self { id, fields })
    }

    pub fn id(&self) -> &Arc<SchemaId> {
        &self.id
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// The field set of one message kind
#[derive(Debug, Clone)]
pub struct Schema {
    id: Arc<SchemaId>,
    class_name: String,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    mixins: Vec<Arc<SchemaId>>,
}

/// Summary of a schema, for display and tooling
#[derive(Debug, Serialize)]
pub struct SchemaSummary<'a> {
    pub id: &'a str,
    pub curie: String,
    pub class_name: &'a str,
    pub fields: Vec<FieldSummary<'a>>,
    pub mixins: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct FieldSummary<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub rule: &'static str,
    pub required: bool,
}

impl Schema {
    /// Build a schema
    ///
    /// Fails with `FieldAlreadyDefined` on the first duplicate name, including
    /// a field that collides with `_schema` or with a mixin's field.
    pub fn new(id: &str, class_name: impl Into<String>, fields: Vec<Field>, mixins: Vec<Mixin>) -> Result<Self> {
        let id = SchemaId::parse(id)?;
        if id.curie().is_mixin() {
            return Err(SchemaError::Logic(format!(
                "mixin [{}] cannot be used as a message schema",
                id
            )));
        }

        let schema_field = FieldBuilder::new(SCHEMA_FIELD_NAME, Type::String)
            .required()
            .pattern(SCHEMA_ID_PATTERN)
            .with_default(Value::from(id.to_string()))
            .build()?;

        let mut schema = Self {
            id,
            class_name: class_name.into(),
            fields: Vec::new(),
            index: HashMap::new(),
            mixins: Vec::new(),
        };

        schema.add_field(schema_field)?;
        for field in fields {
            schema.add_field(field)?;
        }

        for mixin in mixins {
            for field in mixin.fields {
                schema.add_field(field)?;
            }
            schema.mixins.push(mixin.id);
        }

        Ok(schema)
    }

    fn add_field(&mut self, field: Field) -> Result<()> {
        if self.index.contains_key(field.name()) {
            return Err(SchemaError::FieldAlreadyDefined {
                schema: self.id.to_string(),
                field: field.name().to_string(),
            });
        }
        self.index.insert(field.name().to_string(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    pub fn id(&self) -> &Arc<SchemaId> {
        &self.id
    }

    pub fn curie(&self) -> &Arc<SchemaCurie> {
        self.id.curie()
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Fields in declaration order, `_schema` first
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Result<&Field> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| SchemaError::FieldNotDefined {
                schema: self.id.to_string(),
                field: name.to_string(),
            })
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_required())
    }

    pub fn mixins(&self) -> &[Arc<SchemaId>] {
        &self.mixins
    }

    /// True when a mixin with this curie (`vendor:package:mixin:message`) was applied
    pub fn has_mixin(&self, curie: &str) -> bool {
        self.mixins.iter().any(|m| m.curie().to_string() == curie)
    }

    pub fn summary(&self) -> SchemaSummary<'_> {
        SchemaSummary {
            id: self.id.as_str(),
            curie: self.curie().to_string(),
            class_name: &self.class_name,
            fields: self
                .fields
                .iter()
                .map(|f| FieldSummary {
                    name: f.name(),
                    kind: f.kind().name(),
                    rule: f.rule().name(),
                    required: f.is_required(),
                })
                .collect(),
            mixins: self.mixins.iter().map(|m| m.as_str()).collect(),
        }
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.class_name == other.class_name
    }
}
