//! Array serializer
//!
//! Converts messages to and from plain `serde_json` maps keyed by field name.
//! This is the [`Codec`] the crate ships with:
//!
//! | value          | array form                                  |
//! |----------------|---------------------------------------------|
//! | nested message | object carrying its own `_schema`           |
//! | message ref    | `{"curie": ..., "id": ..., "tag": ...}`     |
//! | dynamic field  | `{"name": ..., "<kind>_val": ...}`          |
//!
//! Sets and lists become arrays, maps become objects. Explicitly cleared
//! fields are written as `null` unless disabled in [`CodecConfig`], even when
//! a default has refilled them; decoding recomputes that default.

use std::sync::Arc;

use serde_json::{Map, Value as Json};
use tracing::trace;

use crate::codec::{Codec, Encoded};
use crate::config::CodecConfig;
use crate::error::{Result, SchemaError};
use crate::field::{Field, FieldRule};
use crate::message::{Message, StoredValue};
use crate::message_ref::MessageRef;
use crate::registry;
use crate::schema::{Schema, SCHEMA_FIELD_NAME};
use crate::types::dynamic::DynamicField;

/// Serializes messages to `serde_json` maps
#[derive(Debug, Clone, Copy, Default)]
pub struct ArraySerializer {
    config: CodecConfig,
}

impl ArraySerializer {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Array form of a message, fields in schema order
    pub fn serialize(&self, message: &Message) -> Result<Map<String, Json>> {
        let mut out = Map::new();

        for field in message.schema().fields() {
            let name = field.name();
            match message.stored(name) {
                _ if self.config.include_cleared_fields && message.has_cleared_field(name) => {
                    out.insert(name.to_string(), Json::Null);
                }
                Some(stored) if message.has(name) => {
                    out.insert(name.to_string(), self.encode_stored(field, stored)?);
                }
                _ => {}
            }
        }

        Ok(out)
    }

    fn encode_stored(&self, field: &Field, stored: &StoredValue) -> Result<Json> {
        let codec: Option<&dyn Codec> = Some(self);
        Ok(match stored {
            StoredValue::Single(v) => field.encode_value(Some(v), codec)?,
            StoredValue::Set(set) => Json::Array(
                set.values()
                    .map(|v| field.encode_value(Some(v), codec))
                    .collect::<Result<_>>()?,
            ),
            StoredValue::List(list) => Json::Array(
                list.iter()
                    .map(|v| field.encode_value(Some(v), codec))
                    .collect::<Result<_>>()?,
            ),
            StoredValue::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), field.encode_value(Some(v), codec)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Rebuild a message whose schema is named by its `_schema` entry
    ///
    /// The schema must already be registered (see [`registry::register_schema`]).
    pub fn deserialize(&self, value: &Json) -> Result<Message> {
        let data = value.as_object().ok_or_else(|| {
            SchemaError::decode(SCHEMA_FIELD_NAME, "message", value, "expected an object")
        })?;

        let id = data
            .get(SCHEMA_FIELD_NAME)
            .and_then(Json::as_str)
            .ok_or_else(|| {
                SchemaError::SchemaNotDefined(format!(
                    "the [{}] entry is missing, the message cannot be resolved",
                    SCHEMA_FIELD_NAME
                ))
            })?;

        let schema = registry::resolve_str(id)?;
        self.deserialize_with(schema, data)
    }

    /// Rebuild a message of a known schema
    ///
    /// Unknown keys are skipped and `null` marks a field cleared. The first value
    /// that fails to decode aborts the whole message. Defaults are applied last,
    /// after every other field is in place.
    pub fn deserialize_with(&self, schema: Arc<Schema>, data: &Map<String, Json>) -> Result<Message> {
        let mut message = Message::new(Arc::clone(&schema));
        let codec: Option<&dyn Codec> = Some(self);

        for (name, raw) in data {
            let Ok(field) = schema.field(name) else {
                trace!(schema = %schema.id(), field = %name, "Skipping unknown field");
                continue;
            };

            if raw.is_null() {
                message.mark_cleared(name)?;
                continue;
            }

            match field.rule() {
                FieldRule::Single => {
                    let value = field.decode_value(raw, codec)?;
                    message.set_single(name, value)?;
                }
                FieldRule::Set | FieldRule::List => {
                    let items = raw.as_array().ok_or_else(|| {
                        SchemaError::decode(name, field.kind().name(), raw, "expected an array")
                    })?;
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        if let Some(value) = field.decode_value(item, codec)? {
                            values.push(value);
                        }
                    }
                    if field.rule() == FieldRule::Set {
                        message.add_to_set(name, values)?;
                    } else {
                        message.add_to_list(name, values)?;
                    }
                }
                FieldRule::Map => {
                    let entries = raw.as_object().ok_or_else(|| {
                        SchemaError::decode(name, field.kind().name(), raw, "expected an object")
                    })?;
                    for (key, item) in entries {
                        let value = field.decode_value(item, codec)?;
                        message.add_to_map(name, key, value)?;
                    }
                }
            }
        }

        message.populate_defaults(None)?;
        if self.config.freeze_on_decode {
            message.freeze()?;
        }
        Ok(message)
    }
}

impl Codec for ArraySerializer {
    fn encode_message(&self, message: &Message, _field: &Field) -> Result<Encoded> {
        Ok(Json::Object(self.serialize(message)?))
    }

    fn decode_message(&self, value: &Encoded, _field: &Field) -> Result<Message> {
        self.deserialize(value)
    }

    fn encode_message_ref(&self, message_ref: &MessageRef, _field: &Field) -> Result<Encoded> {
        Ok(message_ref.to_value())
    }

    /// Accepts the array form or the `curie:id#tag` string form
    fn decode_message_ref(&self, value: &Encoded, field: &Field) -> Result<MessageRef> {
        let decoded = match value {
            Json::String(s) => MessageRef::parse(s),
            other => MessageRef::from_value(other),
        };
        decoded.map_err(|e| SchemaError::decode(field.name(), field.kind().name(), value, e.to_string()))
    }

    fn encode_dynamic_field(&self, dynamic_field: &DynamicField, _field: &Field) -> Result<Encoded> {
        Ok(dynamic_field.to_value())
    }

    fn decode_dynamic_field(&self, value: &Encoded, _field: &Field) -> Result<DynamicField> {
        DynamicField::from_value(value)
    }
}
