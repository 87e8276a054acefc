//! Messages
//!
//! A [`Message`] holds values for the fields of one [`Schema`], shaped by each
//! field's rule. Every mutation is checked against the field's type guard.
//!
//! ## Lifecycle
//!
//! ```text
//!   create ──► Mutable ──freeze()──► Frozen
//!                 ▲                     │
//!                 └──────clone()────────┘   (the clone only)
//! ```
//!
//! Freezing validates first, then marks the message and every nested message
//! read-only. A frozen message rejects all mutation with
//! [`SchemaError::FrozenMessageIsImmutable`]; cloning gives a fully mutable,
//! deep copy.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::{Map, Value as Json};
use tracing::trace;

use crate::error::{Result, SchemaError};
use crate::field::{Field, FieldRule, FieldValue};
use crate::schema::Schema;
use crate::serializer::ArraySerializer;
use crate::types::value::Value;

/// Storage for one field, shaped by its rule
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Single(Value),
    /// Keyed by the trimmed, lower-cased string form of each value
    Set(BTreeMap<String, Value>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl StoredValue {
    fn is_empty(&self) -> bool {
        match self {
            StoredValue::Single(v) => v.is_empty(),
            StoredValue::Set(set) => set.is_empty(),
            StoredValue::List(list) => list.is_empty(),
            StoredValue::Map(map) => map.is_empty(),
        }
    }

    fn values_mut(&mut self) -> Box<dyn Iterator<Item = &mut Value> + '_> {
        match self {
            StoredValue::Single(v) => Box::new(std::iter::once(v)),
            StoredValue::Set(set) => Box::new(set.values_mut()),
            StoredValue::List(list) => Box::new(list.iter_mut()),
            StoredValue::Map(map) => Box::new(map.values_mut()),
        }
    }

    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            StoredValue::Single(v) => Box::new(std::iter::once(v)),
            StoredValue::Set(set) => Box::new(set.values()),
            StoredValue::List(list) => Box::new(list.iter()),
            StoredValue::Map(map) => Box::new(map.values()),
        }
    }
}

/// A typed value container for one schema
#[derive(Debug)]
pub struct Message {
    schema: Arc<Schema>,
    data: BTreeMap<String, StoredValue>,
    cleared: BTreeSet<String>,
    frozen: bool,
    replay: Option<bool>,
}

impl Message {
    /// An empty message; no defaults are applied
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            data: BTreeMap::new(),
            cleared: BTreeSet::new(),
            frozen: false,
            replay: None,
        }
    }

    /// A new message with every field's default populated
    pub fn create(schema: Arc<Schema>) -> Result<Self> {
        let mut message = Self::new(schema);
        message.populate_defaults(None)?;
        Ok(message)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// True when the field holds a non-empty value; unknown fields are never set
    pub fn has(&self, name: &str) -> bool {
        self.data.get(name).is_some_and(|stored| !stored.is_empty())
    }

    /// A copy of the field's value; sets come back as an unordered `Many`
    pub fn get(&self, name: &str) -> Result<Option<FieldValue>> {
        self.schema.field(name)?;
        if !self.has(name) {
            return Ok(None);
        }

        Ok(self.data.get(name).map(|stored| match stored {
            StoredValue::Single(v) => FieldValue::Single(v.clone()),
            StoredValue::Set(set) => FieldValue::Many(set.values().cloned().collect()),
            StoredValue::List(list) => FieldValue::Many(list.clone()),
            StoredValue::Map(map) => FieldValue::Map(map.clone()),
        }))
    }

    /// Borrow a single-valued field
    pub fn get_single(&self, name: &str) -> Result<Option<&Value>> {
        self.require_rule(self.schema.field(name)?, FieldRule::Single)?;
        Ok(match self.data.get(name) {
            Some(StoredValue::Single(v)) => Some(v),
            _ => None,
        })
    }

    /// Borrow the values of a set or list field
    pub fn get_many(&self, name: &str) -> Result<Vec<&Value>> {
        let field = self.schema.field(name)?;
        if !matches!(field.rule(), FieldRule::Set | FieldRule::List) {
            return Err(rule_error(field, "a set or a list"));
        }
        Ok(self.data.get(name).map(|s| s.values().collect()).unwrap_or_default())
    }

    /// Borrow a map field
    pub fn get_map(&self, name: &str) -> Result<Option<&BTreeMap<String, Value>>> {
        self.require_rule(self.schema.field(name)?, FieldRule::Map)?;
        Ok(match self.data.get(name) {
            Some(StoredValue::Map(map)) => Some(map),
            _ => None,
        })
    }

    /// Raw storage for a field, if any
    pub fn stored(&self, name: &str) -> Option<&StoredValue> {
        self.data.get(name)
    }

    /// Mutable access to a single nested message
    pub fn nested_mut(&mut self, name: &str) -> Result<Option<&mut Message>> {
        self.guard_frozen()?;
        self.require_rule(self.schema.field(name)?, FieldRule::Single)?;
        Ok(match self.data.get_mut(name) {
            Some(StoredValue::Single(v)) => v.as_message_mut(),
            _ => None,
        })
    }

    /// Set a single-valued field; `None` clears it
    pub fn set_single(&mut self, name: &str, value: Option<Value>) -> Result<&mut Self> {
        self.guard_frozen()?;
        let field = self.schema.field(name)?;
        self.require_rule(field, FieldRule::Single)?;

        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ => return self.clear(name),
        };

        field.guard_value(&value)?;
        self.data.insert(name.to_string(), StoredValue::Single(value));
        self.cleared.remove(name);
        Ok(self)
    }

    /// Shorthand for `set_single(name, Some(value))`
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.set_single(name, Some(value.into()))
    }

    /// Add values to a set field
    ///
    /// Values collapse on their trimmed, lower-cased string form; the last
    /// value added for a key is the one kept. Every value is guarded before
    /// any is stored.
    pub fn add_to_set<I>(&mut self, name: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.guard_frozen()?;
        let field = self.schema.field(name)?;
        self.require_rule(field, FieldRule::Set)?;
        let values = guarded(field, values)?;
        if !values.is_empty() {
            self.insert_into_set(name, values);
            self.cleared.remove(name);
        }
        Ok(self)
    }

    pub fn remove_from_set<I>(&mut self, name: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.guard_frozen()?;
        self.require_rule(self.schema.field(name)?, FieldRule::Set)?;

        if let Some(StoredValue::Set(set)) = self.data.get_mut(name) {
            for value in values {
                set.remove(&value.into().set_key());
            }
        }
        self.drop_if_empty(name);
        Ok(self)
    }

    /// Append values to a list field, keeping order and duplicates
    pub fn add_to_list<I>(&mut self, name: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.guard_frozen()?;
        let field = self.schema.field(name)?;
        self.require_rule(field, FieldRule::List)?;
        let values = guarded(field, values)?;
        if values.is_empty() {
            return Ok(self);
        }

        match self.data.entry(name.to_string()).or_insert_with(|| StoredValue::List(Vec::new())) {
            StoredValue::List(list) => list.extend(values),
            other => *other = StoredValue::List(values),
        }
        self.cleared.remove(name);
        Ok(self)
    }

    /// Remove every element equal to any of `values`
    pub fn remove_from_list<I>(&mut self, name: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.guard_frozen()?;
        self.require_rule(self.schema.field(name)?, FieldRule::List)?;

        let remove: Vec<Value> = values.into_iter().map(Into::into).collect();
        if let Some(StoredValue::List(list)) = self.data.get_mut(name) {
            list.retain(|v| !remove.contains(v));
        }
        self.drop_if_empty(name);
        Ok(self)
    }

    /// Put a value into a map field; `None` removes the key
    pub fn add_to_map(&mut self, name: &str, key: &str, value: Option<Value>) -> Result<&mut Self> {
        self.guard_frozen()?;
        let field = self.schema.field(name)?;
        self.require_rule(field, FieldRule::Map)?;

        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ => return self.remove_from_map(name, key),
        };

        field.guard_value(&value)?;
        match self.data.entry(name.to_string()).or_insert_with(|| StoredValue::Map(BTreeMap::new())) {
            StoredValue::Map(map) => {
                map.insert(key.to_string(), value);
            }
            other => *other = StoredValue::Map(BTreeMap::from([(key.to_string(), value)])),
        }
        self.cleared.remove(name);
        Ok(self)
    }

    pub fn remove_from_map(&mut self, name: &str, key: &str) -> Result<&mut Self> {
        self.guard_frozen()?;
        self.require_rule(self.schema.field(name)?, FieldRule::Map)?;

        if let Some(StoredValue::Map(map)) = self.data.get_mut(name) {
            map.remove(key);
        }
        self.drop_if_empty(name);
        Ok(self)
    }

    /// Unset a field, mark it cleared, then re-apply its default
    pub fn clear(&mut self, name: &str) -> Result<&mut Self> {
        self.guard_frozen()?;
        let schema = Arc::clone(&self.schema);
        let field = schema.field(name)?;
        self.data.remove(name);
        self.cleared.insert(name.to_string());
        self.populate_default(field)?;
        Ok(self)
    }

    /// Unset a field and mark it cleared without applying its default
    pub(crate) fn mark_cleared(&mut self, name: &str) -> Result<()> {
        self.guard_frozen()?;
        self.schema.field(name)?;
        self.data.remove(name);
        self.cleared.insert(name.to_string());
        Ok(())
    }

    /// True when the field was explicitly unset, even if a default now fills it
    pub fn has_cleared_field(&self, name: &str) -> bool {
        self.cleared.contains(name)
    }

    pub fn cleared_fields(&self) -> impl Iterator<Item = &str> {
        self.cleared.iter().map(String::as_str)
    }

    /// Apply defaults to every unset field, or to one field when `name` is given
    pub fn populate_defaults(&mut self, name: Option<&str>) -> Result<&mut Self> {
        self.guard_frozen()?;

        let schema = Arc::clone(&self.schema);
        match name {
            Some(name) => self.populate_default(schema.field(name)?)?,
            None => {
                for field in schema.fields() {
                    self.populate_default(field)?;
                }
            }
        }
        Ok(self)
    }

    fn populate_default(&mut self, field: &Field) -> Result<()> {
        let name = field.name();
        if self.has(name) {
            return Ok(());
        }

        let default = match field.default_value(Some(&*self)) {
            Some(d) if !d.is_empty() => d,
            _ => return Ok(()),
        };

        let stored = match (field.rule(), default) {
            (FieldRule::Single, FieldValue::Single(v)) => {
                field.guard_value(&v)?;
                StoredValue::Single(v)
            }
            (FieldRule::Set, FieldValue::Many(values)) => {
                let values = guarded(field, values)?;
                self.insert_into_set(name, values);
                return Ok(());
            }
            (FieldRule::List, FieldValue::Many(values)) => StoredValue::List(guarded(field, values)?),
            (FieldRule::Map, FieldValue::Map(map)) => {
                for value in map.values() {
                    field.guard_value(value)?;
                }
                StoredValue::Map(map)
            }
            (rule, _) => {
                return Err(SchemaError::Logic(format!(
                    "default for field [{}] does not match its rule [{}]",
                    name,
                    rule.name()
                )))
            }
        };

        self.data.insert(name.to_string(), stored);
        Ok(())
    }

    /// Fail on the first required field that is not set
    pub fn validate(&self) -> Result<&Self> {
        for field in self.schema.required_fields() {
            if !self.has(field.name()) {
                return Err(SchemaError::RequiredFieldNotSet {
                    schema: self.schema.id().to_string(),
                    field: field.name().to_string(),
                });
            }
        }
        Ok(self)
    }

    /// Make this message and every nested message read-only
    ///
    /// The whole tree is validated before anything is frozen.
    pub fn freeze(&mut self) -> Result<&mut Self> {
        if self.frozen {
            return Ok(self);
        }
        self.validate_tree()?;
        self.mark_frozen();
        Ok(self)
    }

    fn validate_tree(&self) -> Result<()> {
        if self.frozen {
            return Ok(());
        }
        self.validate()?;
        for stored in self.data.values() {
            for nested in stored.values().filter_map(Value::as_message) {
                nested.validate_tree()?;
            }
        }
        Ok(())
    }

    fn mark_frozen(&mut self) {
        self.frozen = true;
        for (name, stored) in self.data.iter_mut() {
            for nested in stored.values_mut().filter_map(Value::as_message_mut) {
                if !nested.frozen {
                    trace!(field = %name, schema = %nested.schema.id(), "Freezing nested message");
                    nested.mark_frozen();
                }
            }
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether this message came from replaying history; false until set
    pub fn is_replay(&self) -> bool {
        self.replay.unwrap_or(false)
    }

    /// Set the replay flag; it can only be set once, and `true` also freezes
    pub fn set_replay(&mut self, replay: bool) -> Result<&mut Self> {
        if self.replay.is_some() {
            return Err(SchemaError::Logic(format!(
                "replay mode can only be set once on message [{}]",
                self.schema.id()
            )));
        }
        if replay {
            self.freeze()?;
        }
        self.replay = Some(replay);
        Ok(self)
    }

    /// Array form of this message (see [`ArraySerializer`])
    pub fn to_array(&self) -> Result<Map<String, Json>> {
        ArraySerializer::default().serialize(self)
    }

    /// Rebuild a message of `schema` from its array form
    pub fn from_array(schema: Arc<Schema>, data: &Map<String, Json>) -> Result<Self> {
        ArraySerializer::default().deserialize_with(schema, data)
    }

    fn guard_frozen(&self) -> Result<()> {
        if self.frozen {
            return Err(SchemaError::FrozenMessageIsImmutable {
                schema: self.schema.id().to_string(),
            });
        }
        Ok(())
    }

    fn require_rule(&self, field: &Field, rule: FieldRule) -> Result<()> {
        if field.rule() != rule {
            return Err(rule_error(field, rule.name()));
        }
        Ok(())
    }

    fn insert_into_set(&mut self, name: &str, values: Vec<Value>) {
        if values.is_empty() {
            return;
        }
        let entry = self.data.entry(name.to_string()).or_insert_with(|| StoredValue::Set(BTreeMap::new()));
        if !matches!(entry, StoredValue::Set(_)) {
            *entry = StoredValue::Set(BTreeMap::new());
        }
        if let StoredValue::Set(set) = entry {
            for value in values {
                set.insert(value.set_key(), value);
            }
        }
    }

    fn drop_if_empty(&mut self, name: &str) {
        if self.data.get(name).map_or(true, StoredValue::is_empty) {
            self.data.remove(name);
            self.cleared.insert(name.to_string());
        }
    }
}

/// Deep copy; the copy and all of its nested messages are mutable and not replays.
impl Clone for Message {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            data: self.data.clone(),
            cleared: self.cleared.clone(),
            frozen: false,
            replay: None,
        }
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.schema.id() == other.schema.id() && self.data == other.data
    }
}

fn rule_error(field: &Field, expected: &str) -> SchemaError {
    SchemaError::Logic(format!(
        "field [{}] must be {}, it is a [{}]",
        field.name(),
        expected,
        field.rule().name()
    ))
}

/// Convert and guard every value, dropping empty ones
fn guarded<I>(field: &Field, values: I) -> Result<Vec<Value>>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    values
        .into_iter()
        .map(Into::into)
        .filter(|v: &Value| !v.is_empty())
        .map(|v| field.guard_value(&v).map(|_| v))
        .collect()
}
