//! Field definitions
//!
//! A [`Field`] binds a name to a [`Type`], a cardinality [`FieldRule`] and the
//! constraints its values must satisfy. Fields are assembled with a
//! [`FieldBuilder`]; `build()` rejects inconsistent definitions so a schema
//! never holds a field that could not be guarded.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::codec::{Codec, Encoded};
use crate::error::{Result, SchemaError};
use crate::message::Message;
use crate::types::enums::EnumClass;
use crate::types::format::Format;
use crate::types::value::Value;
use crate::types::Type;

/// Longest field name accepted
pub const MAX_FIELD_NAME_LENGTH: usize = 127;

static FIELD_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("field name regex is valid"));

/// How many values a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRule {
    /// One value
    #[default]
    Single,
    /// Unordered values, deduplicated case-insensitively
    Set,
    /// Ordered values, duplicates allowed
    List,
    /// Values keyed by string
    Map,
}

impl FieldRule {
    pub fn name(&self) -> &'static str {
        match self {
            FieldRule::Single => "single",
            FieldRule::Set => "set",
            FieldRule::List => "list",
            FieldRule::Map => "map",
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, FieldRule::Single)
    }
}

/// A default value, shaped by the field's rule
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Single(Value),
    Many(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl FieldValue {
    /// True when there is nothing to store
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Single(v) => v.is_empty(),
            FieldValue::Many(values) => values.is_empty(),
            FieldValue::Map(map) => map.is_empty(),
        }
    }

    pub fn into_single(self) -> Option<Value> {
        match self {
            FieldValue::Single(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<Value>> for FieldValue {
    fn from(values: Vec<Value>) -> Self {
        FieldValue::Many(values)
    }
}

impl From<BTreeMap<String, Value>> for FieldValue {
    fn from(map: BTreeMap<String, Value>) -> Self {
        FieldValue::Map(map)
    }
}

/// Computes a field's default, optionally looking at the owning message
pub type DefaultProvider = Arc<dyn Fn(Option<&Message>) -> Option<FieldValue> + Send + Sync>;

/// Which concrete values an enum or message field accepts
#[derive(Debug, Clone, PartialEq)]
pub enum ClassRestriction {
    Enum(Arc<EnumClass>),
    /// Class names of the message kinds allowed; empty allows any message
    Messages(Vec<String>),
}

/// A named, typed slot within a schema
#[derive(Clone)]
pub struct Field {
    name: String,
    kind: Type,
    rule: FieldRule,
    required: bool,
    min_length: usize,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    format: Format,
    min: Option<i64>,
    max: Option<i64>,
    precision: u32,
    scale: u32,
    restriction: Option<ClassRestriction>,
    use_type_default: bool,
    default: Option<DefaultProvider>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("rule", &self.rule)
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("format", &self.format)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("restriction", &self.restriction)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Type {
        self.kind
    }

    pub fn rule(&self) -> FieldRule {
        self.rule
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn min(&self) -> Option<i64> {
        self.min
    }

    pub fn max(&self) -> Option<i64> {
        self.max
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn restriction(&self) -> Option<&ClassRestriction> {
        self.restriction.as_ref()
    }

    pub fn enum_class(&self) -> Option<&Arc<EnumClass>> {
        match &self.restriction {
            Some(ClassRestriction::Enum(class)) => Some(class),
            _ => None,
        }
    }

    /// Message class names this field accepts; empty means any
    pub fn any_of(&self) -> &[String] {
        match &self.restriction {
            Some(ClassRestriction::Messages(names)) => names,
            _ => &[],
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some() || (self.use_type_default && self.rule.is_single() && self.kind.default_value().is_some())
    }

    /// Evaluate the default for this field
    ///
    /// An explicit provider wins. Otherwise single-valued fields fall back to
    /// their type's default; collections have none.
    pub fn default_value(&self, message: Option<&Message>) -> Option<FieldValue> {
        if let Some(provider) = &self.default {
            return provider(message);
        }

        if self.use_type_default && self.rule.is_single() {
            return self.kind.default_value().map(FieldValue::Single);
        }

        None
    }

    pub fn guard_value(&self, value: &Value) -> Result<()> {
        self.kind.guard(value, self)
    }

    pub fn encode_value(&self, value: Option<&Value>, codec: Option<&dyn Codec>) -> Result<Encoded> {
        self.kind.encode(value, self, codec)
    }

    pub fn decode_value(&self, encoded: &Encoded, codec: Option<&dyn Codec>) -> Result<Option<Value>> {
        self.kind.decode(encoded, self, codec)
    }
}

/// Accumulates a field definition
#[derive(Clone)]
pub struct FieldBuilder {
    name: String,
    kind: Type,
    rule: FieldRule,
    required: bool,
    min_length: usize,
    max_length: Option<usize>,
    pattern: Option<String>,
    format: Format,
    min: Option<i64>,
    max: Option<i64>,
    precision: u32,
    scale: u32,
    restriction: Option<ClassRestriction>,
    use_type_default: bool,
    default: Option<DefaultProvider>,
}

impl FieldBuilder {
    pub fn new(name: impl Into<String>, kind: Type) -> Self {
        Self {
            name: name.into(),
            kind,
            rule: FieldRule::Single,
            required: false,
            min_length: 0,
            max_length: None,
            pattern: None,
            format: Format::Unknown,
            min: None,
            max: None,
            precision: 10,
            scale: 2,
            restriction: None,
            use_type_default: true,
            default: None,
        }
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn set(self) -> Self {
        self.rule(FieldRule::Set)
    }

    pub fn list(self) -> Self {
        self.rule(FieldRule::List)
    }

    pub fn map(self) -> Self {
        self.rule(FieldRule::Map)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    pub fn enum_class(mut self, class: Arc<EnumClass>) -> Self {
        self.restriction = Some(ClassRestriction::Enum(class));
        self
    }

    /// Restrict a message field to the given message class names
    pub fn any_of<I, S>(mut self, class_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.restriction = Some(ClassRestriction::Messages(
            class_names.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Skip the type's own default (e.g. keep an int field absent instead of 0)
    pub fn without_type_default(mut self) -> Self {
        self.use_type_default = false;
        self
    }

    /// Use a fixed default
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        self.default = Some(Arc::new(move |_| Some(value.clone())));
        self
    }

    /// Compute the default from the owning message
    pub fn default_fn<F>(mut self, provider: F) -> Self
    where
        F: Fn(Option<&Message>) -> Option<FieldValue> + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(provider));
        self
    }

    pub fn build(self) -> Result<Field> {
        let invalid = |reason: String| SchemaError::InvalidFieldDefinition {
            field: self.name.clone(),
            reason,
        };

        if self.name.len() > MAX_FIELD_NAME_LENGTH || !FIELD_NAME_REGEX.is_match(&self.name) {
            return Err(invalid(format!(
                "name must match [a-zA-Z_][a-zA-Z0-9_]* and be at most {} characters",
                MAX_FIELD_NAME_LENGTH
            )));
        }

        if let Some(max_length) = self.max_length {
            if self.min_length > max_length {
                return Err(invalid(format!(
                    "min_length [{}] cannot be greater than max_length [{}]",
                    self.min_length, max_length
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid(format!("min [{}] cannot be greater than max [{}]", min, max)));
            }
        }

        if self.rule == FieldRule::Set && !self.kind.allowed_in_set() {
            return Err(invalid(format!(
                "type [{}] cannot be used in a set",
                self.kind.name()
            )));
        }

        if self.kind == Type::Decimal && (self.precision == 0 || self.precision > 65 || self.scale > self.precision) {
            return Err(invalid(format!(
                "precision [{}] must be 1..=65 and scale [{}] at most the precision",
                self.precision, self.scale
            )));
        }

        match (self.kind, &self.restriction) {
            (Type::StringEnum, Some(ClassRestriction::Enum(class))) if class.is_string_backed() => {}
            (Type::IntEnum, Some(ClassRestriction::Enum(class))) if class.is_int_backed() => {}
            (Type::StringEnum | Type::IntEnum, _) => {
                return Err(invalid(format!(
                    "type [{}] requires an enum class with matching values",
                    self.kind.name()
                )));
            }
            (Type::Message, None | Some(ClassRestriction::Messages(_))) => {}
            (_, Some(_)) => {
                return Err(invalid(format!(
                    "type [{}] does not take a class restriction",
                    self.kind.name()
                )));
            }
            (_, None) => {}
        }

        let pattern = match &self.pattern {
            Some(p) => Some(Regex::new(p).map_err(|e| invalid(format!("invalid pattern: {}", e)))?),
            None => None,
        };

        Ok(Field {
            name: self.name,
            kind: self.kind,
            rule: self.rule,
            required: self.required,
            min_length: self.min_length,
            max_length: self.max_length,
            pattern,
            format: self.format,
            min: self.min,
            max: self.max,
            precision: self.precision,
            scale: self.scale,
            restriction: self.restriction,
            use_type_default: self.use_type_default,
            default: self.default,
        })
    }
}
