//! The field type system
//!
//! Every field is bound to one [`Type`]. A type decides which [`Value`]s a
//! field accepts (`guard`), how a value is written out (`encode`) and read
//! back (`decode`), and what a fresh field starts with (`default`).
//!
//! `encode(None)` and decoding `null` or an empty string both mean "absent";
//! neither ever produces a zero value. Decoding works on untrusted input and
//! fails with [`SchemaError::DecodeValueFailed`]; guarding works on typed
//! values and fails with [`SchemaError::Validation`].

pub mod dynamic;
pub mod enums;
pub mod format;
pub mod identifier;
pub mod microtime;
pub mod value;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::codec::{Codec, Encoded};
use crate::error::{Result, SchemaError};
use crate::field::Field;

use self::enums::EnumScalar;
use self::format::Format;
use self::identifier::Identifier;
use self::microtime::Microtime;
use self::value::Value;

/// Largest value a `big-int` field accepts
pub const BIG_INT_MAX: u128 = u64::MAX as u128;

/// The kind of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Type {
    Boolean,
    /// 0 = unknown, 1 = true, 2 = false
    Trinary,
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    SignedTinyInt,
    SignedSmallInt,
    SignedMediumInt,
    SignedInt,
    SignedBigInt,
    Float,
    Decimal,
    String,
    Text,
    MediumText,
    Binary,
    Blob,
    MediumBlob,
    Date,
    DateTime,
    /// Unix seconds
    Timestamp,
    Microtime,
    StringEnum,
    IntEnum,
    Identifier,
    Uuid,
    TimeUuid,
    Message,
    MessageRef,
    DynamicField,
}

impl Type {
    /// Every type, in declaration order
    pub const ALL: [Type; 32] = [
        Type::Boolean,
        Type::Trinary,
        Type::TinyInt,
        Type::SmallInt,
        Type::MediumInt,
        Type::Int,
        Type::BigInt,
        Type::SignedTinyInt,
        Type::SignedSmallInt,
        Type::SignedMediumInt,
        Type::SignedInt,
        Type::SignedBigInt,
        Type::Float,
        Type::Decimal,
        Type::String,
        Type::Text,
        Type::MediumText,
        Type::Binary,
        Type::Blob,
        Type::MediumBlob,
        Type::Date,
        Type::DateTime,
        Type::Timestamp,
        Type::Microtime,
        Type::StringEnum,
        Type::IntEnum,
        Type::Identifier,
        Type::Uuid,
        Type::TimeUuid,
        Type::Message,
        Type::MessageRef,
        Type::DynamicField,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Type::Boolean => "boolean",
            Type::Trinary => "trinary",
            Type::TinyInt => "tiny-int",
            Type::SmallInt => "small-int",
            Type::MediumInt => "medium-int",
            Type::Int => "int",
            Type::BigInt => "big-int",
            Type::SignedTinyInt => "signed-tiny-int",
            Type::SignedSmallInt => "signed-small-int",
            Type::SignedMediumInt => "signed-medium-int",
            Type::SignedInt => "signed-int",
            Type::SignedBigInt => "signed-big-int",
            Type::Float => "float",
            Type::Decimal => "decimal",
            Type::String => "string",
            Type::Text => "text",
            Type::MediumText => "medium-text",
            Type::Binary => "binary",
            Type::Blob => "blob",
            Type::MediumBlob => "medium-blob",
            Type::Date => "date",
            Type::DateTime => "date-time",
            Type::Timestamp => "timestamp",
            Type::Microtime => "microtime",
            Type::StringEnum => "string-enum",
            Type::IntEnum => "int-enum",
            Type::Identifier => "identifier",
            Type::Uuid => "uuid",
            Type::TimeUuid => "time-uuid",
            Type::Message => "message",
            Type::MessageRef => "message-ref",
            Type::DynamicField => "dynamic-field",
        }
    }

    /// Closed integer range for integer-valued types
    pub fn int_range(&self) -> Option<(i64, i64)> {
        match self {
            Type::Trinary => Some((0, 2)),
            Type::TinyInt => Some((0, 255)),
            Type::SmallInt => Some((0, 65_535)),
            Type::MediumInt => Some((0, 16_777_215)),
            Type::Int => Some((0, 4_294_967_295)),
            Type::SignedTinyInt => Some((-128, 127)),
            Type::SignedSmallInt => Some((-32_768, 32_767)),
            Type::SignedMediumInt => Some((-8_388_608, 8_388_607)),
            Type::SignedInt => Some((-2_147_483_648, 2_147_483_647)),
            Type::SignedBigInt => Some((i64::MIN, i64::MAX)),
            Type::Timestamp => Some((0, i64::MAX)),
            Type::IntEnum => Some((0, 65_535)),
            _ => None,
        }
    }

    /// Largest byte length for string and binary types
    pub fn max_bytes(&self) -> Option<usize> {
        match self {
            Type::String | Type::Binary | Type::Identifier => Some(255),
            Type::Text | Type::Blob => Some(65_535),
            Type::MediumText | Type::MediumBlob => Some(16_777_215),
            Type::StringEnum => Some(100),
            _ => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Type::Boolean)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Trinary
                | Type::TinyInt
                | Type::SmallInt
                | Type::MediumInt
                | Type::Int
                | Type::BigInt
                | Type::SignedTinyInt
                | Type::SignedSmallInt
                | Type::SignedMediumInt
                | Type::SignedInt
                | Type::SignedBigInt
                | Type::Float
                | Type::Decimal
                | Type::Timestamp
                | Type::Microtime
                | Type::IntEnum
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self,
            Type::String
                | Type::Text
                | Type::MediumText
                | Type::Binary
                | Type::Blob
                | Type::MediumBlob
                | Type::Date
                | Type::DateTime
                | Type::StringEnum
                | Type::Identifier
                | Type::Uuid
                | Type::TimeUuid
        )
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Type::Binary | Type::Blob | Type::MediumBlob)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Type::StringEnum | Type::IntEnum)
    }

    /// True when the in-memory value is a plain scalar (bool, number, text, bytes)
    pub fn decodes_to_scalar(&self) -> bool {
        !matches!(
            self,
            Type::BigInt
                | Type::Date
                | Type::DateTime
                | Type::Microtime
                | Type::StringEnum
                | Type::IntEnum
                | Type::Identifier
                | Type::Uuid
                | Type::TimeUuid
                | Type::Message
                | Type::MessageRef
                | Type::DynamicField
        )
    }

    /// True when the encoded value is a scalar rather than a structure
    pub fn encodes_to_scalar(&self) -> bool {
        !matches!(self, Type::Message | Type::MessageRef | Type::DynamicField)
    }

    /// Whether a set of this type can be deduplicated by string key
    pub fn allowed_in_set(&self) -> bool {
        !matches!(
            self,
            Type::Boolean
                | Type::Binary
                | Type::Blob
                | Type::MediumBlob
                | Type::Message
                | Type::DynamicField
        )
    }

    /// The value a field of this type starts with when it uses the type default
    pub fn default_value(&self) -> Option<Value> {
        match self {
            Type::Boolean => Some(Value::Bool(false)),
            Type::Trinary
            | Type::TinyInt
            | Type::SmallInt
            | Type::MediumInt
            | Type::Int
            | Type::SignedTinyInt
            | Type::SignedSmallInt
            | Type::SignedMediumInt
            | Type::SignedInt
            | Type::SignedBigInt => Some(Value::Int(0)),
            Type::BigInt => Some(Value::BigInt(0)),
            Type::Float | Type::Decimal => Some(Value::Float(0.0)),
            Type::Timestamp => Some(Value::Int(Utc::now().timestamp())),
            Type::Microtime => Some(Value::Microtime(Microtime::now())),
            Type::Uuid => Some(Value::Uuid(Uuid::new_v4())),
            Type::TimeUuid => Some(Value::Uuid(generate_time_uuid())),
            _ => None,
        }
    }

    /// Check that `value` may be stored in `field`
    pub fn guard(&self, value: &Value, field: &Field) -> Result<()> {
        match (self, value) {
            (Type::Boolean, Value::Bool(_)) => Ok(()),

            (Type::BigInt, Value::BigInt(n)) => {
                if *n > BIG_INT_MAX {
                    return Err(SchemaError::validation(
                        field.name(),
                        value,
                        format!("cannot be greater than [{}]", BIG_INT_MAX),
                    ));
                }
                Ok(())
            }

            (Type::Float, Value::Float(x)) => guard_finite(*x, value, field),

            (Type::Decimal, Value::Float(x)) => {
                guard_finite(*x, value, field)?;
                let limit = 10f64.powi(field.precision() as i32 - field.scale() as i32);
                if x.abs() >= limit {
                    return Err(SchemaError::validation(
                        field.name(),
                        value,
                        format!(
                            "does not fit precision [{}] and scale [{}]",
                            field.precision(),
                            field.scale()
                        ),
                    ));
                }
                Ok(())
            }

            (t, Value::Int(n)) if t.int_range().is_some() && !t.is_enum() => {
                self.guard_range(*n, value, field)
            }

            (Type::String | Type::Text | Type::MediumText, Value::String(s)) => {
                self.guard_byte_length(s.len(), value, field)?;
                guard_pattern_and_format(s, value, field)
            }

            (Type::Binary | Type::Blob | Type::MediumBlob, Value::Binary(b)) => {
                self.guard_byte_length(b.len(), value, field)
            }

            (Type::DateTime, Value::DateTime(dt)) if dt.timestamp_subsec_nanos() % 1_000 != 0 => Err(
                SchemaError::validation(field.name(), value, "date-times are limited to microsecond precision"),
            ),

            (Type::Date, Value::Date(_))
            | (Type::DateTime, Value::DateTime(_))
            | (Type::Microtime, Value::Microtime(_))
            | (Type::Uuid, Value::Uuid(_))
            | (Type::MessageRef, Value::MessageRef(_))
            | (Type::DynamicField, Value::DynamicField(_)) => Ok(()),

            (Type::TimeUuid, Value::Uuid(u)) => {
                if u.get_version_num() != 1 {
                    return Err(SchemaError::validation(
                        field.name(),
                        value,
                        "must be a version 1 (time based) uuid",
                    ));
                }
                Ok(())
            }

            (Type::Identifier, Value::Identifier(id)) => {
                self.guard_byte_length(id.as_str().len(), value, field)
            }

            (Type::StringEnum | Type::IntEnum, Value::Enum(e)) => {
                let class = field.enum_class().ok_or_else(|| {
                    SchemaError::Logic(format!("field [{}] has no enum class", field.name()))
                })?;
                if e.class() != class.name() || !class.contains(e.scalar()) {
                    return Err(SchemaError::validation(
                        field.name(),
                        value,
                        format!("must be a member of enum [{}]", class.name()),
                    ));
                }
                match (self, e.scalar()) {
                    (Type::StringEnum, EnumScalar::Str(s)) => {
                        let len = s.len();
                        if len == 0 || len > 100 {
                            return Err(SchemaError::validation(
                                field.name(),
                                value,
                                format!("must be between [1] and [100] bytes, [{}] bytes given", len),
                            ));
                        }
                        Ok(())
                    }
                    (Type::IntEnum, EnumScalar::Int(i)) => self.guard_range(*i, value, field),
                    _ => Err(SchemaError::validation(
                        field.name(),
                        value,
                        format!("enum value does not match the [{}] type", self.name()),
                    )),
                }
            }

            (Type::Message, Value::Message(m)) => {
                let allowed = field.any_of();
                let class = m.schema().class_name();
                if !allowed.is_empty() && !allowed.iter().any(|a| a == class) {
                    return Err(SchemaError::validation(
                        field.name(),
                        m.schema().id().as_str(),
                        format!("must be one of [{}], [{}] given", allowed.join(", "), class),
                    ));
                }
                Ok(())
            }

            _ => Err(SchemaError::validation(
                field.name(),
                value,
                format!("expected a [{}] value, got [{}]", self.name(), value.kind()),
            )),
        }
    }

    fn guard_range(&self, n: i64, value: &Value, field: &Field) -> Result<()> {
        let (type_min, type_max) = self.int_range().unwrap_or((i64::MIN, i64::MAX));
        let min = field.min().map_or(type_min, |m| m.max(type_min).min(type_max));
        let max = field.max().map_or(type_max, |m| m.max(type_min).min(type_max));
        if n < min || n > max {
            return Err(SchemaError::validation(
                field.name(),
                value,
                format!("must be between [{}] and [{}]", min, max),
            ));
        }
        Ok(())
    }

    fn guard_byte_length(&self, len: usize, value: &Value, field: &Field) -> Result<()> {
        let type_max = self.max_bytes().unwrap_or(usize::MAX);
        let min = field.min_length();
        let max = field.max_length().unwrap_or(type_max).min(type_max).max(min);
        if len < min || len > max {
            return Err(SchemaError::validation(
                field.name(),
                value,
                format!(
                    "must be between [{}] and [{}] bytes, [{}] bytes given",
                    min, max, len
                ),
            ));
        }
        Ok(())
    }

    /// Encode a value for storage or transport
    ///
    /// `None` encodes to `null`. Messages, message refs and dynamic fields are
    /// structural and go through `codec`.
    pub fn encode(&self, value: Option<&Value>, field: &Field, codec: Option<&dyn Codec>) -> Result<Encoded> {
        let Some(value) = value else {
            return Ok(Json::Null);
        };

        let encoded = match (self, value) {
            (Type::Boolean, Value::Bool(b)) => Json::Bool(*b),
            (Type::BigInt, Value::BigInt(n)) => Json::String(n.to_string()),
            (Type::SignedBigInt, Value::Int(n)) => Json::String(n.to_string()),
            (t, Value::Int(n)) if t.int_range().is_some() => Json::from(*n),
            (Type::Float, Value::Float(x)) => float_json(*x),
            (Type::Decimal, Value::Float(x)) => {
                let factor = 10f64.powi(field.scale() as i32);
                float_json((x * factor).round() / factor)
            }
            (Type::String | Type::Text | Type::MediumText, Value::String(s)) => {
                match s.trim() {
                    "" => Json::Null,
                    trimmed => Json::String(trimmed.to_string()),
                }
            }
            (Type::Binary | Type::Blob | Type::MediumBlob, Value::Binary(b)) => {
                if b.is_empty() {
                    Json::Null
                } else {
                    Json::String(hex::encode(b))
                }
            }
            (Type::Date, Value::Date(d)) => Json::String(d.format("%Y-%m-%d").to_string()),
            (Type::DateTime, Value::DateTime(dt)) => Json::String(format_date_time(dt)),
            (Type::Microtime, Value::Microtime(m)) => Json::String(m.to_string()),
            (Type::StringEnum, Value::Enum(e)) => match e.scalar() {
                EnumScalar::Str(s) => Json::String(s.clone()),
                EnumScalar::Int(i) => Json::String(i.to_string()),
            },
            (Type::IntEnum, Value::Enum(e)) => match e.scalar() {
                EnumScalar::Int(i) => Json::from(*i),
                EnumScalar::Str(_) => return Err(self.mismatch(value, field)),
            },
            (Type::Identifier, Value::Identifier(id)) => Json::String(id.to_string()),
            (Type::Uuid | Type::TimeUuid, Value::Uuid(u)) => Json::String(u.hyphenated().to_string()),
            (Type::Message, Value::Message(m)) => require_codec(codec, field)?.encode_message(m, field)?,
            (Type::MessageRef, Value::MessageRef(r)) => {
                require_codec(codec, field)?.encode_message_ref(r, field)?
            }
            (Type::DynamicField, Value::DynamicField(d)) => {
                require_codec(codec, field)?.encode_dynamic_field(d, field)?
            }
            _ => return Err(self.mismatch(value, field)),
        };

        Ok(encoded)
    }

    /// Decode an encoded value
    ///
    /// `Ok(None)` means the input was absent (`null` or blank).
    pub fn decode(&self, encoded: &Encoded, field: &Field, codec: Option<&dyn Codec>) -> Result<Option<Value>> {
        if encoded.is_null() {
            return Ok(self.absent(field));
        }
        if let Json::String(s) = encoded {
            if s.trim().is_empty() {
                return Ok(self.absent(field));
            }
        }

        let fail = |detail: &str| SchemaError::decode(field.name(), self.name(), encoded, detail);

        let value = match self {
            Type::Boolean => Value::Bool(match encoded {
                Json::Bool(b) => *b,
                Json::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
                Json::String(s) => matches!(
                    s.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "on" | "yes"
                ),
                _ => return Err(fail("expected a boolean")),
            }),

            Type::BigInt => {
                let digits = scalar_text(encoded).ok_or_else(|| fail("expected an unsigned integer"))?;
                let n: u128 = digits
                    .parse()
                    .map_err(|_| fail("expected an unsigned integer"))?;
                Value::BigInt(n)
            }

            t if t.int_range().is_some() && !t.is_enum() => {
                Value::Int(decode_i64(encoded).ok_or_else(|| fail("expected an integer"))?)
            }

            Type::Float | Type::Decimal => {
                let x = match encoded {
                    Json::Number(n) => n.as_f64(),
                    Json::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|x| x.is_finite())
                .ok_or_else(|| fail("expected a number"))?;
                Value::Float(x)
            }

            Type::String | Type::Text | Type::MediumText => {
                let text = scalar_text(encoded).ok_or_else(|| fail("expected a string"))?;
                Value::String(text)
            }

            Type::Binary | Type::Blob | Type::MediumBlob => {
                let text = encoded.as_str().ok_or_else(|| fail("expected a hex string"))?;
                let bytes = hex::decode(text.trim()).map_err(|e| fail(&format!("invalid hex: {}", e)))?;
                Value::Binary(bytes)
            }

            Type::Date => {
                let text = encoded.as_str().map(str::trim).ok_or_else(|| fail("expected a date string"))?;
                if !Format::Date.is_valid(text) {
                    return Err(fail("expected the format YYYY-MM-DD"));
                }
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map_err(|e| fail(&e.to_string()))?;
                Value::Date(date)
            }

            Type::DateTime => {
                let text = encoded.as_str().map(str::trim).ok_or_else(|| fail("expected a date-time string"))?;
                Value::DateTime(parse_date_time(text).ok_or_else(|| fail("expected an ISO-8601 date-time"))?)
            }

            Type::Microtime => {
                let text = scalar_text(encoded).ok_or_else(|| fail("expected a microtime string"))?;
                Value::Microtime(Microtime::parse(&text).map_err(|e| fail(&e.to_string()))?)
            }

            Type::StringEnum | Type::IntEnum => {
                let class = field.enum_class().ok_or_else(|| fail("field has no enum class"))?;
                let scalar = match self {
                    Type::IntEnum => EnumScalar::Int(decode_i64(encoded).ok_or_else(|| fail("expected an integer"))?),
                    _ => EnumScalar::Str(scalar_text(encoded).ok_or_else(|| fail("expected a string"))?),
                };
                let member = class
                    .member(&scalar)
                    .ok_or_else(|| fail(&format!("[{}] is not a member of enum [{}]", scalar, class.name())))?;
                Value::Enum(member)
            }

            Type::Identifier => {
                let text = scalar_text(encoded).ok_or_else(|| fail("expected a string"))?;
                Value::Identifier(Identifier::new(text).map_err(|e| fail(&e.to_string()))?)
            }

            Type::Uuid | Type::TimeUuid => {
                let text = encoded.as_str().ok_or_else(|| fail("expected a uuid string"))?;
                Value::Uuid(Uuid::parse_str(text.trim()).map_err(|e| fail(&e.to_string()))?)
            }

            Type::Message => Value::Message(Box::new(require_codec(codec, field)?.decode_message(encoded, field)?)),

            Type::MessageRef => Value::MessageRef(require_codec(codec, field)?.decode_message_ref(encoded, field)?),

            Type::DynamicField => {
                Value::DynamicField(require_codec(codec, field)?.decode_dynamic_field(encoded, field)?)
            }

            _ => return Err(fail("unsupported type")),
        };

        Ok(Some(value))
    }

    /// Enum fields fall back to their declared default for absent input.
    fn absent(&self, field: &Field) -> Option<Value> {
        if self.is_enum() {
            return field.default_value(None).and_then(|d| d.into_single());
        }
        None
    }

    fn mismatch(&self, value: &Value, field: &Field) -> SchemaError {
        SchemaError::validation(
            field.name(),
            value,
            format!("cannot encode a [{}] value as [{}]", value.kind(), self.name()),
        )
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn guard_finite(x: f64, value: &Value, field: &Field) -> Result<()> {
    if !x.is_finite() {
        return Err(SchemaError::validation(field.name(), value, "must be a finite number"));
    }
    Ok(())
}

fn guard_pattern_and_format(s: &str, value: &Value, field: &Field) -> Result<()> {
    if let Some(pattern) = field.pattern() {
        if !pattern.is_match(s) {
            return Err(SchemaError::validation(
                field.name(),
                value,
                format!("must match the pattern [{}]", pattern.as_str()),
            ));
        }
    }

    let format = field.format();
    if !format.is_valid(s) {
        return Err(SchemaError::validation(
            field.name(),
            value,
            format!("must be a valid [{}]", format.name()),
        ));
    }
    Ok(())
}

fn require_codec<'a>(codec: Option<&'a dyn Codec>, field: &Field) -> Result<&'a dyn Codec> {
    codec.ok_or_else(|| {
        SchemaError::Logic(format!(
            "field [{}] of type [{}] requires a codec",
            field.name(),
            field.kind().name()
        ))
    })
}

/// Text of a string or number input, trimmed
fn scalar_text(encoded: &Encoded) -> Option<String> {
    match encoded {
        Json::String(s) => Some(s.trim().to_string()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_i64(encoded: &Encoded) -> Option<i64> {
    match encoded {
        Json::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|x| x.fract() == 0.0 && *x >= i64::MIN as f64 && *x <= i64::MAX as f64)
                .map(|x| x as i64)
        }),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float_json(x: f64) -> Json {
    serde_json::Number::from_f64(x).map_or(Json::Null, Json::Number)
}

/// ISO-8601 in UTC with microseconds, e.g. `2014-12-25T12:13:14.123456+00:00`
pub fn format_date_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse an ISO-8601 date-time in any offset, normalized to UTC and
/// truncated to microseconds
pub fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(6))
}

fn generate_time_uuid() -> Uuid {
    let seed = Uuid::new_v4();
    let mut node = [0u8; 6];
    node.copy_from_slice(&seed.as_bytes()[10..16]);
    // random node ids set the multicast bit
    node[0] |= 0x01;
    Uuid::now_v1(&node)
}
