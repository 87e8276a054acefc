//! Decoded, in-memory field values

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use crate::message::Message;
use crate::message_ref::MessageRef;
use crate::types::dynamic::DynamicField;
use crate::types::enums::EnumValue;
use crate::types::identifier::Identifier;
use crate::types::microtime::Microtime;

/// A value held by a message field
///
/// Which variant a field accepts is decided by its [`Type`](crate::Type);
/// the guard rejects anything else. Nested messages are owned, never shared,
/// so freezing and cloning walk a plain tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    /// Unsigned values up to 64 bits, held wider so out-of-range input can
    /// be rejected by the guard instead of wrapping
    BigInt(u128),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Microtime(Microtime),
    Enum(EnumValue),
    Identifier(Identifier),
    Uuid(Uuid),
    Message(Box<Message>),
    MessageRef(MessageRef),
    DynamicField(DynamicField),
}

impl Value {
    /// Short name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::BigInt(_) => "big-int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Date(_) => "date",
            Value::DateTime(_) => "date-time",
            Value::Microtime(_) => "microtime",
            Value::Enum(_) => "enum",
            Value::Identifier(_) => "identifier",
            Value::Uuid(_) => "uuid",
            Value::Message(_) => "message",
            Value::MessageRef(_) => "message-ref",
            Value::DynamicField(_) => "dynamic-field",
        }
    }

    /// Blank strings and empty byte buffers count as no value at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(s) => s.trim().is_empty(),
            Value::Binary(b) => b.is_empty(),
            _ => false,
        }
    }

    /// Key used to deduplicate set members: trimmed, lower-cased string form
    pub fn set_key(&self) -> String {
        self.to_string().trim().to_lowercase()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::BigInt(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::Binary(b) => write!(f, "{} bytes", b.len()),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, false)),
            Value::Microtime(m) => write!(f, "{}", m),
            Value::Enum(e) => write!(f, "{}", e),
            Value::Identifier(id) => f.write_str(id.as_str()),
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
            Value::Message(m) => write!(f, "{}", m.schema().id()),
            Value::MessageRef(r) => write!(f, "{}", r),
            Value::DynamicField(d) => write!(f, "{}", d),
        }
    }
}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(v: $source) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    u32 => Int,
    u16 => Int,
    u8 => Int,
    f64 => Float,
    String => String,
    &str => String,
    Vec<u8> => Binary,
    NaiveDate => Date,
    DateTime<Utc> => DateTime,
    Microtime => Microtime,
    EnumValue => Enum,
    Identifier => Identifier,
    Uuid => Uuid,
    Message => Message,
    MessageRef => MessageRef,
    DynamicField => DynamicField,
}
