//! Closed enumerations backed by string or integer values

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SchemaError};

/// The underlying value of an enumeration member
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumScalar {
    Str(String),
    Int(i64),
}

impl fmt::Display for EnumScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumScalar::Str(s) => f.write_str(s),
            EnumScalar::Int(i) => write!(f, "{}", i),
        }
    }
}

/// A named enumeration and its members
///
/// Enum-typed fields are restricted to one class; values from any other
/// class fail the guard even when the scalars coincide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumClass {
    name: String,
    members: Vec<(String, EnumScalar)>,
}

impl EnumClass {
    /// Define a string-backed enumeration from `(member name, value)` pairs
    pub fn strings<'a>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            members: members
                .into_iter()
                .map(|(n, v)| (n.to_string(), EnumScalar::Str(v.to_string())))
                .collect(),
        })
    }

    /// Define an integer-backed enumeration from `(member name, value)` pairs
    pub fn ints<'a>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = (&'a str, i64)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            members: members
                .into_iter()
                .map(|(n, v)| (n.to_string(), EnumScalar::Int(v)))
                .collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_string_backed(&self) -> bool {
        self.members
            .iter()
            .all(|(_, v)| matches!(v, EnumScalar::Str(_)))
    }

    pub fn is_int_backed(&self) -> bool {
        self.members
            .iter()
            .all(|(_, v)| matches!(v, EnumScalar::Int(_)))
    }

    pub fn contains(&self, scalar: &EnumScalar) -> bool {
        self.members.iter().any(|(_, v)| v == scalar)
    }

    /// Look up a member by its underlying value
    pub fn member(&self, scalar: &EnumScalar) -> Option<EnumValue> {
        self.contains(scalar).then(|| EnumValue {
            class: self.name.clone(),
            value: scalar.clone(),
        })
    }

    /// Look up a member by its declared name
    pub fn by_name(&self, member: &str) -> Result<EnumValue> {
        self.members
            .iter()
            .find(|(n, _)| n == member)
            .map(|(_, v)| EnumValue {
                class: self.name.clone(),
                value: v.clone(),
            })
            .ok_or_else(|| {
                SchemaError::Logic(format!("enum [{}] has no member [{}]", self.name, member))
            })
    }

    /// Member for a string value
    pub fn value(&self, value: &str) -> Result<EnumValue> {
        self.member(&EnumScalar::Str(value.to_string()))
            .ok_or_else(|| self.unknown(value))
    }

    /// Member for an integer value
    pub fn int_value(&self, value: i64) -> Result<EnumValue> {
        self.member(&EnumScalar::Int(value))
            .ok_or_else(|| self.unknown(value))
    }

    fn unknown(&self, value: impl fmt::Display) -> SchemaError {
        SchemaError::Logic(format!("enum [{}] has no value [{}]", self.name, value))
    }
}

/// One member of an [`EnumClass`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    class: String,
    value: EnumScalar,
}

impl EnumValue {
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn scalar(&self) -> &EnumScalar {
        &self.value
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            EnumScalar::Str(s) => Some(s),
            EnumScalar::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            EnumScalar::Int(i) => Some(i),
            EnumScalar::Str(_) => None,
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_enum_lookup() {
        let provider = EnumClass::strings("Provider", [("AOL", "aol"), ("GMAIL", "gmail")]);
        assert!(provider.is_string_backed());
        let gmail = provider.value("gmail").unwrap();
        assert_eq!(gmail.class(), "Provider");
        assert_eq!(gmail.as_str(), Some("gmail"));
        assert_eq!(provider.by_name("GMAIL").unwrap(), gmail);
        assert!(provider.value("hotmail").is_err());
    }

    #[test]
    fn test_int_enum_lookup() {
        let priority = EnumClass::ints("Priority", [("NORMAL", 1), ("HIGH", 2)]);
        assert!(priority.is_int_backed());
        assert_eq!(priority.int_value(2).unwrap().as_int(), Some(2));
        assert!(priority.int_value(9).is_err());
    }
}
