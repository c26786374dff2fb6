//! Literal value representation.

use serde::{Deserialize, Serialize};

use super::LiteralType;

/// A literal property value stored directly on a node.
///
/// The set of literal types is closed: numeric, text, boolean, plus any
/// extension type registered with the ontology. Extension values are held
/// in canonical string form and interpreted by per-class converters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// UTF-8 text.
    Text(String),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Value of a registered extension type, in canonical string form.
    Custom {
        /// Name of the registered extension type.
        type_name: String,
        /// Canonical string representation of the value.
        value: String,
    },
}

impl Literal {
    /// Create an extension-type literal.
    pub fn custom(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Custom {
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// Get the type descriptor for this value.
    pub fn literal_type(&self) -> LiteralType {
        match self {
            Self::Text(_) => LiteralType::Text,
            Self::Int(_) => LiteralType::Int,
            Self::Float(_) => LiteralType::Float,
            Self::Bool(_) => LiteralType::Bool,
            Self::Custom { type_name, .. } => LiteralType::Custom(type_name.clone()),
        }
    }

    /// Try to get as text reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Custom { value, .. } => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Literal {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
