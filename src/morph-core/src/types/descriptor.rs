//! Type descriptors for class schemas.

use serde::{Deserialize, Serialize};

use super::{ClassName, Literal};

/// Type descriptor for a literal property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralType {
    /// UTF-8 text.
    Text,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// Boolean.
    Bool,
    /// A registered extension type, by name.
    Custom(String),
}

impl LiteralType {
    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Check whether the given value is an instance of this type.
    pub fn matches(&self, value: &Literal) -> bool {
        match (self, value) {
            (Self::Text, Literal::Text(_))
            | (Self::Int, Literal::Int(_))
            | (Self::Float, Literal::Float(_))
            | (Self::Bool, Literal::Bool(_)) => true,
            // Ints are acceptable where floats are expected.
            (Self::Float, Literal::Int(_)) => true,
            (Self::Custom(name), Literal::Custom { type_name, .. }) => name == type_name,
            _ => false,
        }
    }

    /// Get the display name for this type.
    pub fn display_name(&self) -> String {
        match self {
            Self::Text => "Text".to_string(),
            Self::Int => "Int".to_string(),
            Self::Float => "Float".to_string(),
            Self::Bool => "Bool".to_string(),
            Self::Custom(name) => name.clone(),
        }
    }
}

impl std::fmt::Display for LiteralType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Type descriptor for a schema property.
///
/// A property is either a scalar literal, a singular reference to another
/// class, or an ordered/unordered collection of references. Collections of
/// literals are not part of the data model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    /// Scalar literal of the given type.
    Literal(LiteralType),
    /// Singular reference to a class.
    Object(ClassName),
    /// Ordered collection of references to a class.
    OrderedList(ClassName),
    /// Unordered collection of references to a class.
    UnorderedSet(ClassName),
}

impl PropertyType {
    /// Singular reference to the given class.
    pub fn object(class: impl Into<ClassName>) -> Self {
        Self::Object(class.into())
    }

    /// Ordered collection of references to the given class.
    pub fn ordered_list(class: impl Into<ClassName>) -> Self {
        Self::OrderedList(class.into())
    }

    /// Unordered collection of references to the given class.
    pub fn unordered_set(class: impl Into<ClassName>) -> Self {
        Self::UnorderedSet(class.into())
    }

    /// Check if this property references another class.
    pub const fn is_reference(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }

    /// Check if this property holds a collection of references.
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::OrderedList(_) | Self::UnorderedSet(_))
    }

    /// Get the referenced class, if any.
    pub fn target_class(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Object(c) | Self::OrderedList(c) | Self::UnorderedSet(c) => Some(c),
        }
    }
}

impl From<LiteralType> for PropertyType {
    fn from(lt: LiteralType) -> Self {
        Self::Literal(lt)
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(lt) => write!(f, "{lt}"),
            Self::Object(c) => write!(f, "{c}"),
            Self::OrderedList(c) => write!(f, "[{c}]"),
            Self::UnorderedSet(c) => write!(f, "{{{c}}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_type_matching() {
        assert!(LiteralType::Text.matches(&Literal::from("a")));
        assert!(LiteralType::Int.matches(&Literal::from(1i64)));
        assert!(LiteralType::Float.matches(&Literal::from(1i64)));
        assert!(!LiteralType::Int.matches(&Literal::from(1.0f64)));
        assert!(!LiteralType::Bool.matches(&Literal::from("true")));
    }

    #[test]
    fn test_custom_type_matching() {
        let lang = LiteralType::Custom("language".to_string());
        assert!(lang.matches(&Literal::custom("language", "en")));
        assert!(!lang.matches(&Literal::custom("country", "es")));
        assert!(!lang.matches(&Literal::from("en")));
    }

    #[test]
    fn test_property_type_shape() {
        let p = PropertyType::object("Series");
        assert!(p.is_reference());
        assert!(!p.is_collection());
        assert_eq!(p.target_class(), Some("Series"));

        let l = PropertyType::ordered_list("Episode");
        assert!(l.is_collection());
        assert_eq!(l.to_string(), "[Episode]");

        let lit = PropertyType::from(LiteralType::Int);
        assert!(!lit.is_reference());
        assert_eq!(lit.target_class(), None);
    }
}
