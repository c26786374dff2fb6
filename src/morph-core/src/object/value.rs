//! Values exchanged through the typed view.

use crate::types::Literal;

use super::Object;

/// A value passed to or returned from a typed view: a literal, one object,
/// or a collection of objects.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// A literal value.
    Literal(Literal),
    /// A single referenced object.
    One(Object),
    /// A collection of referenced objects.
    Many(Vec<Object>),
}

impl PropValue {
    /// Whether this value references objects rather than a literal.
    pub const fn is_reference(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }

    /// Try to get the literal value.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Try to get a single referenced object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::One(o) => Some(o),
            Self::Many(os) if os.len() == 1 => os.first(),
            _ => None,
        }
    }

    /// The referenced objects, however many there are.
    pub fn objects(&self) -> Vec<Object> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::One(o) => vec![o.clone()],
            Self::Many(os) => os.clone(),
        }
    }
}

impl From<Literal> for PropValue {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::Literal(Literal::from(s))
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        Self::Literal(Literal::from(s))
    }
}

impl From<i64> for PropValue {
    fn from(i: i64) -> Self {
        Self::Literal(Literal::from(i))
    }
}

impl From<i32> for PropValue {
    fn from(i: i32) -> Self {
        Self::Literal(Literal::from(i))
    }
}

impl From<f64> for PropValue {
    fn from(f: f64) -> Self {
        Self::Literal(Literal::from(f))
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        Self::Literal(Literal::from(b))
    }
}

impl From<Object> for PropValue {
    fn from(o: Object) -> Self {
        Self::One(o)
    }
}

impl From<&Object> for PropValue {
    fn from(o: &Object) -> Self {
        Self::One(o.clone())
    }
}

impl From<Vec<Object>> for PropValue {
    fn from(os: Vec<Object>) -> Self {
        Self::Many(os)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{media_ontology, monk_episode};
    use crate::Graph;

    #[test]
    fn test_literal_conversions() {
        assert_eq!(
            PropValue::from("Monk").as_literal(),
            Some(&Literal::from("Monk"))
        );
        assert_eq!(
            PropValue::from(3i64).as_literal(),
            Some(&Literal::from(3i64))
        );
        assert!(!PropValue::from(true).is_reference());
    }

    #[test]
    fn test_object_conversions() {
        media_ontology();
        let g = Graph::new();
        let (series, episode) = monk_episode(&g);

        let one = PropValue::from(&series);
        assert!(one.is_reference());
        assert_eq!(one.as_object(), Some(&series));
        assert_eq!(one.objects().len(), 1);

        let many = PropValue::from(vec![series, episode]);
        assert_eq!(many.as_object(), None);
        assert_eq!(many.objects().len(), 2);
    }
}
