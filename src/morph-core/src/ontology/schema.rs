//! Per-class schema with derived relation metadata.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{PropertyKey, PropertyType};

use super::RelationKind;

/// Mapping from property name to type descriptor for one class, plus the
/// metadata derived during registration: which properties were injected as
/// implicit reverses, the relation kind of each reference property, and
/// which inherited properties were explicitly redefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    props: BTreeMap<PropertyKey, PropertyType>,
    implicit: BTreeSet<PropertyKey>,
    relations: BTreeMap<PropertyKey, RelationKind>,
    redefined: BTreeSet<PropertyKey>,
}

impl Schema {
    /// Create an empty schema.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the type descriptor for a property.
    pub fn get(&self, name: &str) -> Option<&PropertyType> {
        self.props.get(name)
    }

    /// Check if the schema defines a property.
    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    /// Number of properties in the schema.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Check if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Iterate over all `(name, type)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &PropertyType)> {
        self.props.iter()
    }

    /// Iterate over all property names.
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.props.keys()
    }

    /// Check if a property was injected as an implicit reverse.
    pub fn is_implicit(&self, name: &str) -> bool {
        self.implicit.contains(name)
    }

    /// The set of implicit property names.
    pub fn implicit(&self) -> &BTreeSet<PropertyKey> {
        &self.implicit
    }

    /// Get the relation kind of a reference property.
    pub fn relation(&self, name: &str) -> Option<RelationKind> {
        self.relations.get(name).copied()
    }

    /// Check if an inherited property was explicitly redefined.
    pub fn is_redefined(&self, name: &str) -> bool {
        self.redefined.contains(name)
    }

    /// The class referenced by a property, if it is a reference.
    pub fn target_class(&self, name: &str) -> Option<&str> {
        self.props.get(name).and_then(PropertyType::target_class)
    }

    /// Iterate over the reference properties (name, referenced class).
    pub fn reference_props(&self) -> impl Iterator<Item = (&PropertyKey, &PropertyType)> {
        self.props.iter().filter(|(_, t)| t.is_reference())
    }

    /// Insert a declared property, marking redefinition of an inherited one.
    pub(crate) fn insert_declared(&mut self, name: PropertyKey, prop_type: PropertyType) -> bool {
        let redefined = self.props.contains_key(&name);
        if redefined {
            self.redefined.insert(name.clone());
            // A declared property is authoritative, never implicit.
            self.implicit.remove(&name);
        }
        self.props.insert(name, prop_type);
        redefined
    }

    /// Insert an implicit reverse property with its relation kind.
    pub(crate) fn insert_implicit(
        &mut self,
        name: PropertyKey,
        prop_type: PropertyType,
        kind: RelationKind,
    ) {
        self.implicit.insert(name.clone());
        self.relations.insert(name.clone(), kind);
        self.props.insert(name, prop_type);
    }

    pub(crate) fn set_relation(&mut self, name: PropertyKey, kind: RelationKind) {
        self.relations.insert(name, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LiteralType;

    #[test]
    fn test_declared_and_implicit_properties() {
        let mut schema = Schema::empty();
        schema.insert_declared("title".to_string(), LiteralType::Text.into());
        schema.insert_implicit(
            "episodes".to_string(),
            PropertyType::ordered_list("Episode"),
            RelationKind::OrderedOneToMany,
        );

        assert!(schema.contains("title"));
        assert!(!schema.is_implicit("title"));
        assert!(schema.is_implicit("episodes"));
        assert_eq!(
            schema.relation("episodes"),
            Some(RelationKind::OrderedOneToMany)
        );
        assert_eq!(schema.target_class("episodes"), Some("Episode"));
        assert_eq!(schema.target_class("title"), None);
    }

    #[test]
    fn test_redefinition_is_tracked() {
        let mut schema = Schema::empty();
        assert!(!schema.insert_declared("title".to_string(), LiteralType::Text.into()));
        assert!(schema.insert_declared("title".to_string(), LiteralType::Int.into()));
        assert!(schema.is_redefined("title"));
    }

    #[test]
    fn test_declared_overrides_implicit() {
        let mut schema = Schema::empty();
        schema.insert_implicit(
            "video".to_string(),
            PropertyType::object("Video"),
            RelationKind::OrderedManyToOne,
        );
        schema.insert_declared("video".to_string(), PropertyType::object("Video"));
        assert!(!schema.is_implicit("video"));
    }
}
