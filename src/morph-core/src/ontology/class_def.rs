//! Class definitions and their builder.

use std::collections::{BTreeMap, BTreeSet};

use common_error::MorphResult;
use serde::{Deserialize, Serialize};

use crate::types::{ClassName, Literal, PropertyKey, PropertyType};

use super::Schema;

/// Deserialization function turning a canonical string into a typed value.
pub type Converter = fn(&str) -> MorphResult<Literal>;

/// Declared reverse side of a reference property.
///
/// The shape of the reverse name declares the reverse cardinality: a plain
/// name means the reverse is singular, an ordered/unordered many name means
/// the reverse is a collection of that shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReverseName {
    /// The reverse is a singular reference.
    One(PropertyKey),
    /// The reverse is an ordered collection.
    OrderedMany(PropertyKey),
    /// The reverse is an unordered collection.
    UnorderedMany(PropertyKey),
}

impl ReverseName {
    /// Singular reverse.
    pub fn one(name: impl Into<PropertyKey>) -> Self {
        Self::One(name.into())
    }

    /// Ordered collection reverse.
    pub fn ordered_many(name: impl Into<PropertyKey>) -> Self {
        Self::OrderedMany(name.into())
    }

    /// Unordered collection reverse.
    pub fn unordered_many(name: impl Into<PropertyKey>) -> Self {
        Self::UnorderedMany(name.into())
    }

    /// The reverse property name, regardless of shape.
    pub fn name(&self) -> &str {
        match self {
            Self::One(n) | Self::OrderedMany(n) | Self::UnorderedMany(n) => n,
        }
    }

    /// The property type the reverse side gets when injected into the
    /// referenced class.
    pub(crate) fn implicit_type(&self, owner: &str) -> PropertyType {
        match self {
            Self::One(_) => PropertyType::object(owner),
            Self::OrderedMany(_) => PropertyType::ordered_list(owner),
            Self::UnorderedMany(_) => PropertyType::unordered_set(owner),
        }
    }
}

/// A validated, registered class definition.
///
/// Instances are produced by the registry from a [`ClassDefBuilder`]; the
/// schema here is the merged one (own declarations over the parent's,
/// including every implicit property known at the time of the last
/// registration touching this class).
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub(crate) name: ClassName,
    pub(crate) parent: Option<ClassName>,
    pub(crate) schema: Schema,
    pub(crate) reverse_lookup: BTreeMap<PropertyKey, ReverseName>,
    pub(crate) valid: BTreeSet<PropertyKey>,
    pub(crate) unique: BTreeSet<PropertyKey>,
    pub(crate) display_order: Vec<PropertyKey>,
    pub(crate) converters: BTreeMap<PropertyKey, Converter>,
}

impl ClassDef {
    /// Start building a class definition.
    pub fn builder(name: impl Into<ClassName>) -> ClassDefBuilder {
        ClassDefBuilder::new(name)
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class name (`None` only for the root class).
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// The merged schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Properties required for an instance to satisfy this class.
    pub fn valid(&self) -> &BTreeSet<PropertyKey> {
        &self.valid
    }

    /// Properties forming the identity key of this class.
    pub fn unique(&self) -> &BTreeSet<PropertyKey> {
        &self.unique
    }

    /// Presentation ordering hint.
    pub fn display_order(&self) -> &[PropertyKey] {
        &self.display_order
    }

    /// The declared reverse for a property, if any.
    pub fn reverse(&self, prop: &str) -> Option<&ReverseName> {
        self.reverse_lookup.get(prop)
    }

    /// Resolve the reverse edge name used when linking through `prop`.
    ///
    /// Falls back to the `is<Prop>Of` convention for properties outside the
    /// declared reverse lookup.
    pub fn reverse_name(&self, prop: &str) -> String {
        match self.reverse_lookup.get(prop) {
            Some(r) => r.name().to_string(),
            None => is_of(prop),
        }
    }

    /// The converter registered for a property, if any.
    pub fn converter(&self, prop: &str) -> Option<Converter> {
        self.converters.get(prop).copied()
    }
}

/// The default reverse edge name for a property without a declared reverse.
pub fn is_of(prop: &str) -> String {
    let mut chars = prop.chars();
    match chars.next() {
        Some(first) => format!("is{}{}Of", first.to_uppercase(), chars.as_str()),
        None => "isOf".to_string(),
    }
}

/// Builder collecting the declared parts of a class definition.
///
/// Nothing is validated until the definition is registered; the registry
/// merges the parent schema, classifies relations, injects implicit
/// reverse properties and checks every constraint as a single atomic step.
#[derive(Debug, Clone)]
pub struct ClassDefBuilder {
    pub(crate) name: ClassName,
    pub(crate) parent: Option<ClassName>,
    pub(crate) extra_parents: Vec<ClassName>,
    pub(crate) schema: Vec<(PropertyKey, PropertyType)>,
    pub(crate) reverse_lookup: BTreeMap<PropertyKey, ReverseName>,
    pub(crate) valid: BTreeSet<PropertyKey>,
    pub(crate) unique: BTreeSet<PropertyKey>,
    pub(crate) display_order: Vec<PropertyKey>,
    pub(crate) converters: BTreeMap<PropertyKey, Converter>,
}

impl ClassDefBuilder {
    fn new(name: impl Into<ClassName>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            extra_parents: Vec::new(),
            schema: Vec::new(),
            reverse_lookup: BTreeMap::new(),
            valid: BTreeSet::new(),
            unique: BTreeSet::new(),
            display_order: Vec::new(),
            converters: BTreeMap::new(),
        }
    }

    /// Set the parent class. Declaring more than one parent is rejected at
    /// registration (single inheritance only).
    #[must_use]
    pub fn parent(mut self, name: impl Into<ClassName>) -> Self {
        let name = name.into();
        if self.parent.is_some() {
            self.extra_parents.push(name);
        } else {
            self.parent = Some(name);
        }
        self
    }

    /// Declare a schema property.
    #[must_use]
    pub fn property(mut self, name: impl Into<PropertyKey>, t: impl Into<PropertyType>) -> Self {
        self.schema.push((name.into(), t.into()));
        self
    }

    /// Declare the reverse name for a reference property.
    #[must_use]
    pub fn reverse(mut self, prop: impl Into<PropertyKey>, reverse: ReverseName) -> Self {
        self.reverse_lookup.insert(prop.into(), reverse);
        self
    }

    /// Declare the properties required for a valid instance.
    #[must_use]
    pub fn valid<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PropertyKey>,
    {
        self.valid = props.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the identity-key properties. Defaults to `valid` when empty.
    #[must_use]
    pub fn unique<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PropertyKey>,
    {
        self.unique = props.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the presentation ordering hint.
    #[must_use]
    pub fn display_order<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PropertyKey>,
    {
        self.display_order = props.into_iter().map(Into::into).collect();
        self
    }

    /// Register a string deserializer for a property.
    #[must_use]
    pub fn converter(mut self, prop: impl Into<PropertyKey>, conv: Converter) -> Self {
        self.converters.insert(prop.into(), conv);
        self
    }

    /// Validate and register this definition with the ontology.
    pub fn register(self) -> MorphResult<()> {
        super::register(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LiteralType;

    #[test]
    fn test_is_of_naming() {
        assert_eq!(is_of("director"), "isDirectorOf");
        assert_eq!(is_of("a"), "isAOf");
    }

    #[test]
    fn test_builder_collects_declarations() {
        let builder = ClassDef::builder("Episode")
            .parent("Video")
            .property("series", PropertyType::object("Series"))
            .property("season", LiteralType::Int)
            .reverse("series", ReverseName::ordered_many("episodes"))
            .valid(["series", "season"]);

        assert_eq!(builder.name, "Episode");
        assert_eq!(builder.parent.as_deref(), Some("Video"));
        assert_eq!(builder.schema.len(), 2);
        assert!(builder.valid.contains("season"));
    }

    #[test]
    fn test_builder_tracks_extra_parents() {
        let builder = ClassDef::builder("Bad").parent("A").parent("B");
        assert_eq!(builder.parent.as_deref(), Some("A"));
        assert_eq!(builder.extra_parents, vec!["B".to_string()]);
    }

    #[test]
    fn test_reverse_name_shapes() {
        assert_eq!(ReverseName::one("video").name(), "video");
        assert_eq!(
            ReverseName::ordered_many("episodes").implicit_type("Episode"),
            PropertyType::ordered_list("Episode")
        );
        assert_eq!(
            ReverseName::one("subtitle").implicit_type("Subtitle"),
            PropertyType::object("Subtitle")
        );
    }
}
