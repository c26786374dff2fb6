//! Relation cardinality classification.

use common_error::{MorphError, MorphResult};
use serde::{Deserialize, Serialize};

use crate::types::PropertyType;

use super::ReverseName;

/// Cardinality kind of a relation between two classes.
///
/// Derived purely from whether the forward property is singular or a
/// collection, and whether the declared reverse name is singular or a
/// collection. The kind is stored on the forward side; the reverse side
/// carries the reciprocal kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// Singular on both sides.
    OneToOne,
    /// Ordered collection forward, singular reverse.
    OrderedOneToMany,
    /// Unordered collection forward, singular reverse.
    UnorderedOneToMany,
    /// Singular forward, ordered collection reverse.
    OrderedManyToOne,
    /// Singular forward, unordered collection reverse.
    UnorderedManyToOne,
    /// Ordered collections on both sides.
    OrderedManyToMany,
    /// Unordered collections on both sides.
    UnorderedManyToMany,
}

impl RelationKind {
    /// The kind seen when following the relation in the other direction.
    pub const fn reciprocal(self) -> Self {
        match self {
            Self::OneToOne => Self::OneToOne,
            Self::OrderedOneToMany => Self::OrderedManyToOne,
            Self::UnorderedOneToMany => Self::UnorderedManyToOne,
            Self::OrderedManyToOne => Self::OrderedOneToMany,
            Self::UnorderedManyToOne => Self::UnorderedOneToMany,
            Self::OrderedManyToMany => Self::OrderedManyToMany,
            Self::UnorderedManyToMany => Self::UnorderedManyToMany,
        }
    }

    /// Whether the forward side of the relation holds a single node.
    pub const fn is_singular(self) -> bool {
        matches!(
            self,
            Self::OneToOne | Self::OrderedManyToOne | Self::UnorderedManyToOne
        )
    }

    /// Classify the relation declared by a forward property type and its
    /// reverse name.
    ///
    /// Returns `None` for literal properties. Mixing an ordered collection
    /// with an unordered reverse (or vice versa) is a definition error.
    pub fn classify(
        class: &str,
        prop: &str,
        forward: &PropertyType,
        reverse: Option<&ReverseName>,
    ) -> MorphResult<Option<Self>> {
        let kind = match (forward, reverse) {
            (PropertyType::Literal(_), _) => return Ok(None),
            (PropertyType::Object(_), None | Some(ReverseName::One(_))) => Self::OneToOne,
            (PropertyType::Object(_), Some(ReverseName::OrderedMany(_))) => Self::OrderedManyToOne,
            (PropertyType::Object(_), Some(ReverseName::UnorderedMany(_))) => {
                Self::UnorderedManyToOne
            }
            (PropertyType::OrderedList(_), None | Some(ReverseName::One(_))) => {
                Self::OrderedOneToMany
            }
            (PropertyType::OrderedList(_), Some(ReverseName::OrderedMany(_))) => {
                Self::OrderedManyToMany
            }
            (PropertyType::UnorderedSet(_), None | Some(ReverseName::One(_))) => {
                Self::UnorderedOneToMany
            }
            (PropertyType::UnorderedSet(_), Some(ReverseName::UnorderedMany(_))) => {
                Self::UnorderedManyToMany
            }
            (PropertyType::OrderedList(_), Some(ReverseName::UnorderedMany(_)))
            | (PropertyType::UnorderedSet(_), Some(ReverseName::OrderedMany(_))) => {
                return Err(MorphError::schema_definition(format!(
                    "in '{class}': property '{prop}' mixes ordered and unordered \
                     sides of a many-to-many relation"
                )));
            }
        };
        Ok(Some(kind))
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::OneToOne => "one-to-one",
            Self::OrderedOneToMany => "ordered one-to-many",
            Self::UnorderedOneToMany => "unordered one-to-many",
            Self::OrderedManyToOne => "ordered many-to-one",
            Self::UnorderedManyToOne => "unordered many-to-one",
            Self::OrderedManyToMany => "ordered many-to-many",
            Self::UnorderedManyToMany => "unordered many-to-many",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reciprocal_kinds() {
        assert_eq!(RelationKind::OneToOne.reciprocal(), RelationKind::OneToOne);
        assert_eq!(
            RelationKind::OrderedManyToOne.reciprocal(),
            RelationKind::OrderedOneToMany
        );
        assert_eq!(
            RelationKind::UnorderedOneToMany.reciprocal(),
            RelationKind::UnorderedManyToOne
        );
        assert_eq!(
            RelationKind::OrderedManyToMany.reciprocal(),
            RelationKind::OrderedManyToMany
        );
    }

    #[test]
    fn test_classify_singular_forward() {
        let forward = PropertyType::object("Series");
        let reverse = ReverseName::ordered_many("episodes");
        let kind = RelationKind::classify("Episode", "series", &forward, Some(&reverse))
            .unwrap()
            .unwrap();
        assert_eq!(kind, RelationKind::OrderedManyToOne);
    }

    #[test]
    fn test_classify_collection_forward() {
        let forward = PropertyType::ordered_list("File");
        let reverse = ReverseName::one("video");
        let kind = RelationKind::classify("Video", "files", &forward, Some(&reverse))
            .unwrap()
            .unwrap();
        assert_eq!(kind, RelationKind::OrderedOneToMany);
    }

    #[test]
    fn test_classify_rejects_mixed_many_to_many() {
        let forward = PropertyType::ordered_list("Tag");
        let reverse = ReverseName::unordered_many("tagged");
        let err = RelationKind::classify("Doc", "tags", &forward, Some(&reverse)).unwrap_err();
        assert!(matches!(err, MorphError::SchemaDefinition(_)));
    }

    #[test]
    fn test_classify_literal_is_not_a_relation() {
        let forward = PropertyType::Literal(crate::types::LiteralType::Int);
        assert_eq!(
            RelationKind::classify("Episode", "season", &forward, None).unwrap(),
            None
        );
    }
}
