//! Node representation.

use std::collections::{BTreeMap, BTreeSet};

use common_error::{MorphError, MorphResult};
use serde::{Deserialize, Serialize};

use crate::types::{ClassName, Literal, PropertyKey};

use super::{GraphId, NodeId};

/// The untyped storage primitive: an identity-bearing container of literal
/// properties and named directed edges to other nodes, together with the
/// set of classes the node currently satisfies.
///
/// A property name is never simultaneously a literal and an edge. Edge
/// values are always an ordered sequence of node references; singularity
/// is an illusion maintained by the typed view layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    graph: GraphId,
    literals: BTreeMap<PropertyKey, Literal>,
    edges: BTreeMap<PropertyKey, Vec<NodeId>>,
    classes: BTreeSet<ClassName>,
}

impl Node {
    pub(crate) fn new(id: NodeId, graph: GraphId) -> Self {
        Self {
            id,
            graph,
            literals: BTreeMap::new(),
            edges: BTreeMap::new(),
            classes: BTreeSet::new(),
        }
    }

    /// Node identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Identifier of the owning graph (non-owning back-reference).
    pub fn graph_id(&self) -> GraphId {
        self.graph
    }

    /// Get a literal property.
    ///
    /// Fails when the name is bound to an edge instead, or not present.
    pub fn get_literal(&self, name: &str) -> MorphResult<&Literal> {
        if self.edges.contains_key(name) {
            return Err(MorphError::graph(format!(
                "property '{name}' is an edge, not a literal"
            )));
        }
        self.literals.get(name).ok_or_else(|| {
            MorphError::property_not_found(format!("no literal property '{name}'"))
        })
    }

    /// Set a literal property. The name must not be bound to an edge.
    pub fn set_literal(&mut self, name: impl Into<PropertyKey>, value: Literal) -> MorphResult<()> {
        let name = name.into();
        if self.edges.contains_key(&name) {
            return Err(MorphError::graph(format!(
                "property '{name}' is an edge, cannot store a literal under it"
            )));
        }
        self.literals.insert(name, value);
        Ok(())
    }

    /// Remove a literal property.
    pub fn remove_literal(&mut self, name: &str) -> Option<Literal> {
        self.literals.remove(name)
    }

    /// Add a directed edge under a name. The name must not be bound to a
    /// literal. The bidirectional contract lives one level up, in the
    /// graph's link operations.
    pub fn add_directed_edge(
        &mut self,
        name: impl Into<PropertyKey>,
        other: NodeId,
    ) -> MorphResult<()> {
        let name = name.into();
        if self.literals.contains_key(&name) {
            return Err(MorphError::graph(format!(
                "property '{name}' is a literal, cannot store an edge under it"
            )));
        }
        self.edges.entry(name).or_default().push(other);
        Ok(())
    }

    /// Remove one directed edge. An edge list emptied by the removal is
    /// dropped entirely.
    pub fn remove_directed_edge(&mut self, name: &str, other: NodeId) -> MorphResult<()> {
        let Some(targets) = self.edges.get_mut(name) else {
            return Err(MorphError::property_not_found(format!(
                "no edge property '{name}'"
            )));
        };
        let Some(pos) = targets.iter().position(|&t| t == other) else {
            return Err(MorphError::graph(format!(
                "no edge '{name}' to node {other}"
            )));
        };
        targets.remove(pos);
        if targets.is_empty() {
            self.edges.remove(name);
        }
        Ok(())
    }

    /// The nodes this node points to under the given edge name, or under
    /// every edge name when `None`.
    ///
    /// The sequence is re-derived from current state on every call; it is
    /// never a snapshot carried across subsequent mutation. An unknown
    /// edge name yields an empty sequence; a literal name is an error.
    pub fn outgoing_edge_endpoints(&self, name: Option<&str>) -> MorphResult<Vec<NodeId>> {
        match name {
            Some(name) => {
                if self.literals.contains_key(name) {
                    return Err(MorphError::graph(format!(
                        "property '{name}' is a literal, not an edge"
                    )));
                }
                Ok(self.edges.get(name).cloned().unwrap_or_default())
            }
            None => Ok(self.edges.values().flatten().copied().collect()),
        }
    }

    /// Whether a name is bound at all (literal or edge).
    pub fn has_property(&self, name: &str) -> bool {
        self.literals.contains_key(name) || self.edges.contains_key(name)
    }

    /// Whether a name is bound to a literal.
    pub fn is_literal(&self, name: &str) -> bool {
        self.literals.contains_key(name)
    }

    /// Whether a name is bound to an edge.
    pub fn is_edge(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// Iterate over the literal property names.
    pub fn literal_keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.literals.keys()
    }

    /// Iterate over the literal `(name, value)` items.
    pub fn literal_items(&self) -> impl Iterator<Item = (&PropertyKey, &Literal)> {
        self.literals.iter()
    }

    /// Iterate over the edge property names.
    pub fn edge_keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.edges.keys()
    }

    /// Iterate over the edge `(name, targets)` items.
    pub fn edge_items(&self) -> impl Iterator<Item = (&PropertyKey, &[NodeId])> {
        self.edges.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// All property names: the literal keys followed by the edge keys.
    /// The two sets are disjoint and their union covers every property.
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.literals.keys().chain(self.edges.keys())
    }

    /// The classes this node currently satisfies.
    pub fn classes(&self) -> &BTreeSet<ClassName> {
        &self.classes
    }

    /// Whether the node satisfies the given class.
    pub fn is_instance(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Add a class to the node's membership set.
    pub fn add_class(&mut self, class: ClassName) {
        self.classes.insert(class);
    }

    /// Remove a class from the node's membership set.
    pub fn remove_class(&mut self, class: &str) {
        self.classes.remove(class);
    }

    pub(crate) fn set_classes(&mut self, classes: BTreeSet<ClassName>) {
        self.classes = classes;
    }

    /// Remove every edge pointing at `other`, under any name. Returns
    /// whether anything was removed.
    pub(crate) fn remove_all_edges_to(&mut self, other: NodeId) -> bool {
        let mut removed = false;
        self.edges.retain(|_, targets| {
            let before = targets.len();
            targets.retain(|&t| t != other);
            removed |= targets.len() != before;
            !targets.is_empty()
        });
        removed
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let props: Vec<String> = self
            .literal_items()
            .map(|(k, v)| format!("{k}={}", common_display::truncate_string(&v.to_string(), 32)))
            .chain(
                self.edge_items()
                    .map(|(k, targets)| format!("{k}->{} node(s)", targets.len())),
            )
            .collect();
        write!(f, "Node#{}({})", self.id, props.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> Node {
        Node::new(1, 1)
    }

    #[test]
    fn test_literal_roundtrip() {
        let mut n = node();
        n.set_literal("title", Literal::from("Monk")).unwrap();
        assert_eq!(n.get_literal("title").unwrap(), &Literal::from("Monk"));
        assert!(n.is_literal("title"));
        assert!(!n.is_edge("title"));
        assert_eq!(n.remove_literal("title"), Some(Literal::from("Monk")));
        assert!(n.get_literal("title").is_err());
    }

    #[test]
    fn test_literal_and_edge_names_are_disjoint() {
        let mut n = node();
        n.set_literal("title", Literal::from("Monk")).unwrap();
        assert!(n.add_directed_edge("title", 2).is_err());

        n.add_directed_edge("series", 2).unwrap();
        assert!(n.set_literal("series", Literal::from("x")).is_err());
        assert!(n.get_literal("series").is_err());
    }

    #[test]
    fn test_edges_are_ordered_sequences() {
        let mut n = node();
        n.add_directed_edge("episodes", 2).unwrap();
        n.add_directed_edge("episodes", 3).unwrap();
        n.add_directed_edge("episodes", 2).unwrap();

        assert_eq!(
            n.outgoing_edge_endpoints(Some("episodes")).unwrap(),
            vec![2, 3, 2]
        );

        // removal drops the first occurrence only
        n.remove_directed_edge("episodes", 2).unwrap();
        assert_eq!(
            n.outgoing_edge_endpoints(Some("episodes")).unwrap(),
            vec![3, 2]
        );
    }

    #[test]
    fn test_empty_edge_list_is_dropped() {
        let mut n = node();
        n.add_directed_edge("series", 2).unwrap();
        n.remove_directed_edge("series", 2).unwrap();
        assert!(!n.has_property("series"));
        assert!(n.remove_directed_edge("series", 2).is_err());
    }

    #[test]
    fn test_endpoints_reflect_current_state() {
        let mut n = node();
        n.add_directed_edge("a", 2).unwrap();
        let before = n.outgoing_edge_endpoints(None).unwrap();
        n.add_directed_edge("b", 3).unwrap();
        let after = n.outgoing_edge_endpoints(None).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn test_keys_cover_all_properties() {
        let mut n = node();
        n.set_literal("title", Literal::from("Monk")).unwrap();
        n.add_directed_edge("episodes", 2).unwrap();
        let keys: Vec<&PropertyKey> = n.keys().collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_classes() {
        let mut n = node();
        n.add_class("Series".to_string());
        assert!(n.is_instance("Series"));
        n.remove_class("Series");
        assert!(!n.is_instance("Series"));
    }
}
