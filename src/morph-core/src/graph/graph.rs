//! The owning graph and its handle.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use common_config::{GraphConfig, TypingMode};
use common_error::{MorphError, MorphResult};

use crate::ontology::{self, ClassDef};
use crate::types::{ClassName, Literal, PropertyKey, PropertyType};

use super::backend::{Backend, MemoryBackend};
use super::identifiers::{new_graph_id, new_node_id};
use super::{GraphId, Node, NodeId};

/// Owned graph state behind a [`Graph`] handle.
#[derive(Debug)]
pub(crate) struct GraphData {
    dynamic: bool,
    backend: MemoryBackend,
}

impl GraphData {
    pub(crate) fn backend(&self) -> &MemoryBackend {
        &self.backend
    }
}

/// An owning collection of nodes.
///
/// `Graph` is a cheap handle (`Rc` + interior mutability, the store is
/// single-threaded); clones refer to the same graph. Dropping the last
/// handle releases the nodes. A non-owning reference is registered with
/// the ontology so class registration can revalidate graphs in dynamic
/// typing mode.
#[derive(Debug, Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphData>>,
}

impl Graph {
    /// Create a graph with static typing: class membership is fixed when
    /// a node is created.
    pub fn new() -> Self {
        Self::construct(false)
    }

    /// Create a graph with dynamic typing: class membership is recomputed
    /// from the registered ontology after every mutation.
    pub fn new_dynamic() -> Self {
        Self::construct(true)
    }

    /// Create a graph with the typing mode taken from configuration.
    pub fn with_config(config: &GraphConfig) -> Self {
        Self::construct(config.typing == TypingMode::Dynamic)
    }

    fn construct(dynamic: bool) -> Self {
        let backend = MemoryBackend::new(new_graph_id());
        let inner = Rc::new(RefCell::new(GraphData { dynamic, backend }));
        ontology::register_graph(Rc::downgrade(&inner));
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Rc<RefCell<GraphData>>) -> Self {
        Self { inner }
    }

    /// Graph identity.
    pub fn id(&self) -> GraphId {
        self.inner.borrow().backend.graph_id()
    }

    /// Whether this graph recomputes class membership on mutation.
    pub fn is_dynamic(&self) -> bool {
        self.inner.borrow().dynamic
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().backend.len()
    }

    /// Whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().backend.is_empty()
    }

    /// Delete all nodes.
    pub fn clear(&self) {
        self.inner.borrow_mut().backend.clear();
    }

    /// Whether the node belongs to this graph (identity test).
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.borrow().backend.contains(id)
    }

    /// All node ids, in creation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.inner.borrow().backend.node_ids()
    }

    /// Ids of the nodes currently satisfying a class.
    pub fn nodes_of_class(&self, class: &str) -> Vec<NodeId> {
        self.inner.borrow().backend.nodes_of_class(class)
    }

    /// Create a node with the given literal properties and classes.
    ///
    /// In dynamic mode the class list is ignored and membership is
    /// computed from the ontology instead.
    pub fn create_node<I>(
        &self,
        literals: I,
        classes: impl IntoIterator<Item = ClassName>,
    ) -> MorphResult<NodeId>
    where
        I: IntoIterator<Item = (PropertyKey, Literal)>,
    {
        let id = new_node_id();
        {
            let mut data = self.inner.borrow_mut();
            let mut node = Node::new(id, data.backend.graph_id());
            for (name, value) in literals {
                node.set_literal(name, value)?;
            }
            if !data.dynamic {
                for class in classes {
                    node.add_class(class);
                }
            }
            data.backend.insert(node);
        }
        self.update_valid_classes(id)?;
        log::debug!("created node {id}");
        Ok(id)
    }

    /// Delete a node, first severing all of its edges and their mirrors.
    pub fn delete_node(&self, id: NodeId) -> MorphResult<()> {
        let mut affected = Vec::new();
        {
            let mut data = self.inner.borrow_mut();
            data.backend.remove(id)?;
            for other in data.backend.node_ids() {
                if let Some(node) = data.backend.node_mut(other) {
                    if node.remove_all_edges_to(id) {
                        affected.push(other);
                    }
                }
            }
        }
        for other in affected {
            self.update_valid_classes(other)?;
        }
        log::debug!("deleted node {id}");
        Ok(())
    }

    /// Add a mirrored link: a directed edge `from --name--> to` plus its
    /// mirror `to --reverse_name--> from`. Rolls the first edge back if
    /// the mirror cannot be added.
    pub fn add_link(
        &self,
        from: NodeId,
        name: &str,
        to: NodeId,
        reverse_name: &str,
    ) -> MorphResult<()> {
        self.add_link_with(from, name, to, reverse_name, true)
    }

    pub(crate) fn add_link_with(
        &self,
        from: NodeId,
        name: &str,
        to: NodeId,
        reverse_name: &str,
        revalidate: bool,
    ) -> MorphResult<()> {
        {
            let mut data = self.inner.borrow_mut();
            if !data.backend.contains(from) || !data.backend.contains(to) {
                return Err(MorphError::graph(format!(
                    "cannot link {from} -> {to} under '{name}': both nodes must \
                     live in the same graph"
                )));
            }
            data.backend.add_directed_edge(from, name, to)?;
            if let Err(err) = data.backend.add_directed_edge(to, reverse_name, from) {
                let _ = data.backend.remove_directed_edge(from, name, to);
                return Err(err);
            }
        }
        if revalidate {
            self.update_valid_classes(from)?;
            self.update_valid_classes(to)?;
        }
        log::debug!("linked {from} --{name}--> {to} (mirror '{reverse_name}')");
        Ok(())
    }

    /// Remove a mirrored link: both the directed edge and its mirror are
    /// removed atomically (the first removal is rolled back if the mirror
    /// removal fails).
    pub fn remove_link(
        &self,
        from: NodeId,
        name: &str,
        to: NodeId,
        reverse_name: &str,
    ) -> MorphResult<()> {
        self.remove_link_with(from, name, to, reverse_name, true)
    }

    pub(crate) fn remove_link_with(
        &self,
        from: NodeId,
        name: &str,
        to: NodeId,
        reverse_name: &str,
        revalidate: bool,
    ) -> MorphResult<()> {
        {
            let mut data = self.inner.borrow_mut();
            data.backend.remove_directed_edge(from, name, to)?;
            if let Err(err) = data.backend.remove_directed_edge(to, reverse_name, from) {
                let _ = data.backend.add_directed_edge(from, name, to);
                return Err(err);
            }
        }
        if revalidate {
            self.update_valid_classes(from)?;
            self.update_valid_classes(to)?;
        }
        Ok(())
    }

    /// Add a single directed edge without a mirror. Used when replaying
    /// exported records, where both directions appear as records.
    pub(crate) fn add_directed_edge_raw(
        &self,
        from: NodeId,
        name: &str,
        to: NodeId,
    ) -> MorphResult<()> {
        self.inner
            .borrow_mut()
            .backend
            .add_directed_edge(from, name, to)
    }

    /// Get a literal property of a node.
    pub fn literal(&self, id: NodeId, name: &str) -> MorphResult<Literal> {
        self.with_node(id, |node| node.get_literal(name).cloned())?
    }

    /// Set a literal property of a node.
    pub fn set_literal(&self, id: NodeId, name: &str, value: Literal) -> MorphResult<()> {
        self.set_literal_with(id, name, value, true)
    }

    pub(crate) fn set_literal_with(
        &self,
        id: NodeId,
        name: &str,
        value: Literal,
        revalidate: bool,
    ) -> MorphResult<()> {
        {
            let mut data = self.inner.borrow_mut();
            data.backend
                .node_mut(id)
                .ok_or_else(|| missing_node(id))?
                .set_literal(name.to_string(), value)?;
        }
        if revalidate {
            self.update_valid_classes(id)?;
        }
        Ok(())
    }

    /// Remove a literal property of a node.
    pub fn remove_literal(&self, id: NodeId, name: &str) -> MorphResult<Option<Literal>> {
        let removed = {
            let mut data = self.inner.borrow_mut();
            data.backend
                .node_mut(id)
                .ok_or_else(|| missing_node(id))?
                .remove_literal(name)
        };
        self.update_valid_classes(id)?;
        Ok(removed)
    }

    /// The nodes a node points to under an edge name (all edges when
    /// `None`). Re-derived from current state on every call.
    pub fn edge_endpoints(&self, id: NodeId, name: Option<&str>) -> MorphResult<Vec<NodeId>> {
        self.with_node(id, |node| node.outgoing_edge_endpoints(name))?
    }

    /// Snapshot of a node's literal `(name, value)` items.
    pub fn literal_items(&self, id: NodeId) -> MorphResult<Vec<(PropertyKey, Literal)>> {
        self.with_node(id, |node| {
            node.literal_items()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
    }

    /// Snapshot of a node's edge `(name, targets)` items.
    pub fn edge_items(&self, id: NodeId) -> MorphResult<Vec<(PropertyKey, Vec<NodeId>)>> {
        self.with_node(id, |node| {
            node.edge_items()
                .map(|(k, v)| (k.clone(), v.to_vec()))
                .collect()
        })
    }

    /// All property names of a node.
    pub fn keys(&self, id: NodeId) -> MorphResult<Vec<PropertyKey>> {
        self.with_node(id, |node| node.keys().cloned().collect())
    }

    /// The classes a node currently satisfies.
    pub fn node_classes(&self, id: NodeId) -> MorphResult<BTreeSet<ClassName>> {
        self.with_node(id, |node| node.classes().clone())
    }

    /// Whether a node currently satisfies a class.
    pub fn is_instance(&self, id: NodeId, class: &str) -> MorphResult<bool> {
        self.with_node(id, |node| node.is_instance(class))
    }

    /// Check a node against a class definition's `valid` set, ignoring
    /// any cached membership.
    pub fn is_valid_instance(&self, id: NodeId, def: &ClassDef) -> MorphResult<bool> {
        let data = self.inner.borrow();
        let node = data.backend.node(id).ok_or_else(|| missing_node(id))?;
        Ok(is_valid_instance_in(&data.backend, node, def))
    }

    /// Human-readable description of why a node fails a class definition's
    /// `valid` set. Empty when the node is a valid instance.
    pub fn invalid_properties(&self, id: NodeId, def: &ClassDef) -> MorphResult<String> {
        let data = self.inner.borrow();
        let node = data.backend.node(id).ok_or_else(|| missing_node(id))?;

        let mut problems = Vec::new();
        for prop in def.valid() {
            if !node.has_property(prop) {
                problems.push(format!("property '{prop}' is missing"));
                continue;
            }
            if !property_satisfies(&data.backend, node, prop, def) {
                let expected = def
                    .schema()
                    .get(prop)
                    .map_or_else(|| "?".to_string(), ToString::to_string);
                problems.push(format!(
                    "property '{prop}' does not satisfy the declared type '{expected}'"
                ));
            }
        }
        Ok(problems.join("\n"))
    }

    /// Check only the `valid` properties actually present on the node
    /// against their declared types (the tolerant path for incomplete
    /// instances).
    pub(crate) fn satisfies_present_valid_props(
        &self,
        id: NodeId,
        def: &ClassDef,
    ) -> MorphResult<bool> {
        let data = self.inner.borrow();
        let node = data.backend.node(id).ok_or_else(|| missing_node(id))?;
        Ok(def
            .valid()
            .iter()
            .filter(|p| node.has_property(p))
            .all(|p| property_satisfies(&data.backend, node, p, def)))
    }

    /// Recompute the classes a node satisfies.
    ///
    /// In dynamic mode, every registered class's `valid` set is tested
    /// against the node; in static mode membership was fixed at creation
    /// and this is a no-op.
    pub fn update_valid_classes(&self, id: NodeId) -> MorphResult<()> {
        if !self.is_dynamic() {
            return Ok(());
        }
        let defs = ontology::class_defs();
        let mut classes = BTreeSet::new();
        {
            let data = self.inner.borrow();
            let node = data.backend.node(id).ok_or_else(|| missing_node(id))?;
            for def in &defs {
                if is_valid_instance_in(&data.backend, node, def) {
                    classes.insert(def.name().to_string());
                }
            }
        }
        let mut data = self.inner.borrow_mut();
        if let Some(node) = data.backend.node_mut(id) {
            node.set_classes(classes);
        }
        Ok(())
    }

    /// Revalidate class membership of every node (dynamic mode only).
    pub(crate) fn revalidate_all(&self) {
        if !self.is_dynamic() {
            return;
        }
        log::debug!("revalidating all nodes in graph {}", self.id());
        for id in self.node_ids() {
            let _ = self.update_valid_classes(id);
        }
    }

    pub(crate) fn with_node<R>(
        &self,
        id: NodeId,
        f: impl FnOnce(&Node) -> R,
    ) -> MorphResult<R> {
        let data = self.inner.borrow();
        let node = data.backend.node(id).ok_or_else(|| missing_node(id))?;
        Ok(f(node))
    }

    pub(crate) fn with_data<R>(&self, f: impl FnOnce(&GraphData) -> R) -> R {
        f(&self.inner.borrow())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

fn missing_node(id: NodeId) -> MorphError {
    MorphError::node_not_found(format!("node {id} is not in this graph"))
}

/// Test a node against a class definition's `valid` set, resolving edge
/// targets through the backend.
pub(crate) fn is_valid_instance_in(backend: &MemoryBackend, node: &Node, def: &ClassDef) -> bool {
    def.valid()
        .iter()
        .all(|prop| node.has_property(prop) && property_satisfies(backend, node, prop, def))
}

/// Whether a present property's value is assignable to its schema type.
///
/// A reference target that lacks the expected class fails the test; it is
/// never an error.
fn property_satisfies(backend: &MemoryBackend, node: &Node, prop: &str, def: &ClassDef) -> bool {
    let Some(prop_type) = def.schema().get(prop) else {
        // Unconstrained property: presence is enough.
        return true;
    };
    match prop_type {
        PropertyType::Literal(lt) => node
            .get_literal(prop)
            .map(|value| lt.matches(value))
            .unwrap_or(false),
        PropertyType::Object(target)
        | PropertyType::OrderedList(target)
        | PropertyType::UnorderedSet(target) => {
            let Ok(endpoints) = node.outgoing_edge_endpoints(Some(prop)) else {
                return false;
            };
            endpoints.iter().all(|&endpoint| {
                backend
                    .node(endpoint)
                    .is_some_and(|n| n.is_instance(target))
            })
        }
    }
}
