//! The storage adapter boundary.

use std::collections::BTreeMap;

use common_error::{MorphError, MorphResult};

use super::{GraphId, Node, NodeId};

/// Storage interface a graph backend must provide.
///
/// The in-memory [`MemoryBackend`] is the reference implementation; any
/// other backend (a persistent store, a graph database adapter) exposes
/// the same node creation/deletion, iteration, containment and
/// directed-edge primitives and the layers above work unchanged.
pub trait Backend {
    /// Identifier of the graph this backend stores.
    fn graph_id(&self) -> GraphId;

    /// Insert a node, returning its id.
    fn insert(&mut self, node: Node) -> NodeId;

    /// Remove a node by id, returning it.
    fn remove(&mut self, id: NodeId) -> MorphResult<Node>;

    /// Borrow a node by id.
    fn node(&self, id: NodeId) -> Option<&Node>;

    /// Mutably borrow a node by id.
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node>;

    /// All node ids, in creation order.
    fn node_ids(&self) -> Vec<NodeId>;

    /// Whether the node belongs to this backend (identity test).
    fn contains(&self, id: NodeId) -> bool;

    /// Number of stored nodes.
    fn len(&self) -> usize;

    /// Whether the backend stores no nodes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all nodes.
    fn clear(&mut self);

    /// Ids of the nodes currently satisfying a class, in creation order.
    fn nodes_of_class(&self, class: &str) -> Vec<NodeId>;

    /// Add one directed edge.
    fn add_directed_edge(&mut self, from: NodeId, name: &str, to: NodeId) -> MorphResult<()>;

    /// Remove one directed edge.
    fn remove_directed_edge(&mut self, from: NodeId, name: &str, to: NodeId) -> MorphResult<()>;
}

/// In-memory node table, the reference backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    graph: GraphId,
    nodes: BTreeMap<NodeId, Node>,
}

impl MemoryBackend {
    pub(crate) fn new(graph: GraphId) -> Self {
        Self {
            graph,
            nodes: BTreeMap::new(),
        }
    }

    fn missing(id: NodeId) -> MorphError {
        MorphError::node_not_found(format!("node {id} is not in this graph"))
    }
}

impl Backend for MemoryBackend {
    fn graph_id(&self) -> GraphId {
        self.graph
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    fn remove(&mut self, id: NodeId) -> MorphResult<Node> {
        self.nodes.remove(&id).ok_or_else(|| Self::missing(id))
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn node_ids(&self) -> Vec<NodeId> {
        // Ids are monotonically assigned, so key order is creation order.
        self.nodes.keys().copied().collect()
    }

    fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }

    fn nodes_of_class(&self, class: &str) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.is_instance(class))
            .map(Node::id)
            .collect()
    }

    fn add_directed_edge(&mut self, from: NodeId, name: &str, to: NodeId) -> MorphResult<()> {
        if !self.nodes.contains_key(&to) {
            return Err(Self::missing(to));
        }
        self.nodes
            .get_mut(&from)
            .ok_or_else(|| Self::missing(from))?
            .add_directed_edge(name.to_string(), to)
    }

    fn remove_directed_edge(&mut self, from: NodeId, name: &str, to: NodeId) -> MorphResult<()> {
        self.nodes
            .get_mut(&from)
            .ok_or_else(|| Self::missing(from))?
            .remove_directed_edge(name, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::identifiers::{new_graph_id, new_node_id};

    fn backend_with_nodes(count: usize) -> (MemoryBackend, Vec<NodeId>) {
        let mut backend = MemoryBackend::new(new_graph_id());
        let ids: Vec<NodeId> = (0..count)
            .map(|_| backend.insert(Node::new(new_node_id(), backend.graph_id())))
            .collect();
        (backend, ids)
    }

    #[test]
    fn test_insert_remove_contains() {
        let (mut backend, ids) = backend_with_nodes(2);
        assert_eq!(backend.len(), 2);
        assert!(backend.contains(ids[0]));

        backend.remove(ids[0]).unwrap();
        assert!(!backend.contains(ids[0]));
        assert!(backend.remove(ids[0]).is_err());
    }

    #[test]
    fn test_directed_edges() {
        let (mut backend, ids) = backend_with_nodes(2);
        backend.add_directed_edge(ids[0], "series", ids[1]).unwrap();
        assert_eq!(
            backend
                .node(ids[0])
                .unwrap()
                .outgoing_edge_endpoints(Some("series"))
                .unwrap(),
            vec![ids[1]]
        );

        backend
            .remove_directed_edge(ids[0], "series", ids[1])
            .unwrap();
        assert!(!backend.node(ids[0]).unwrap().has_property("series"));
    }

    #[test]
    fn test_edge_to_foreign_node_is_rejected() {
        let (mut backend, ids) = backend_with_nodes(1);
        let foreign = new_node_id();
        assert!(backend.add_directed_edge(ids[0], "x", foreign).is_err());
    }

    #[test]
    fn test_nodes_of_class() {
        let (mut backend, ids) = backend_with_nodes(3);
        for id in &ids[..2] {
            if let Some(n) = backend.node_mut(*id) {
                n.add_class("Series".to_string());
            }
        }
        assert_eq!(backend.nodes_of_class("Series"), ids[..2].to_vec());
        assert!(backend.nodes_of_class("Episode").is_empty());
    }
}
