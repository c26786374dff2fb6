//! The record-level serialization boundary.
//!
//! A graph exports to three flat collections: per-node literal records,
//! per-node class-name lists, and `(source index, edge name, target
//! index)` triples. Import is the exact inverse: nodes are rebuilt in
//! index order, then the edges are replayed. The round trip preserves
//! node identity-equivalence and all literal/edge data; persisting the
//! records anywhere is the caller's business.

use std::collections::HashMap;

use common_error::{MorphError, MorphResult};
use serde::{Deserialize, Serialize};

use crate::ontology;
use crate::types::{ClassName, Literal, PropertyKey};

use super::backend::Backend;
use super::{Graph, NodeId};

/// Flat record representation of a whole graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphRecords {
    /// Per-node literal properties, indexed in node order.
    pub literals: Vec<Vec<(PropertyKey, Literal)>>,
    /// Per-node class-name lists, indexed in node order.
    pub classes: Vec<Vec<ClassName>>,
    /// Directed edges as `(source index, edge name, target index)`.
    pub edges: Vec<(usize, PropertyKey, usize)>,
}

/// Export any backend's nodes and edges to flat records.
pub fn export_records<B: Backend>(backend: &B) -> GraphRecords {
    let ids = backend.node_ids();
    let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let mut records = GraphRecords::default();
    for &id in &ids {
        let Some(node) = backend.node(id) else {
            continue;
        };
        records.literals.push(
            node.literal_items()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        records
            .classes
            .push(node.classes().iter().cloned().collect());
    }
    for (i, &id) in ids.iter().enumerate() {
        let Some(node) = backend.node(id) else {
            continue;
        };
        for (name, targets) in node.edge_items() {
            for target in targets {
                if let Some(&t) = index.get(target) {
                    records.edges.push((i, name.clone(), t));
                }
            }
        }
    }
    records
}

impl Graph {
    /// Export this graph to flat records.
    pub fn to_records(&self) -> GraphRecords {
        self.with_data(|data| export_records(data.backend()))
    }

    /// Rebuild a graph from flat records.
    ///
    /// Every class name must be registered. The graph is created in
    /// static typing mode, with class membership taken from the records.
    pub fn from_records(records: &GraphRecords) -> MorphResult<Self> {
        if records.literals.len() != records.classes.len() {
            return Err(MorphError::graph(format!(
                "malformed records: {} literal records but {} class records",
                records.literals.len(),
                records.classes.len()
            )));
        }
        for classes in &records.classes {
            for class in classes {
                if !ontology::is_registered(class) {
                    return Err(MorphError::class_not_found(format!(
                        "records reference unregistered class '{class}'"
                    )));
                }
            }
        }

        let graph = Self::new();
        let mut ids = Vec::with_capacity(records.literals.len());
        for (literals, classes) in records.literals.iter().zip(&records.classes) {
            let id = graph.create_node(literals.iter().cloned(), classes.iter().cloned())?;
            ids.push(id);
        }
        for (source, name, target) in &records.edges {
            let (Some(&from), Some(&to)) = (ids.get(*source), ids.get(*target)) else {
                return Err(MorphError::graph(format!(
                    "malformed records: edge '{name}' references node index out of range"
                )));
            };
            graph.add_directed_edge_raw(from, name, to)?;
        }
        Ok(graph)
    }
}
