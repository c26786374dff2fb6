//! Graph merge and deduplication.
//!
//! [`Graph::add_object`] imports an object and its transitive dependencies
//! into a target graph, reusing already-equivalent nodes according to a
//! caller-selected equality policy instead of duplicating them, and wiring
//! mirrored edges for every dependency that had to be created.

use std::collections::{HashMap, HashSet};

use common_error::MorphResult;

use crate::graph::{Graph, GraphId, NodeId};
use crate::object::Object;
use crate::ontology::{self, ROOT_CLASS};

/// Equality policy used when searching a graph for an existing equivalent
/// node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// Only the literal same node matches.
    Identity,
    /// Same most-specific class, all properties pairwise equal, recursing
    /// structurally into references.
    Value,
    /// Same most-specific class, literal properties pairwise equal;
    /// references are ignored.
    Literals,
    /// Same most-specific class, `unique` properties pairwise equal;
    /// reference-valued unique properties compare via the referenced
    /// object's own unique key, recursively.
    Unique,
}

type NodeRef = (GraphId, NodeId);

impl Graph {
    /// Find a node in this graph equal to the given object's node under
    /// the selected policy, or `None`.
    ///
    /// Properties flagged implicit by the schema are always excluded from
    /// the comparison: they are derived, not authoritative.
    pub fn find_node(&self, obj: &Object, policy: Match) -> MorphResult<Option<NodeId>> {
        let source = obj.to_virtual()?;
        let class = source.class_name().to_string();

        match policy {
            Match::Identity => Ok((source.graph() == self && self.contains(source.node_id()))
                .then(|| source.node_id())),
            Match::Value => {
                for id in self.nodes_of_class(&class) {
                    let mut visited = HashSet::new();
                    if structural_equal(source.graph(), source.node_id(), self, id, &mut visited)
                    {
                        return Ok(Some(id));
                    }
                }
                Ok(None)
            }
            Match::Literals => {
                for id in self.nodes_of_class(&class) {
                    if literals_equal(source.graph(), source.node_id(), self, id)? {
                        return Ok(Some(id));
                    }
                }
                Ok(None)
            }
            Match::Unique => {
                for id in self.nodes_of_class(&class) {
                    let mut visited = HashSet::new();
                    if unique_equal(source.graph(), source.node_id(), self, id, &mut visited) {
                        return Ok(Some(id));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Import an object and everything it transitively references into
    /// this graph, reusing existing equivalent nodes under the selected
    /// policy.
    ///
    /// At most one node is created per distinct source node per call;
    /// cyclic reference graphs terminate (a node currently being imported
    /// is never re-entered as its own dependency). The returned view uses
    /// the class of the given object, whatever class the storage node
    /// ends up with.
    pub fn add_object(&self, obj: &Object, policy: Match) -> MorphResult<Object> {
        let mut memo: HashMap<NodeRef, NodeId> = HashMap::new();
        let mut in_progress: HashSet<NodeRef> = HashSet::new();
        self.import_object(obj, policy, &mut memo, &mut in_progress)
    }

    fn import_object(
        &self,
        obj: &Object,
        policy: Match,
        memo: &mut HashMap<NodeRef, NodeId>,
        in_progress: &mut HashSet<NodeRef>,
    ) -> MorphResult<Object> {
        let source = obj.to_virtual()?;
        let source_graph = source.graph().clone();
        let key = (source_graph.id(), source.node_id());

        if let Some(&imported) = memo.get(&key) {
            return self.wrap_node_incomplete(obj.class_name(), imported);
        }
        if let Some(existing) = self.find_node(&source, policy)? {
            log::debug!(
                "node {} already in graph {}, reusing node {existing}",
                source.node_id(),
                self.id()
            );
            memo.insert(key, existing);
            return self.wrap_node_incomplete(obj.class_name(), existing);
        }

        log::debug!(
            "importing node {} into graph {}",
            source.node_id(),
            self.id()
        );
        in_progress.insert(key);
        let def = ontology::get_class(source.class_name())?;

        // Import the dependencies first, skipping implicit properties
        // (their mirrors are re-created by the links below) and any node
        // already being imported higher up this call chain.
        let mut links: Vec<(String, Vec<NodeId>, String)> = Vec::new();
        for (name, targets) in source_graph.edge_items(source.node_id())? {
            if def.schema().is_implicit(&name) {
                continue;
            }
            let reverse = def.reverse_name(&name);
            let dep_class = def
                .schema()
                .target_class(&name)
                .unwrap_or(ROOT_CLASS)
                .to_string();
            let mut imported = Vec::new();
            for target in targets {
                if in_progress.contains(&(source_graph.id(), target)) {
                    continue;
                }
                let dependency = source_graph.wrap_node_incomplete(&dep_class, target)?;
                let resolved = self.import_object(&dependency, policy, memo, in_progress)?;
                imported.push(resolved.node_id());
            }
            if !imported.is_empty() {
                links.push((name, imported, reverse));
            }
        }

        // Create the node itself: literals copied as-is, the source's
        // class set, and mirrored edges to the resolved dependencies.
        let literals = source_graph.literal_items(source.node_id())?;
        let classes = source_graph.node_classes(source.node_id())?;
        let new_id = self.create_node(literals, classes)?;
        for (name, targets, reverse) in &links {
            for &target in targets {
                self.add_link_with(new_id, name, target, reverse, false)?;
            }
        }
        self.update_valid_classes(new_id)?;

        in_progress.remove(&key);
        memo.insert(key, new_id);
        self.wrap_node_incomplete(obj.class_name(), new_id)
    }
}

/// Structural equality over explicit properties: literal maps equal, edge
/// structure equal, recursing into referenced nodes. The visited set makes
/// cyclic graphs compare without recursing forever.
pub(crate) fn structural_equal(
    graph_a: &Graph,
    a: NodeId,
    graph_b: &Graph,
    b: NodeId,
    visited: &mut HashSet<(NodeRef, NodeRef)>,
) -> bool {
    if graph_a == graph_b && a == b {
        return true;
    }
    let pair = ((graph_a.id(), a), (graph_b.id(), b));
    if !visited.insert(pair) {
        // Already comparing this pair somewhere up the stack.
        return true;
    }

    let exclude = implicit_props_of(graph_a, a);

    let (Ok(lit_a), Ok(lit_b)) = (graph_a.literal_items(a), graph_b.literal_items(b)) else {
        return false;
    };
    let lit_a: Vec<_> = lit_a.into_iter().filter(|(k, _)| !exclude.contains(k)).collect();
    let lit_b: Vec<_> = lit_b.into_iter().filter(|(k, _)| !exclude.contains(k)).collect();
    if lit_a != lit_b {
        return false;
    }

    let (Ok(edges_a), Ok(edges_b)) = (graph_a.edge_items(a), graph_b.edge_items(b)) else {
        return false;
    };
    let edges_a: Vec<_> = edges_a
        .into_iter()
        .filter(|(k, _)| !exclude.contains(k))
        .collect();
    let edges_b: Vec<_> = edges_b
        .into_iter()
        .filter(|(k, _)| !exclude.contains(k))
        .collect();
    if edges_a.len() != edges_b.len() {
        return false;
    }
    for ((name_a, targets_a), (name_b, targets_b)) in edges_a.iter().zip(&edges_b) {
        if name_a != name_b || targets_a.len() != targets_b.len() {
            return false;
        }
        for (&ta, &tb) in targets_a.iter().zip(targets_b) {
            if !structural_equal(graph_a, ta, graph_b, tb, visited) {
                return false;
            }
        }
    }
    true
}

/// Equality over literal properties only.
fn literals_equal(graph_a: &Graph, a: NodeId, graph_b: &Graph, b: NodeId) -> MorphResult<bool> {
    let exclude = implicit_props_of(graph_a, a);
    let lit_a: Vec<_> = graph_a
        .literal_items(a)?
        .into_iter()
        .filter(|(k, _)| !exclude.contains(k))
        .collect();
    let lit_b: Vec<_> = graph_b
        .literal_items(b)?
        .into_iter()
        .filter(|(k, _)| !exclude.contains(k))
        .collect();
    Ok(lit_a == lit_b)
}

/// Equality over the `unique` key of the node's most specific class.
/// Reference-valued unique properties compare via the referenced nodes'
/// own unique keys, recursively.
pub(crate) fn unique_equal(
    graph_a: &Graph,
    a: NodeId,
    graph_b: &Graph,
    b: NodeId,
    visited: &mut HashSet<(NodeRef, NodeRef)>,
) -> bool {
    if graph_a == graph_b && a == b {
        return true;
    }
    let pair = ((graph_a.id(), a), (graph_b.id(), b));
    if !visited.insert(pair) {
        return true;
    }

    let classes = graph_a.node_classes(a).unwrap_or_default();
    let class = ontology::most_specific(&classes);
    let Ok(def) = ontology::get_class(&class) else {
        return false;
    };

    for prop in def.unique() {
        if def.schema().is_implicit(prop) {
            continue;
        }
        let is_edge_a = graph_a.with_node(a, |n| n.is_edge(prop)).unwrap_or(false);
        let is_edge_b = graph_b.with_node(b, |n| n.is_edge(prop)).unwrap_or(false);
        if is_edge_a != is_edge_b {
            return false;
        }
        if is_edge_a {
            let (Ok(targets_a), Ok(targets_b)) = (
                graph_a.edge_endpoints(a, Some(prop)),
                graph_b.edge_endpoints(b, Some(prop)),
            ) else {
                return false;
            };
            if targets_a.len() != targets_b.len() {
                return false;
            }
            for (&ta, &tb) in targets_a.iter().zip(&targets_b) {
                if !unique_equal(graph_a, ta, graph_b, tb, visited) {
                    return false;
                }
            }
        } else {
            let value_a = graph_a.literal(a, prop).ok();
            let value_b = graph_b.literal(b, prop).ok();
            if value_a != value_b {
                return false;
            }
        }
    }
    true
}

fn implicit_props_of(graph: &Graph, id: NodeId) -> std::collections::BTreeSet<String> {
    let classes = graph.node_classes(id).unwrap_or_default();
    let class = ontology::most_specific(&classes);
    ontology::get_class(&class)
        .map(|def| def.schema().implicit().clone())
        .unwrap_or_default()
}
