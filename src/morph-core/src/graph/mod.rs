//! Graph storage: nodes, the owning graph, the backend boundary and the
//! record-level serialization format.

mod backend;
#[allow(clippy::module_inception)]
mod graph;
mod identifiers;
mod node;
mod records;

pub use backend::{Backend, MemoryBackend};
pub use graph::Graph;
pub(crate) use graph::GraphData;
pub use identifiers::{new_graph_id, new_node_id, GraphId, NodeId};
pub use node::Node;
pub use records::{export_records, GraphRecords};
