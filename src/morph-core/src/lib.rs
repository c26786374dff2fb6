//! Core data model for the Morph object-graph store.
//!
//! Morph is a typed layer over a directed property graph:
//! - [`types`] — the closed literal value set and property descriptors
//! - [`ontology`] — registered classes, schema validation, relation
//!   cardinalities and implicit reverse-property propagation
//! - [`graph`] — nodes, the owning graph, mirrored links, the backend
//!   boundary and the record-level serialization format
//! - [`object`] — typed views over nodes and the query surface
//! - [`merge`] — the import/deduplication algorithm
//!
//! # Example
//!
//! ```rust
//! use morph_core::{ClassDef, Graph, LiteralType, PropertyType, ReverseName};
//!
//! morph_core::ontology::clear();
//! ClassDef::builder("Series")
//!     .property("title", LiteralType::Text)
//!     .valid(["title"])
//!     .register()?;
//! ClassDef::builder("Episode")
//!     .property("series", PropertyType::object("Series"))
//!     .property("season", LiteralType::Int)
//!     .property("number", LiteralType::Int)
//!     .reverse("series", ReverseName::ordered_many("episodes"))
//!     .valid(["series", "season", "number"])
//!     .register()?;
//!
//! let g = Graph::new();
//! let series = g.create_object("Series", [("title", "Monk")])?;
//! let episode = g.create_object(
//!     "Episode",
//!     [
//!         ("series", morph_core::PropValue::from(&series)),
//!         ("season", 1i64.into()),
//!         ("number", 1i64.into()),
//!     ],
//! )?;
//!
//! // the reverse property was wired automatically
//! assert_eq!(series.get_objects("episodes")?.len(), 1);
//! # Ok::<(), morph_core::MorphError>(())
//! ```

pub mod graph;
pub mod merge;
pub mod object;
pub mod ontology;
pub mod testing;
pub mod types;

// Re-export commonly used types
pub use common_error::{MorphError, MorphResult};
pub use graph::{export_records, Backend, Graph, GraphId, GraphRecords, MemoryBackend, Node, NodeId};
pub use merge::Match;
pub use object::{Object, PropValue};
pub use ontology::{
    ClassDef, ClassDefBuilder, Converter, RelationKind, ReverseName, Schema, ROOT_CLASS,
};
pub use types::{ClassName, Literal, LiteralType, PropertyKey, PropertyType};
