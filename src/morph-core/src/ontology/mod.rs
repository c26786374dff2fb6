//! The ontology: registered classes, schemas and relation metadata.
//!
//! The registry is process-wide state (thread-local, the store is
//! single-threaded throughout). Classes are registered explicitly through
//! [`ClassDef::builder`]; registering a class validates the definition,
//! infers relation cardinalities, injects implicit reverse properties into
//! the related classes, and synchronously revalidates every live graph in
//! dynamic typing mode before returning.

mod class_def;
mod registry;
mod relation;
mod schema;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Weak;

use common_error::MorphResult;

use crate::graph::{Graph, GraphData};
use crate::types::ClassName;

pub use class_def::{is_of, ClassDef, ClassDefBuilder, Converter, ReverseName};
pub use relation::RelationKind;
pub use schema::Schema;

use registry::Registry;

/// Name of the pre-registered root class.
pub const ROOT_CLASS: &str = "Object";

/// Snapshot tag holding the pristine registry state.
pub const ORIGIN_SNAPSHOT: &str = "origin";

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry::bootstrap());
}

/// Validate and register a class definition.
///
/// Registration is all-or-nothing: on failure the registry is unchanged.
/// On success, every live graph in dynamic mode is revalidated before this
/// returns. Registering an already-registered name is ignored with a
/// warning.
pub fn register(decl: ClassDefBuilder) -> MorphResult<()> {
    let committed = REGISTRY.with(|r| r.borrow_mut().register(decl))?;
    if committed {
        revalidate_graphs();
    }
    Ok(())
}

/// Get a registered class definition by name.
pub fn get_class(name: &str) -> MorphResult<ClassDef> {
    REGISTRY.with(|r| r.borrow().get(name))
}

/// Check whether a class name is registered.
pub fn is_registered(name: &str) -> bool {
    REGISTRY.with(|r| r.borrow().contains(name))
}

/// Names of all registered classes.
pub fn class_names() -> Vec<ClassName> {
    REGISTRY.with(|r| r.borrow().class_names())
}

/// Definitions of all registered classes.
pub fn class_defs() -> Vec<ClassDef> {
    REGISTRY.with(|r| r.borrow().class_defs())
}

/// The given class and all of its subclasses.
pub fn subclasses(name: &str) -> MorphResult<Vec<ClassName>> {
    REGISTRY.with(|r| r.borrow().subclasses(name))
}

/// The given class and all of its ancestors, up to the root class.
pub fn parent_classes(name: &str) -> MorphResult<Vec<ClassName>> {
    REGISTRY.with(|r| r.borrow().parent_classes(name))
}

/// Check whether `sub` is `sup` or one of its subclasses.
pub fn is_subclass(sub: &str, sup: &str) -> bool {
    REGISTRY.with(|r| r.borrow().is_subclass(sub, sup))
}

/// The most specific class among the given names (root when empty).
pub fn most_specific(names: &BTreeSet<ClassName>) -> ClassName {
    REGISTRY.with(|r| {
        let registry = r.borrow();
        let mut best = ROOT_CLASS.to_string();
        for name in names {
            if registry.is_subclass(name, &best) {
                best = name.clone();
            }
        }
        best
    })
}

/// Register an extension literal type name, making it usable in schemas.
pub fn register_literal_type(name: &str) {
    REGISTRY.with(|r| r.borrow_mut().register_literal_type(name));
}

/// Check whether an extension literal type name is registered.
pub fn literal_type_registered(name: &str) -> bool {
    REGISTRY.with(|r| r.borrow().literal_type_registered(name))
}

/// Deep-copy the full registry state under a tag.
pub fn save_snapshot(tag: &str) {
    REGISTRY.with(|r| r.borrow_mut().save_snapshot(tag));
}

/// Restore the registry state saved under a tag, then revalidate every
/// live graph in dynamic mode.
pub fn restore_snapshot(tag: &str) -> MorphResult<()> {
    REGISTRY.with(|r| r.borrow_mut().restore_snapshot(tag))?;
    revalidate_graphs();
    Ok(())
}

/// Restore the pristine registry state (only the root class).
pub fn clear() {
    // The origin snapshot is taken at bootstrap, so it always exists.
    let _ = restore_snapshot(ORIGIN_SNAPSHOT);
}

/// Make a graph known to the registry, so class registration can
/// revalidate it. Only a weak reference is held; dropped graphs prune
/// themselves.
pub(crate) fn register_graph(graph: Weak<RefCell<GraphData>>) {
    REGISTRY.with(|r| r.borrow_mut().register_graph(graph));
}

/// Revalidate class membership in every live dynamic graph.
fn revalidate_graphs() {
    let graphs = REGISTRY.with(|r| r.borrow_mut().live_graphs());
    for inner in graphs {
        Graph::from_inner(inner).revalidate_all();
    }
}
