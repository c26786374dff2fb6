//! The literal type system.
//!
//! This module provides the closed set of literal values a node may carry
//! (`Literal`), the corresponding type descriptors (`LiteralType`), and the
//! property type descriptors used by class schemas (`PropertyType`).

mod descriptor;
mod literal;

pub use descriptor::{LiteralType, PropertyType};
pub use literal::Literal;

/// Name of a registered class.
pub type ClassName = String;

/// Property key name (literal or edge).
pub type PropertyKey = String;
