//! Core error types for Morph.

use thiserror::Error;

/// Result type alias using `MorphError`.
pub type MorphResult<T> = std::result::Result<T, MorphError>;

/// Core error type for Morph operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MorphError {
    /// Malformed class definition (bad inheritance, missing reverse
    /// lookup, invalid property type, valid/unique not a schema subset).
    #[error("SchemaDefinitionError: {0}")]
    SchemaDefinition(String),

    /// A typed view's required properties are not satisfied by its node.
    #[error("ValidationError: {0}")]
    Validation(String),

    /// A value whose type is not schema-compatible and not convertible.
    #[error("TypeMismatchError: {0}")]
    TypeMismatch(String),

    /// Unknown class name.
    #[error("ClassNotFound: {0}")]
    ClassNotFound(String),

    /// Property or edge name not present.
    #[error("PropertyNotFound: {0}")]
    PropertyNotFound(String),

    /// Node not found by lookup or query.
    #[error("NodeNotFound: {0}")]
    NodeNotFound(String),

    /// Unknown ontology snapshot tag.
    #[error("SnapshotNotFound: {0}")]
    SnapshotNotFound(String),

    /// Graph structure error (cross-graph link, foreign node, name bound
    /// to the wrong property kind).
    #[error("GraphError: {0}")]
    GraphError(String),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Internal error (bug in Morph).
    #[error("InternalError: {0}")]
    Internal(String),
}

impl MorphError {
    /// Create a new `SchemaDefinition` error.
    pub fn schema_definition<S: Into<String>>(msg: S) -> Self {
        Self::SchemaDefinition(msg.into())
    }

    /// Create a new `Validation` error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new `TypeMismatch` error.
    pub fn type_mismatch<S: Into<String>>(msg: S) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Create a new `ClassNotFound` error.
    pub fn class_not_found<S: Into<String>>(msg: S) -> Self {
        Self::ClassNotFound(msg.into())
    }

    /// Create a new `PropertyNotFound` error.
    pub fn property_not_found<S: Into<String>>(msg: S) -> Self {
        Self::PropertyNotFound(msg.into())
    }

    /// Create a new `NodeNotFound` error.
    pub fn node_not_found<S: Into<String>>(msg: S) -> Self {
        Self::NodeNotFound(msg.into())
    }

    /// Create a new `GraphError`.
    pub fn graph<S: Into<String>>(msg: S) -> Self {
        Self::GraphError(msg.into())
    }

    /// Create a new `Internal` error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Ensure a condition holds, returning the given error variant if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::MorphError::Internal($msg.to_string()));
        }
    };
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::MorphError::$variant(format!($($msg)*)));
        }
    };
}

/// Return early with a `SchemaDefinition` error.
#[macro_export]
macro_rules! schema_err {
    ($($arg:tt)*) => {
        return Err($crate::MorphError::SchemaDefinition(format!($($arg)*)))
    };
}

/// Return early with a `TypeMismatch` error.
#[macro_export]
macro_rules! type_err {
    ($($arg:tt)*) => {
        return Err($crate::MorphError::TypeMismatch(format!($($arg)*)))
    };
}
