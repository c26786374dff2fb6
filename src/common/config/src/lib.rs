//! Configuration management for Morph.
//!
//! Provides runtime configuration for graph typing behavior and query
//! matching.

use serde::{Deserialize, Serialize};

/// Global Morph configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MorphConfig {
    /// Graph behavior configuration.
    pub graph: GraphConfig,
    /// Query matching configuration.
    pub query: QueryConfig,
}

/// Typing mode for a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TypingMode {
    /// Class membership is fixed when a node is created.
    #[default]
    Static,
    /// Class membership is recomputed after every mutation.
    Dynamic,
}

/// Graph behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Typing mode applied to newly created graphs.
    pub typing: TypingMode,
}

/// Query matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Whether text property filters match case-insensitively.
    pub case_insensitive: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
        }
    }
}
