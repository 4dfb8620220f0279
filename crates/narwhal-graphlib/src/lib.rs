#![forbid(unsafe_code)]

//! Indexed directed graph container used by `narwhal`.
//!
//! Nodes and edges live in contiguous arrays. Every entry carries a dense, zero-based index
//! equal to its array position, and the container renumbers shifted entries after each
//! structural mutation. Two version counters (`node_version`, `edge_version`) let layout
//! engines detect topology changes without comparing graphs.
//!
//! The [`alg`] module hosts the tree-center heuristics consumed by tree-shaped layouts.

pub mod error;
mod graph;

pub use error::{Error, Result};
pub use graph::{Color, EdgeKey, EdgeRef, Graph, NodeInfo, alg};
