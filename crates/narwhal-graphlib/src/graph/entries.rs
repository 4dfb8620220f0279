//! Internal storage entries for [`Graph`](super::Graph).

use super::EdgeKey;
use std::cell::Cell;

/// Transient traversal mark. Algorithms use it as scratch state and reset it before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    White,
    Gray,
    Black,
}

#[derive(Debug, Clone)]
pub(in crate::graph) struct NodeEntry<N> {
    pub(in crate::graph) id: String,
    pub(in crate::graph) label: N,
    pub(in crate::graph) index: usize,
    pub(in crate::graph) out_edges: usize,
    pub(in crate::graph) in_edges: usize,
    pub(in crate::graph) self_loops: usize,
    pub(in crate::graph) hidden: bool,
    pub(in crate::graph) color: Cell<Color>,
}

impl<N> NodeEntry<N> {
    pub(in crate::graph) fn new(id: String, label: N, index: usize) -> Self {
        Self {
            id,
            label,
            index,
            out_edges: 0,
            in_edges: 0,
            self_loops: 0,
            hidden: false,
            color: Cell::new(Color::White),
        }
    }

    pub(in crate::graph) fn incident_edges(&self) -> usize {
        self.out_edges + self.in_edges + self.self_loops
    }
}

#[derive(Debug, Clone)]
pub(in crate::graph) struct EdgeEntry<E> {
    pub(in crate::graph) key: EdgeKey,
    pub(in crate::graph) v_ix: usize,
    pub(in crate::graph) w_ix: usize,
    pub(in crate::graph) index: usize,
    pub(in crate::graph) label: E,
    pub(in crate::graph) hidden: bool,
}

/// Bookkeeping snapshot of a node record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub index: usize,
    /// Outgoing edges, self-loops excluded.
    pub out_edges: usize,
    /// Incoming edges, self-loops excluded.
    pub in_edges: usize,
    pub self_loops: usize,
    pub hidden: bool,
}

/// Borrowed view of an edge record.
#[derive(Debug)]
pub struct EdgeRef<'a, E> {
    pub index: usize,
    pub key: &'a EdgeKey,
    pub source: usize,
    pub target: usize,
    pub label: &'a E,
    pub hidden: bool,
}

impl<E> Clone for EdgeRef<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EdgeRef<'_, E> {}
