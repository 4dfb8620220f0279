//! Dense snapshot of the visible part of a graph, as seen by a force model.
//!
//! Slots are `0..len()` over visible nodes in graph index order. The topology (slots,
//! adjacency) is rebuilt only when the graph versions move; positions, pinned flags and
//! edge weights are refreshed before every iteration.

use crate::geometry::{Rect, Vector};
use crate::item::{LayoutEdge, LayoutNode};
use narwhal_graphlib::Graph;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
    /// Index of the edge in the graph.
    pub edge_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Frame {
    node_ix: Vec<usize>,
    slot_by_id: FxHashMap<String, usize>,
    positions: Vec<Vector>,
    fixed: Vec<bool>,
    edges: Vec<FrameEdge>,
    adjacency: Vec<Vec<(usize, usize)>>,
    out_degree: Vec<usize>,
    bounding_box: Rect,
    versions: (u64, u64),
}

impl Frame {
    /// Snapshots the visible nodes and edges of `g`. Self-loops are left out: they carry no
    /// force in any model.
    pub fn from_graph<N: LayoutNode, E: LayoutEdge>(g: &Graph<N, E>, bounding_box: Rect) -> Self {
        let mut frame = Self {
            bounding_box,
            versions: (g.node_version(), g.edge_version()),
            ..Self::default()
        };
        let mut slot_of: Vec<Option<usize>> = vec![None; g.node_count()];
        for (ix, id, label) in g.nodes() {
            if !g.is_node_visible(ix) {
                continue;
            }
            slot_of[ix] = Some(frame.node_ix.len());
            frame.slot_by_id.insert(id.to_string(), frame.node_ix.len());
            frame.node_ix.push(ix);
            frame.positions.push(label.position());
            frame.fixed.push(label.is_fixed());
        }
        let n = frame.node_ix.len();
        frame.adjacency = vec![Vec::new(); n];
        frame.out_degree = vec![0; n];

        for e in g.edges() {
            if !g.is_edge_visible(e.index) || e.source == e.target {
                continue;
            }
            let (Some(source), Some(target)) = (slot_of[e.source], slot_of[e.target]) else {
                continue;
            };
            let k = frame.edges.len();
            frame.edges.push(FrameEdge {
                source,
                target,
                weight: e.label.weight().max(0.0),
                edge_index: e.index,
            });
            frame.adjacency[source].push((target, k));
            frame.adjacency[target].push((source, k));
            frame.out_degree[source] += 1;
        }
        frame
    }

    /// Whether the topology of this frame still matches `g`.
    pub fn is_current<N, E>(&self, g: &Graph<N, E>) -> bool {
        self.versions == (g.node_version(), g.edge_version())
    }

    /// Re-reads positions, pinned flags and weights without touching the topology.
    pub fn refresh<N: LayoutNode, E: LayoutEdge>(&mut self, g: &Graph<N, E>, bounding_box: Rect) {
        self.bounding_box = bounding_box;
        for (slot, &ix) in self.node_ix.iter().enumerate() {
            if let Ok(label) = g.node_at(ix) {
                self.positions[slot] = label.position();
                self.fixed[slot] = label.is_fixed();
            }
        }
        for fe in &mut self.edges {
            if let Ok(e) = g.edge_at(fe.edge_index) {
                fe.weight = e.label.weight().max(0.0);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.node_ix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ix.is_empty()
    }

    pub fn bounding_box(&self) -> &Rect {
        &self.bounding_box
    }

    pub fn positions(&self) -> &[Vector] {
        &self.positions
    }

    pub fn position(&self, slot: usize) -> Vector {
        self.positions[slot]
    }

    pub fn is_fixed(&self, slot: usize) -> bool {
        self.fixed[slot]
    }

    pub fn edges(&self) -> &[FrameEdge] {
        &self.edges
    }

    /// `(neighbor slot, frame edge index)` pairs in both directions.
    pub fn adjacency(&self, slot: usize) -> &[(usize, usize)] {
        &self.adjacency[slot]
    }

    pub fn out_degree(&self, slot: usize) -> usize {
        self.out_degree[slot]
    }

    /// Graph index of the node in `slot`.
    pub fn graph_index(&self, slot: usize) -> usize {
        self.node_ix[slot]
    }

    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.slot_by_id.get(id).copied()
    }

    pub(crate) fn positions_mut(&mut self) -> &mut [Vector] {
        &mut self.positions
    }

    pub(crate) fn swap_positions(&mut self, positions: &mut Vec<Vector>) {
        std::mem::swap(&mut self.positions, positions);
    }
}
