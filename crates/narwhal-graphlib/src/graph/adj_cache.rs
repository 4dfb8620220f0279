//! Adjacency cache used by [`Graph`](super::Graph).
//!
//! Traversal algorithms query successors / predecessors repeatedly; scanning every edge per
//! query is O(E). The cache stores visible edges only, in CSR form, and is keyed by the
//! combined node/edge versions so any structural change (including hide/unhide) invalidates it.

#[derive(Debug, Clone)]
pub(in crate::graph) struct AdjCache {
    pub(in crate::graph) versions: (u64, u64),
    out_offsets: Vec<usize>,
    out_edges: Vec<usize>,
    in_offsets: Vec<usize>,
    in_edges: Vec<usize>,
}

impl AdjCache {
    /// Builds the cache from `(edge index, v index, w index)` triples of visible edges.
    pub(in crate::graph) fn build(
        versions: (u64, u64),
        node_count: usize,
        visible_edges: impl Iterator<Item = (usize, usize, usize)> + Clone,
    ) -> Self {
        let mut out_deg = vec![0usize; node_count + 1];
        let mut in_deg = vec![0usize; node_count + 1];
        for (_, v, w) in visible_edges.clone() {
            out_deg[v + 1] += 1;
            in_deg[w + 1] += 1;
        }
        for i in 0..node_count {
            out_deg[i + 1] += out_deg[i];
            in_deg[i + 1] += in_deg[i];
        }
        let mut out_edges = vec![0usize; out_deg[node_count]];
        let mut in_edges = vec![0usize; in_deg[node_count]];
        let mut out_fill = out_deg.clone();
        let mut in_fill = in_deg.clone();
        for (e, v, w) in visible_edges {
            out_edges[out_fill[v]] = e;
            out_fill[v] += 1;
            in_edges[in_fill[w]] = e;
            in_fill[w] += 1;
        }
        Self {
            versions,
            out_offsets: out_deg,
            out_edges,
            in_offsets: in_deg,
            in_edges,
        }
    }

    pub(in crate::graph) fn out_edges(&self, v_ix: usize) -> &[usize] {
        let start = self.out_offsets[v_ix];
        let end = self.out_offsets[v_ix + 1];
        &self.out_edges[start..end]
    }

    pub(in crate::graph) fn in_edges(&self, v_ix: usize) -> &[usize] {
        let start = self.in_offsets[v_ix];
        let end = self.in_offsets[v_ix + 1];
        &self.in_edges[start..end]
    }
}
