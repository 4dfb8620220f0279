//! Graph container APIs used by `narwhal`.
//!
//! This module contains the core `Graph` container plus the tree-center heuristics re-exported
//! as `narwhal_graphlib::alg`.

use crate::error::{Error, Result};
use rustc_hash::FxBuildHasher;
use std::cell::RefCell;

mod adj_cache;
pub mod alg;
mod edge_key;
mod entries;

use adj_cache::AdjCache;
use edge_key::EdgeKeyView;
use entries::{EdgeEntry, NodeEntry};

pub use edge_key::EdgeKey;
pub use entries::{Color, EdgeRef, NodeInfo};

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Directed graph with dense node/edge indices, versioning and hide/orphan semantics.
///
/// Nodes are identified by string ids and carry a user label `N`; edges are identified by their
/// ordered endpoint pair and carry a user label `E`. Hidden nodes and edges keep their indices
/// but are skipped by every traversal query.
pub struct Graph<N, E> {
    default_node_label: Box<dyn Fn() -> N + Send + Sync>,

    nodes: Vec<NodeEntry<N>>,
    node_index: HashMap<String, usize>,

    edges: Vec<EdgeEntry<E>>,
    edge_index: HashMap<EdgeKey, usize>,

    node_version: u64,
    edge_version: u64,

    // Traversals call `successors` / `predecessors` repeatedly; the cache is rebuilt lazily
    // whenever either version moves. Interior mutability keeps query APIs on `&self`.
    adj_cache: RefCell<Option<AdjCache>>,
}

impl<N, E> Default for Graph<N, E>
where
    N: Default + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Graph<N, E>
where
    N: Default + 'static,
{
    pub fn new() -> Self {
        Self::with_default_node_label(N::default)
    }
}

impl<N, E> Graph<N, E> {
    /// Creates an empty graph whose auto-created edge endpoints get labels from `f`.
    pub fn with_default_node_label<F>(f: F) -> Self
    where
        F: Fn() -> N + Send + Sync + 'static,
    {
        Self {
            default_node_label: Box::new(f),
            nodes: Vec::new(),
            node_index: HashMap::default(),
            edges: Vec::new(),
            edge_index: HashMap::default(),
            node_version: 0,
            edge_version: 0,
            adj_cache: RefCell::new(None),
        }
    }

    pub fn set_default_node_label<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> N + Send + Sync + 'static,
    {
        self.default_node_label = Box::new(f);
        self
    }

    pub fn node_version(&self) -> u64 {
        self.node_version
    }

    pub fn edge_version(&self) -> u64 {
        self.edge_version
    }

    fn bump_nodes(&mut self) {
        self.node_version = self.node_version.wrapping_add(1);
    }

    fn bump_edges(&mut self) {
        self.edge_version = self.edge_version.wrapping_add(1);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn visible_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.hidden).count()
    }

    pub fn visible_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| self.entry_visible(e)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check_node_index(&self, index: usize) -> Result<()> {
        if index < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::NodeIndexOutOfRange {
                index,
                len: self.nodes.len(),
            })
        }
    }

    fn check_edge_index(&self, index: usize) -> Result<()> {
        if index < self.edges.len() {
            Ok(())
        } else {
            Err(Error::EdgeIndexOutOfRange {
                index,
                len: self.edges.len(),
            })
        }
    }

    // ---------------------------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------------------------

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx].label)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        self.node_index
            .get(id)
            .copied()
            .map(move |idx| &mut self.nodes[idx].label)
    }

    pub fn node_at(&self, index: usize) -> Result<&N> {
        self.check_node_index(index)?;
        Ok(&self.nodes[index].label)
    }

    pub fn node_at_mut(&mut self, index: usize) -> Result<&mut N> {
        self.check_node_index(index)?;
        Ok(&mut self.nodes[index].label)
    }

    pub fn node_id(&self, index: usize) -> Result<&str> {
        self.check_node_index(index)?;
        Ok(self.nodes[index].id.as_str())
    }

    pub fn node_info(&self, index: usize) -> Result<NodeInfo> {
        self.check_node_index(index)?;
        let n = &self.nodes[index];
        Ok(NodeInfo {
            index: n.index,
            out_edges: n.out_edges,
            in_edges: n.in_edges,
            self_loops: n.self_loops,
            hidden: n.hidden,
        })
    }

    pub fn is_node_hidden(&self, id: &str) -> Option<bool> {
        self.index_of(id).map(|ix| self.nodes[ix].hidden)
    }

    pub fn is_node_visible(&self, index: usize) -> bool {
        self.nodes.get(index).is_some_and(|n| !n.hidden)
    }

    /// Iterates `(index, id, label)` over every node, hidden ones included.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &str, &N)> {
        self.nodes
            .iter()
            .map(|n| (n.index, n.id.as_str(), &n.label))
    }

    /// Snapshot of node ids in index order. The copy may go stale after later mutations.
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    pub fn for_each_node_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, &str, &mut N),
    {
        for n in &mut self.nodes {
            f(n.index, &n.id, &mut n.label);
        }
    }

    /// Appends a node. Returns `false` (and leaves the graph untouched) if `id` already exists.
    pub fn add_node(&mut self, id: impl Into<String>, label: N) -> bool {
        let id = id.into();
        if self.node_index.contains_key(&id) {
            return false;
        }
        self.push_node(id, label);
        true
    }

    /// Inserts a node at `index`, shifting later nodes up by one.
    pub fn insert_node(&mut self, index: usize, id: impl Into<String>, label: N) -> Result<bool> {
        if index > self.nodes.len() {
            return Err(Error::NodeIndexOutOfRange {
                index,
                len: self.nodes.len(),
            });
        }
        let id = id.into();
        if self.node_index.contains_key(&id) {
            return Ok(false);
        }
        self.nodes.insert(index, NodeEntry::new(id, label, index));
        for e in &mut self.edges {
            if e.v_ix >= index {
                e.v_ix += 1;
            }
            if e.w_ix >= index {
                e.w_ix += 1;
            }
        }
        self.reindex_nodes(index);
        self.bump_nodes();
        Ok(true)
    }

    /// Returns the index of `id`, creating it with the default label if missing.
    pub fn ensure_node(&mut self, id: impl Into<String>) -> usize {
        let id = id.into();
        if let Some(&idx) = self.node_index.get(&id) {
            return idx;
        }
        let label = (self.default_node_label)();
        self.push_node(id, label)
    }

    fn push_node(&mut self, id: String, label: N) -> usize {
        let idx = self.nodes.len();
        self.node_index.insert(id.clone(), idx);
        self.nodes.push(NodeEntry::new(id, label, idx));
        self.bump_nodes();
        idx
    }

    fn reindex_nodes(&mut self, from: usize) {
        for i in from..self.nodes.len() {
            let n = &mut self.nodes[i];
            n.index = i;
            if let Some(slot) = self.node_index.get_mut(n.id.as_str()) {
                *slot = i;
            } else {
                self.node_index.insert(n.id.clone(), i);
            }
        }
    }

    /// Removes a node and every edge touching it.
    ///
    /// With `remove_orphans`, neighbors left without incident edges by this removal are removed
    /// as well; nodes that were already isolated are kept.
    pub fn remove_node(&mut self, id: &str, remove_orphans: bool) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.remove_node_inner(idx, remove_orphans);
        true
    }

    pub fn remove_node_at(&mut self, index: usize, remove_orphans: bool) -> Result<()> {
        self.check_node_index(index)?;
        self.remove_node_inner(index, remove_orphans);
        Ok(())
    }

    fn remove_node_inner(&mut self, idx: usize, remove_orphans: bool) {
        let removed = self.remove_edges_where(|e| e.v_ix == idx || e.w_ix == idx);
        let neighbor_ids: Vec<String> = removed
            .iter()
            .flat_map(|&(v, w)| [v, w])
            .filter(|&ix| ix != idx)
            .map(|ix| self.nodes[ix].id.clone())
            .collect();

        let entry = self.nodes.remove(idx);
        self.node_index.remove(entry.id.as_str());
        for e in &mut self.edges {
            if e.v_ix > idx {
                e.v_ix -= 1;
            }
            if e.w_ix > idx {
                e.w_ix -= 1;
            }
        }
        self.reindex_nodes(idx);
        self.bump_nodes();
        tracing::trace!(node = %entry.id, edges = removed.len(), "removed node");

        if remove_orphans {
            self.remove_orphans(neighbor_ids);
        }
    }

    fn remove_orphans(&mut self, candidates: Vec<String>) {
        for id in candidates {
            let Some(ix) = self.index_of(&id) else {
                continue;
            };
            if self.nodes[ix].incident_edges() == 0 {
                // An isolated node has no edges, so its removal cannot orphan anything else.
                self.remove_node_inner(ix, false);
            }
        }
    }

    /// Removes every edge touching `id` but keeps the node itself.
    pub fn orphan_node(&mut self, id: &str) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.remove_edges_where(|e| e.v_ix == idx || e.w_ix == idx);
        true
    }

    /// Hides a node. Returns `false` if it is missing or already hidden.
    pub fn hide_node(&mut self, id: &str) -> bool {
        self.set_node_hidden(id, true)
    }

    pub fn unhide_node(&mut self, id: &str) -> bool {
        self.set_node_hidden(id, false)
    }

    fn set_node_hidden(&mut self, id: &str, hidden: bool) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        if self.nodes[idx].hidden == hidden {
            return false;
        }
        self.nodes[idx].hidden = hidden;
        self.bump_nodes();
        true
    }

    /// Replaces the id and label of `id` in place, rewriting the endpoints of every touching
    /// edge. The node keeps its index.
    pub fn replace_node(&mut self, id: &str, new_id: impl Into<String>, label: N) -> Result<bool> {
        let Some(idx) = self.index_of(id) else {
            return Ok(false);
        };
        let new_id = new_id.into();
        if new_id != id && self.node_index.contains_key(&new_id) {
            return Err(Error::DuplicateNode { id: new_id });
        }

        self.nodes[idx].label = label;
        if new_id != id {
            self.node_index.remove(id);
            self.node_index.insert(new_id.clone(), idx);
            self.nodes[idx].id = new_id.clone();

            let mut touched = false;
            for e in &mut self.edges {
                if e.v_ix == idx {
                    e.key.v = new_id.clone();
                    touched = true;
                }
                if e.w_ix == idx {
                    e.key.w = new_id.clone();
                    touched = true;
                }
            }
            if touched {
                self.rebuild_edge_index();
                self.bump_edges();
            }
        }
        self.bump_nodes();
        Ok(true)
    }

    pub fn clear(&mut self) {
        if !self.nodes.is_empty() {
            self.bump_nodes();
        }
        if !self.edges.is_empty() {
            self.bump_edges();
        }
        self.nodes.clear();
        self.node_index.clear();
        self.edges.clear();
        self.edge_index.clear();
    }

    // ---------------------------------------------------------------------------------------
    // Edges
    // ---------------------------------------------------------------------------------------

    pub fn has_edge(&self, v: &str, w: &str) -> bool {
        self.edge_index.contains_key(&EdgeKeyView { v, w })
    }

    pub fn edge_index_of(&self, v: &str, w: &str) -> Option<usize> {
        self.edge_index.get(&EdgeKeyView { v, w }).copied()
    }

    pub fn edge(&self, v: &str, w: &str) -> Option<&E> {
        let idx = self.edge_index_of(v, w)?;
        Some(&self.edges[idx].label)
    }

    pub fn edge_mut(&mut self, v: &str, w: &str) -> Option<&mut E> {
        let idx = self.edge_index_of(v, w)?;
        Some(&mut self.edges[idx].label)
    }

    pub fn edge_at(&self, index: usize) -> Result<EdgeRef<'_, E>> {
        self.check_edge_index(index)?;
        Ok(self.edge_ref(&self.edges[index]))
    }

    pub fn edge_at_mut(&mut self, index: usize) -> Result<&mut E> {
        self.check_edge_index(index)?;
        Ok(&mut self.edges[index].label)
    }

    fn edge_ref<'a>(&self, e: &'a EdgeEntry<E>) -> EdgeRef<'a, E> {
        EdgeRef {
            index: e.index,
            key: &e.key,
            source: e.v_ix,
            target: e.w_ix,
            label: &e.label,
            hidden: e.hidden,
        }
    }

    /// Iterates every edge in index order, hidden ones included.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_, E>> {
        self.edges.iter().map(|e| self.edge_ref(e))
    }

    /// Snapshot of edge keys in index order.
    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        self.edges.iter().map(|e| e.key.clone()).collect()
    }

    pub fn for_each_edge_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, &EdgeKey, &mut E),
    {
        for e in &mut self.edges {
            f(e.index, &e.key, &mut e.label);
        }
    }

    pub fn is_edge_hidden(&self, v: &str, w: &str) -> Option<bool> {
        self.edge_index_of(v, w).map(|ix| self.edges[ix].hidden)
    }

    /// An edge is visible when neither it nor either endpoint is hidden.
    pub fn is_edge_visible(&self, index: usize) -> bool {
        self.edges.get(index).is_some_and(|e| self.entry_visible(e))
    }

    fn entry_visible(&self, e: &EdgeEntry<E>) -> bool {
        !e.hidden && !self.nodes[e.v_ix].hidden && !self.nodes[e.w_ix].hidden
    }

    /// Adds the edge `v -> w`, creating missing endpoints with the default node label.
    ///
    /// If the ordered pair already has an edge, `replace` decides between overwriting its label
    /// (`true`) and rejecting the new one (`false`, returns `false`).
    pub fn add_edge(
        &mut self,
        v: impl Into<String>,
        w: impl Into<String>,
        label: E,
        replace: bool,
    ) -> bool {
        let v = v.into();
        let w = w.into();
        if let Some(idx) = self.edge_index_of(&v, &w) {
            if !replace {
                return false;
            }
            self.edges[idx].label = label;
            self.bump_edges();
            return true;
        }
        let idx = self.edges.len();
        self.push_edge(idx, v, w, label);
        true
    }

    /// Inserts the edge `v -> w` at `index`, shifting later edges up by one.
    pub fn insert_edge(
        &mut self,
        index: usize,
        v: impl Into<String>,
        w: impl Into<String>,
        label: E,
    ) -> Result<bool> {
        if index > self.edges.len() {
            return Err(Error::EdgeIndexOutOfRange {
                index,
                len: self.edges.len(),
            });
        }
        let v = v.into();
        let w = w.into();
        if self.has_edge(&v, &w) {
            return Ok(false);
        }
        self.push_edge(index, v, w, label);
        Ok(true)
    }

    fn push_edge(&mut self, index: usize, v: String, w: String, label: E) {
        let v_ix = self.ensure_node(v.clone());
        let w_ix = self.ensure_node(w.clone());
        let key = EdgeKey { v, w };
        self.edges.insert(
            index,
            EdgeEntry {
                key,
                v_ix,
                w_ix,
                index,
                label,
                hidden: false,
            },
        );
        self.reindex_edges(index);
        self.count_edge(v_ix, w_ix, true);
        self.bump_edges();
    }

    fn reindex_edges(&mut self, from: usize) {
        for i in from..self.edges.len() {
            let e = &mut self.edges[i];
            e.index = i;
            if let Some(slot) = self.edge_index.get_mut(&e.key.view()) {
                *slot = i;
            } else {
                self.edge_index.insert(e.key.clone(), i);
            }
        }
    }

    fn rebuild_edge_index(&mut self) {
        self.edge_index.clear();
        for (i, e) in self.edges.iter_mut().enumerate() {
            e.index = i;
            self.edge_index.insert(e.key.clone(), i);
        }
    }

    fn count_edge(&mut self, v_ix: usize, w_ix: usize, add: bool) {
        fn step(count: &mut usize, add: bool) {
            if add {
                *count += 1;
            } else {
                *count = count.saturating_sub(1);
            }
        }
        if v_ix == w_ix {
            step(&mut self.nodes[v_ix].self_loops, add);
        } else {
            step(&mut self.nodes[v_ix].out_edges, add);
            step(&mut self.nodes[w_ix].in_edges, add);
        }
    }

    /// Removes matching edges and returns their `(v, w)` node indices.
    fn remove_edges_where<F>(&mut self, mut pred: F) -> Vec<(usize, usize)>
    where
        F: FnMut(&EdgeEntry<E>) -> bool,
    {
        let mut removed: Vec<(usize, usize)> = Vec::new();
        let mut kept: Vec<EdgeEntry<E>> = Vec::with_capacity(self.edges.len());
        for e in std::mem::take(&mut self.edges) {
            if pred(&e) {
                removed.push((e.v_ix, e.w_ix));
            } else {
                kept.push(e);
            }
        }
        self.edges = kept;
        for &(v, w) in &removed {
            self.count_edge(v, w, false);
        }
        if !removed.is_empty() {
            self.rebuild_edge_index();
            self.bump_edges();
        }
        removed
    }

    pub fn remove_edge(&mut self, v: &str, w: &str, remove_orphans: bool) -> bool {
        let Some(idx) = self.edge_index_of(v, w) else {
            return false;
        };
        self.remove_edge_inner(idx, remove_orphans);
        true
    }

    pub fn remove_edge_at(&mut self, index: usize, remove_orphans: bool) -> Result<()> {
        self.check_edge_index(index)?;
        self.remove_edge_inner(index, remove_orphans);
        Ok(())
    }

    fn remove_edge_inner(&mut self, idx: usize, remove_orphans: bool) {
        let e = self.edges.remove(idx);
        self.edge_index.remove(&e.key.view());
        self.reindex_edges(idx);
        self.count_edge(e.v_ix, e.w_ix, false);
        self.bump_edges();
        if remove_orphans {
            self.remove_orphans(vec![e.key.v, e.key.w]);
        }
    }

    pub fn hide_edge(&mut self, v: &str, w: &str) -> bool {
        self.set_edge_hidden(v, w, true)
    }

    pub fn unhide_edge(&mut self, v: &str, w: &str) -> bool {
        self.set_edge_hidden(v, w, false)
    }

    fn set_edge_hidden(&mut self, v: &str, w: &str, hidden: bool) -> bool {
        let Some(idx) = self.edge_index_of(v, w) else {
            return false;
        };
        if self.edges[idx].hidden == hidden {
            return false;
        }
        self.edges[idx].hidden = hidden;
        self.bump_edges();
        true
    }

    // ---------------------------------------------------------------------------------------
    // Traversal (visible nodes and edges only)
    // ---------------------------------------------------------------------------------------

    fn with_adj<R>(&self, f: impl FnOnce(&AdjCache) -> R) -> R {
        let versions = (self.node_version, self.edge_version);
        let visible = || {
            self.edges
                .iter()
                .filter(|e| self.entry_visible(e))
                .map(|e| (e.index, e.v_ix, e.w_ix))
        };
        let mut slot = self.adj_cache.borrow_mut();
        let stale = slot.as_ref().is_none_or(|c| c.versions != versions);
        if stale {
            *slot = Some(AdjCache::build(versions, self.nodes.len(), visible()));
        }
        match slot.as_ref() {
            Some(cache) => f(cache),
            None => f(&AdjCache::build(versions, self.nodes.len(), visible())),
        }
    }

    /// Indices of visible edges leaving `index`.
    pub fn out_edges(&self, index: usize) -> Vec<usize> {
        if !self.is_node_visible(index) {
            return Vec::new();
        }
        self.with_adj(|c| c.out_edges(index).to_vec())
    }

    /// Indices of visible edges entering `index`.
    pub fn in_edges(&self, index: usize) -> Vec<usize> {
        if !self.is_node_visible(index) {
            return Vec::new();
        }
        self.with_adj(|c| c.in_edges(index).to_vec())
    }

    pub fn successors(&self, index: usize) -> Vec<usize> {
        if !self.is_node_visible(index) {
            return Vec::new();
        }
        self.with_adj(|c| {
            c.out_edges(index)
                .iter()
                .map(|&e| self.edges[e].w_ix)
                .collect()
        })
    }

    pub fn predecessors(&self, index: usize) -> Vec<usize> {
        if !self.is_node_visible(index) {
            return Vec::new();
        }
        self.with_adj(|c| {
            c.in_edges(index)
                .iter()
                .map(|&e| self.edges[e].v_ix)
                .collect()
        })
    }

    /// Distinct visible neighbors of `index` in either direction, excluding itself.
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        if !self.is_node_visible(index) {
            return Vec::new();
        }
        let mut out: Vec<usize> = self.with_adj(|c| {
            c.out_edges(index)
                .iter()
                .map(|&e| self.edges[e].w_ix)
                .chain(c.in_edges(index).iter().map(|&e| self.edges[e].v_ix))
                .filter(|&ix| ix != index)
                .collect()
        });
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn color(&self, index: usize) -> Result<Color> {
        self.check_node_index(index)?;
        Ok(self.nodes[index].color.get())
    }

    pub fn set_color(&self, index: usize, color: Color) -> Result<()> {
        self.check_node_index(index)?;
        self.nodes[index].color.set(color);
        Ok(())
    }

    pub fn reset_colors(&self) {
        for n in &self.nodes {
            n.color.set(Color::White);
        }
    }
}
