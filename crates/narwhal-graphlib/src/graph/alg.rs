//! Tree-center heuristics consumed by tree-shaped layouts.
//!
//! All routines operate on visible nodes and edges only and return a node index.

use super::{Color, Graph};

/// How edge direction is interpreted while looking for a center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeView {
    /// Edges are traversed in both directions.
    #[default]
    Undirected,
    /// Edges are traversed from source to target.
    Directed,
    /// Edges are traversed from target to source.
    Reversed,
}

fn view_children<N, E>(g: &Graph<N, E>, v: usize, view: TreeView) -> Vec<usize> {
    match view {
        TreeView::Undirected => g.neighbors(v),
        TreeView::Directed => distinct_without(g.successors(v), v),
        TreeView::Reversed => distinct_without(g.predecessors(v), v),
    }
}

fn view_parents<N, E>(g: &Graph<N, E>, v: usize, view: TreeView) -> Vec<usize> {
    match view {
        TreeView::Undirected => g.neighbors(v),
        TreeView::Directed => distinct_without(g.predecessors(v), v),
        TreeView::Reversed => distinct_without(g.successors(v), v),
    }
}

fn distinct_without(mut ids: Vec<usize>, v: usize) -> Vec<usize> {
    ids.retain(|&x| x != v);
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Finds a center by repeatedly peeling leaves.
///
/// In the undirected view a leaf is a node with at most one remaining neighbor, so peeling
/// converges on the middle of the longest path. In the directed view a leaf is a node without
/// remaining successors (a directed tree converges on its root); the reversed view peels nodes
/// without remaining predecessors. When a round would peel every remaining node, the lowest
/// index among them wins; when no node can be peeled (cycles), the remaining node with the
/// highest degree wins.
pub fn find_center<N, E>(g: &Graph<N, E>, view: TreeView) -> Option<usize> {
    let n = g.node_count();
    let mut alive: Vec<bool> = (0..n).map(|i| g.is_node_visible(i)).collect();
    let mut remaining = alive.iter().filter(|&&a| a).count();
    if remaining == 0 {
        return None;
    }

    // `degree` counts remaining nodes a leaf is still attached to; `back` lists the nodes whose
    // degree drops when a node is peeled.
    let mut degree: Vec<usize> = vec![0; n];
    let mut back: Vec<Vec<usize>> = vec![Vec::new(); n];
    for v in 0..n {
        if !alive[v] {
            continue;
        }
        let children = view_children(g, v, view);
        degree[v] = children.len();
        if view != TreeView::Undirected {
            for c in children {
                back[c].push(v);
            }
        } else {
            back[v] = g.neighbors(v);
        }
    }

    let leaf_limit = if view == TreeView::Undirected { 1 } else { 0 };
    while remaining > 1 {
        let layer: Vec<usize> = (0..n)
            .filter(|&v| alive[v] && degree[v] <= leaf_limit)
            .collect();
        if layer.is_empty() {
            return (0..n)
                .filter(|&v| alive[v])
                .max_by(|&a, &b| degree[a].cmp(&degree[b]).then(b.cmp(&a)));
        }
        if layer.len() == remaining {
            return layer.first().copied();
        }
        for &v in &layer {
            alive[v] = false;
        }
        remaining -= layer.len();
        for &v in &layer {
            for &u in &back[v] {
                if alive[u] {
                    degree[u] = degree[u].saturating_sub(1);
                }
            }
        }
    }
    (0..n).find(|&v| alive[v])
}

/// Finds the node through which the largest number of undirected simple tree paths pass.
///
/// Subtree sizes come from an explicit depth-first stack, so deep trees cannot overflow the
/// call stack. Each connected component is rooted at its lowest index; for a node `v` whose
/// removal splits its component into parts of sizes `c1..ck`, the score is the number of node
/// pairs separated by `v` plus the paths ending at `v`. Ties go to the lower index.
pub fn find_path_center<N, E>(g: &Graph<N, E>) -> Option<usize> {
    let n = g.node_count();
    g.reset_colors();

    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut size: Vec<u64> = vec![1; n];
    let mut parts: Vec<Vec<u64>> = vec![Vec::new(); n];
    let mut best: Option<(u64, usize)> = None;

    for root in 0..n {
        if !g.is_node_visible(root) || g.color(root).ok() != Some(Color::White) {
            continue;
        }

        // Pre-order walk; `order` is replayed backwards to accumulate subtree sizes.
        let mut order: Vec<usize> = Vec::new();
        let mut stack: Vec<usize> = vec![root];
        let _ = g.set_color(root, Color::Gray);
        while let Some(v) = stack.pop() {
            order.push(v);
            for w in g.neighbors(v) {
                if g.color(w).ok() == Some(Color::White) {
                    let _ = g.set_color(w, Color::Gray);
                    parent[w] = Some(v);
                    stack.push(w);
                }
            }
        }
        for &v in order.iter().rev() {
            let _ = g.set_color(v, Color::Black);
            if let Some(p) = parent[v] {
                size[p] += size[v];
            }
        }

        let component = order.len() as u64;
        for &v in &order {
            if let Some(p) = parent[v] {
                parts[p].push(size[v]);
            }
        }
        for &v in &order {
            let mut pieces = std::mem::take(&mut parts[v]);
            if parent[v].is_some() {
                pieces.push(component - size[v]);
            }
            let sum: u64 = pieces.iter().sum();
            let sum_sq: u64 = pieces.iter().map(|c| c * c).sum();
            let score = (sum * sum - sum_sq) / 2 + (component - 1);
            if best.is_none_or(|(s, ix)| score > s || (score == s && v < ix)) {
                best = Some((score, v));
            }
        }
    }
    best.map(|(_, v)| v)
}

/// Path-count center for directed and reversed views.
///
/// For every node a depth-first walk computes how many nodes it reaches (`below`) and how many
/// reach it (`above`) along the view's direction; a node lies on `(above + 1) * (below + 1) - 1`
/// directed paths. The walk keeps its own stack, so long chains cannot overflow the call stack.
/// The undirected view delegates to [`find_path_center`].
pub fn find_weighted_center<N, E>(g: &Graph<N, E>, view: TreeView) -> Option<usize> {
    if view == TreeView::Undirected {
        return find_path_center(g);
    }
    let n = g.node_count();

    struct Walk {
        node: usize,
        next: Vec<usize>,
        cursor: usize,
        total: u64,
    }

    fn reach<N, E>(
        g: &Graph<N, E>,
        start: usize,
        view: TreeView,
        down: bool,
        memo: &mut [Option<u64>],
    ) {
        if memo[start].is_some() {
            return;
        }
        let next = |v: usize| {
            if down {
                view_children(g, v, view)
            } else {
                view_parents(g, v, view)
            }
        };
        let _ = g.set_color(start, Color::Gray);
        let mut stack = vec![Walk {
            node: start,
            next: next(start),
            cursor: 0,
            total: 0,
        }];
        while let Some(top) = stack.last_mut() {
            let Some(&w) = top.next.get(top.cursor) else {
                let (v, done) = (top.node, top.total);
                let _ = g.set_color(v, Color::Black);
                memo[v] = Some(done);
                stack.pop();
                if let Some(parent) = stack.last_mut() {
                    parent.total += done + 1;
                }
                continue;
            };
            top.cursor += 1;
            // Gray marks the current walk; reaching it again means a cycle.
            if g.color(w).ok() == Some(Color::Gray) {
                continue;
            }
            if let Some(r) = memo[w] {
                top.total += r + 1;
                continue;
            }
            let _ = g.set_color(w, Color::Gray);
            stack.push(Walk {
                node: w,
                next: next(w),
                cursor: 0,
                total: 0,
            });
        }
    }

    let mut below: Vec<Option<u64>> = vec![None; n];
    let mut above: Vec<Option<u64>> = vec![None; n];
    g.reset_colors();
    for v in 0..n {
        if g.is_node_visible(v) {
            reach(g, v, view, true, &mut below);
        }
    }
    g.reset_colors();
    for v in 0..n {
        if g.is_node_visible(v) {
            reach(g, v, view, false, &mut above);
        }
    }

    let mut best: Option<(u64, usize)> = None;
    for v in (0..n).filter(|&v| g.is_node_visible(v)) {
        let b = below[v].unwrap_or(0);
        let a = above[v].unwrap_or(0);
        let score = (a + 1) * (b + 1) - 1;
        if best.is_none_or(|(s, _)| score > s) {
            best = Some((score, v));
        }
    }
    best.map(|(_, v)| v)
}
