//! Barnes-Hut quad-tree over weighted points.
//!
//! Cells live in an arena. Every cell stores the weighted centroid and total weight of the
//! points below it. A leaf holds a single point; below `MAX_DEPTH` near-coincident points are
//! merged into one overflow cell instead of splitting further.

use crate::geometry::Vector;

const MAX_DEPTH: usize = 20;

#[derive(Debug, Clone)]
pub(crate) struct Cell {
    /// Point held by a leaf.
    pub(crate) node: Option<usize>,
    pub(crate) position: Vector,
    pub(crate) weight: f64,
    min: Vector,
    max: Vector,
    pub(crate) children: [Option<usize>; 4],
    overflow: Vec<usize>,
}

impl Cell {
    fn leaf(node: usize, position: Vector, weight: f64, min: Vector, max: Vector) -> Self {
        Self {
            node: Some(node),
            position,
            weight,
            min,
            max,
            children: [None; 4],
            overflow: Vec::new(),
        }
    }

    pub(crate) fn width(&self) -> f64 {
        (self.max.x - self.min.x).max(self.max.y - self.min.y)
    }

    pub(crate) fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }

    pub(crate) fn contains(&self, p: Vector) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x <= self.max.x && p.y <= self.max.y
    }

    fn quadrant(&self, p: Vector) -> usize {
        let mid = (self.min + self.max) / 2.0;
        usize::from(p.x > mid.x) | (usize::from(p.y > mid.y) << 1)
    }

    fn quadrant_bounds(&self, q: usize) -> (Vector, Vector) {
        let mid = (self.min + self.max) / 2.0;
        let (x0, x1) = if q & 1 == 0 {
            (self.min.x, mid.x)
        } else {
            (mid.x, self.max.x)
        };
        let (y0, y1) = if q & 2 == 0 {
            (self.min.y, mid.y)
        } else {
            (mid.y, self.max.y)
        };
        (Vector::new(x0, y0), Vector::new(x1, y1))
    }

    fn absorb(&mut self, p: Vector, w: f64) {
        let total = self.weight + w;
        if total > 0.0 {
            self.position = (self.position * self.weight + p * w) / total;
        }
        self.weight = total;
    }

    fn release(&mut self, p: Vector, w: f64) {
        let total = self.weight - w;
        if total > f64::EPSILON * self.weight {
            self.position = (self.position * self.weight - p * w) / total;
            self.weight = total;
        } else {
            self.weight = 0.0;
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct QuadTree {
    cells: Vec<Cell>,
    free: Vec<usize>,
}

impl QuadTree {
    pub(crate) const ROOT: usize = 0;

    /// Builds a tree over `(id, position, weight)` points. Bounds are the bounding box of the
    /// points padded by half its size on every side, leaving room for incremental moves.
    pub(crate) fn build<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (usize, Vector, f64)>,
    {
        let points: Vec<(usize, Vector, f64)> = points.into_iter().collect();
        let (first, rest) = points.split_first()?;

        let mut min = first.1;
        let mut max = first.1;
        for &(_, p, _) in rest {
            min = min.inf(&p);
            max = max.sup(&p);
        }
        let size = max - min;
        let pad = Vector::new(
            if size.x > 0.0 { size.x / 2.0 } else { 1.0 },
            if size.y > 0.0 { size.y / 2.0 } else { 1.0 },
        );

        let mut tree = Self {
            cells: vec![Cell::leaf(first.0, first.1, first.2, min - pad, max + pad)],
            free: Vec::new(),
        };
        for &(id, p, w) in rest {
            tree.insert(Self::ROOT, id, p, w, 0);
        }
        Some(tree)
    }

    pub(crate) fn cell(&self, ix: usize) -> &Cell {
        &self.cells[ix]
    }

    pub(crate) fn root(&self) -> &Cell {
        &self.cells[Self::ROOT]
    }

    fn alloc(&mut self, cell: Cell) -> usize {
        match self.free.pop() {
            Some(ix) => {
                self.cells[ix] = cell;
                ix
            }
            None => {
                self.cells.push(cell);
                self.cells.len() - 1
            }
        }
    }

    fn insert(&mut self, cell: usize, id: usize, p: Vector, w: f64, depth: usize) {
        if depth >= MAX_DEPTH || !self.cells[cell].overflow.is_empty() {
            let c = &mut self.cells[cell];
            if let Some(prev) = c.node.take() {
                c.overflow.push(prev);
            }
            c.overflow.push(id);
            c.absorb(p, w);
            return;
        }
        if let Some(prev) = self.cells[cell].node.take() {
            let (pp, pw) = (self.cells[cell].position, self.cells[cell].weight);
            self.place_in_child(cell, prev, pp, pw, depth);
        }
        self.place_in_child(cell, id, p, w, depth);
        self.cells[cell].absorb(p, w);
    }

    fn place_in_child(&mut self, cell: usize, id: usize, p: Vector, w: f64, depth: usize) {
        let q = self.cells[cell].quadrant(p);
        match self.cells[cell].children[q] {
            Some(child) => self.insert(child, id, p, w, depth + 1),
            None => {
                let (min, max) = self.cells[cell].quadrant_bounds(q);
                let child = self.alloc(Cell::leaf(id, p, w, min, max));
                self.cells[cell].children[q] = Some(child);
            }
        }
    }

    /// Removes point `id` last placed at `p`. Returns whether `cell` ended up empty.
    fn remove(&mut self, cell: usize, id: usize, p: Vector, w: f64) -> bool {
        let c = &mut self.cells[cell];
        if c.node == Some(id) {
            c.node = None;
            c.weight = 0.0;
            return true;
        }
        if let Some(i) = c.overflow.iter().position(|&m| m == id) {
            c.overflow.swap_remove(i);
            c.release(p, w);
            return c.overflow.is_empty();
        }
        c.release(p, w);
        let q = c.quadrant(p);
        if let Some(child) = c.children[q] {
            if self.remove(child, id, p, w) {
                self.cells[cell].children[q] = None;
                self.free.push(child);
            }
        }
        let c = &self.cells[cell];
        c.node.is_none() && c.overflow.is_empty() && !c.has_children()
    }

    /// Moves point `id` from `old` to `new`, adjusting centroids along the way and re-homing
    /// the point when it changes quadrant.
    ///
    /// Returns `false` (leaving the tree untouched) when `new` lies outside the root bounds;
    /// the caller is expected to rebuild the tree.
    pub(crate) fn move_node(&mut self, id: usize, old: Vector, new: Vector, w: f64) -> bool {
        if !self.root().contains(new) {
            return false;
        }
        self.move_in(Self::ROOT, id, old, new, w, 0);
        true
    }

    fn move_in(&mut self, cell: usize, id: usize, old: Vector, new: Vector, w: f64, depth: usize) {
        let c = &mut self.cells[cell];
        if c.weight > 0.0 {
            c.position += (new - old) * (w / c.weight);
        }
        if c.node == Some(id) || c.overflow.contains(&id) {
            return;
        }
        let (oq, nq) = (c.quadrant(old), c.quadrant(new));
        let Some(child) = c.children[oq] else {
            return;
        };
        if oq == nq {
            self.move_in(child, id, old, new, w, depth + 1);
            return;
        }
        if self.remove(child, id, old, w) {
            self.cells[cell].children[oq] = None;
            self.free.push(child);
        }
        self.place_in_child(cell, id, new, w, depth);
    }
}
