//! Contracts between user node/edge labels and the layout engines.

use crate::geometry::Vector;

/// A node label the layout can read and move.
pub trait LayoutNode {
    fn position(&self) -> Vector;

    fn set_position(&mut self, position: Vector);

    /// Pinned nodes keep their position but still exert forces on the others.
    fn is_fixed(&self) -> bool {
        false
    }

    /// Called after the layout committed a new position into this node.
    fn update(&mut self) {}
}

/// An edge label carrying an attraction weight.
pub trait LayoutEdge {
    /// Non-negative weight. Negative values are treated as zero.
    fn weight(&self) -> f64 {
        1.0
    }

    /// Called on every visible edge after a layout pass.
    fn update(&mut self) {}
}

impl LayoutEdge for () {}

impl LayoutEdge for f64 {
    fn weight(&self) -> f64 {
        *self
    }
}

/// Plain positioned node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vector,
    pub fixed: bool,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vector::zeros(),
            fixed: false,
        }
    }
}

impl Vertex {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Vector::new(x, y),
            fixed: false,
        }
    }

    pub fn pinned(x: f64, y: f64) -> Self {
        Self {
            position: Vector::new(x, y),
            fixed: true,
        }
    }
}

impl LayoutNode for Vertex {
    fn position(&self) -> Vector {
        self.position
    }

    fn set_position(&mut self, position: Vector) {
        self.position = position;
    }

    fn is_fixed(&self) -> bool {
        self.fixed
    }
}

/// Weighted edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub weight: f64,
}

impl Default for Link {
    fn default() -> Self {
        Self { weight: 1.0 }
    }
}

impl Link {
    pub fn weighted(weight: f64) -> Self {
        Self { weight }
    }
}

impl LayoutEdge for Link {
    fn weight(&self) -> f64 {
        self.weight
    }
}
