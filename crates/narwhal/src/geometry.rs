//! Small geometric helpers shared by the layout engines.

use serde::{Deserialize, Serialize};

pub type Vector = nalgebra::Vector2<f64>;

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Rect {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1000.0,
            height: 1000.0,
        }
    }
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min(&self) -> Vector {
        Vector::new(self.x, self.y)
    }

    pub fn max(&self) -> Vector {
        Vector::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Vector {
        Vector::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn diagonal_squared(&self) -> f64 {
        self.width * self.width + self.height * self.height
    }

    pub fn contains(&self, p: Vector) -> bool {
        p.x >= self.x && p.y >= self.y && p.x <= self.x + self.width && p.y <= self.y + self.height
    }

    /// Closest point of the rectangle to `p`.
    pub fn clamp(&self, p: Vector) -> Vector {
        Vector::new(
            p.x.clamp(self.x, self.x + self.width),
            p.y.clamp(self.y, self.y + self.height),
        )
    }
}
