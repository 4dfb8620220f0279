//! Deterministic random source shared by the randomized engines.

use crate::geometry::{Rect, Vector};

/// xorshift64* generator. Deterministic for a given seed on every platform.
#[derive(Debug, Clone)]
pub struct XorShift64Star {
    state: u64,
}

impl XorShift64Star {
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D_u64)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[-1, 1)`.
    pub fn next_f64_signed(&mut self) -> f64 {
        self.next_f64_unit() * 2.0 - 1.0
    }

    /// Uniform point inside `rect`.
    pub fn point_in(&mut self, rect: &Rect) -> Vector {
        Vector::new(
            rect.x + self.next_f64_unit() * rect.width,
            rect.y + self.next_f64_unit() * rect.height,
        )
    }
}
