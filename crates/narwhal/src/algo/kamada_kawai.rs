//! Kamada-Kawai stress minimization.
//!
//! Every pair `(i, j)` is joined by a spring of rest length `L * d_ij` and stiffness
//! `K / d_ij^2`, where `d_ij` is the graph-theoretic distance. Each iteration moves the node with
//! the largest energy gradient with a Newton-Raphson solve of the 2x2 Hessian system. When no
//! node has a gradient left, or the solve no longer moves the node, pairs of nodes may
//! optionally swap places if that lowers the total energy.

use super::{ForceModel, IterationContext, MOVE_EPSILON, ModelStep};
use crate::error::Result;
use crate::frame::Frame;
use crate::geometry::Vector;
use crate::params::{
    CommonParameters, LayoutParameters, ensure_iterations, ensure_non_negative, ensure_positive,
};
use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const NEWTON_STEPS: usize = 100;
const MIN_DISTANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KamadaKawaiParameters {
    #[serde(flatten)]
    pub common: CommonParameters,
    pub max_iterations: usize,
    /// Scales the ideal edge length derived from the bounding box.
    pub length_factor: f64,
    /// Graph distances are capped at `diameter * disconnected_multiplier`; pairs in different
    /// components use the cap.
    pub disconnected_multiplier: f64,
    /// Spring stiffness `K`.
    pub spring_constant: f64,
    /// Gradient magnitude treated as zero.
    pub gradient_tolerance: f64,
    /// Try swapping node pairs once the Newton steps stop moving nodes.
    pub exchange_vertices: bool,
}

impl Default for KamadaKawaiParameters {
    fn default() -> Self {
        Self {
            common: CommonParameters::default(),
            max_iterations: 2000,
            length_factor: 0.9,
            disconnected_multiplier: 1.5,
            spring_constant: 1.0,
            gradient_tolerance: f64::EPSILON,
            exchange_vertices: true,
        }
    }
}

impl LayoutParameters for KamadaKawaiParameters {
    fn common(&self) -> &CommonParameters {
        &self.common
    }

    fn common_mut(&mut self) -> &mut CommonParameters {
        &mut self.common
    }

    fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn validate(&self) -> Result<()> {
        self.common.validate()?;
        ensure_iterations(self.max_iterations)?;
        ensure_positive("lengthFactor", self.length_factor)?;
        ensure_positive("disconnectedMultiplier", self.disconnected_multiplier)?;
        ensure_positive("springConstant", self.spring_constant)?;
        ensure_non_negative("gradientTolerance", self.gradient_tolerance)?;
        Ok(())
    }
}

/// All-pairs shortest path lengths over the undirected view of `frame`, row-major.
///
/// Edge weights are lengths; zero-weight edges do not connect. Unreachable pairs are
/// `f64::INFINITY`. Relaxation uses a FIFO queue and re-enqueues a node whenever its distance
/// improves, which is exact for non-negative lengths.
pub fn distance_matrix(frame: &Frame) -> Vec<f64> {
    let n = frame.len();
    let mut dist = vec![f64::INFINITY; n * n];
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut queued = vec![false; n];
    for s in 0..n {
        let row = &mut dist[s * n..(s + 1) * n];
        row[s] = 0.0;
        queue.push_back(s);
        queued[s] = true;
        while let Some(u) = queue.pop_front() {
            queued[u] = false;
            for &(v, e) in frame.adjacency(u) {
                let len = frame.edges()[e].weight;
                if len <= 0.0 {
                    continue;
                }
                let candidate = row[u] + len;
                if candidate < row[v] {
                    row[v] = candidate;
                    if !queued[v] {
                        queued[v] = true;
                        queue.push_back(v);
                    }
                }
            }
        }
    }
    dist
}

#[derive(Debug, Clone, Default)]
pub struct KamadaKawai {
    n: usize,
    diameter: f64,
    ideal_length: f64,
    /// Rest lengths `l_ij`, row-major.
    rest: Vec<f64>,
    /// Stiffness `k_ij`, row-major.
    stiffness: Vec<f64>,
}

impl KamadaKawai {
    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn ideal_length(&self) -> f64 {
        self.ideal_length
    }

    fn gradient(&self, pos: &[Vector], m: usize) -> Vector {
        let mut g = Vector::zeros();
        for i in 0..self.n {
            if i == m {
                continue;
            }
            let d = pos[m] - pos[i];
            let dist = d.norm().max(MIN_DISTANCE);
            let ix = m * self.n + i;
            g += d * (self.stiffness[ix] * (1.0 - self.rest[ix] / dist));
        }
        g
    }

    fn hessian(&self, pos: &[Vector], m: usize) -> Matrix2<f64> {
        let (mut xx, mut xy, mut yy) = (0.0, 0.0, 0.0);
        for i in 0..self.n {
            if i == m {
                continue;
            }
            let d = pos[m] - pos[i];
            let dist = d.norm().max(MIN_DISTANCE);
            let dist3 = dist * dist * dist;
            let ix = m * self.n + i;
            let (k, l) = (self.stiffness[ix], self.rest[ix]);
            xx += k * (1.0 - l * d.y * d.y / dist3);
            xy += k * l * d.x * d.y / dist3;
            yy += k * (1.0 - l * d.x * d.x / dist3);
        }
        Matrix2::new(xx, xy, xy, yy)
    }

    fn pair_energy(&self, pos: &[Vector], i: usize, j: usize) -> f64 {
        let ix = i * self.n + j;
        let dist = (pos[i] - pos[j]).norm();
        let stretch = dist - self.rest[ix];
        0.5 * self.stiffness[ix] * stretch * stretch
    }

    /// Energy of the springs attached to `i`.
    fn node_energy(&self, pos: &[Vector], i: usize) -> f64 {
        (0..self.n)
            .filter(|&j| j != i)
            .map(|j| self.pair_energy(pos, i, j))
            .sum()
    }

    /// Total stress energy of `pos`.
    pub fn stress_energy(&self, pos: &[Vector]) -> f64 {
        let mut e = 0.0;
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                e += self.pair_energy(pos, i, j);
            }
        }
        e
    }

    fn newton(&self, pos: &mut [Vector], m: usize, tolerance: f64) {
        for _ in 0..NEWTON_STEPS {
            let g = self.gradient(pos, m);
            if g.norm() <= tolerance {
                break;
            }
            let Some(step) = self.hessian(pos, m).lu().solve(&(-g)) else {
                break;
            };
            if !(step.x.is_finite() && step.y.is_finite()) {
                break;
            }
            pos[m] += step;
        }
    }

    /// Swaps every pair of unpinned nodes whose exchange lowers the energy. Returns whether any
    /// swap was accepted.
    fn exchange(&self, pos: &mut [Vector], frame: &Frame) -> bool {
        let mut improved = false;
        for i in 0..self.n {
            if frame.is_fixed(i) {
                continue;
            }
            for j in (i + 1)..self.n {
                if frame.is_fixed(j) {
                    continue;
                }
                // The i-j spring keeps its length under a swap; only the other springs change.
                let before = self.node_energy(pos, i) + self.node_energy(pos, j);
                pos.swap(i, j);
                let after = self.node_energy(pos, i) + self.node_energy(pos, j);
                if after < before {
                    improved = true;
                } else {
                    pos.swap(i, j);
                }
            }
        }
        improved
    }

    fn settle(&self, pos: &mut [Vector], frame: &Frame) -> ModelStep {
        if self.exchange(pos, frame) {
            ModelStep::Continue
        } else {
            ModelStep::Converged
        }
    }
}

impl ForceModel for KamadaKawai {
    type Parameters = KamadaKawaiParameters;

    const NAME: &'static str = "kamada-kawai";

    fn prepare(&mut self, frame: &Frame, params: &Self::Parameters) -> Result<()> {
        let n = frame.len();
        let dist = distance_matrix(frame);
        let diameter = dist
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(0.0_f64, f64::max);
        let diameter = if diameter > 0.0 { diameter } else { 1.0 };
        let ideal_length =
            params.common.bounding_box.area().sqrt() / diameter * params.length_factor;
        let cap = diameter * params.disconnected_multiplier;

        self.n = n;
        self.diameter = diameter;
        self.ideal_length = ideal_length;
        self.rest = vec![0.0; n * n];
        self.stiffness = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let ix = i * n + j;
                // Keeps the stiffness finite.
                let d = dist[ix].min(cap).max(MIN_DISTANCE);
                self.rest[ix] = ideal_length * d;
                self.stiffness[ix] = params.spring_constant / (d * d);
            }
        }
        tracing::debug!(
            nodes = n,
            diameter,
            ideal_length,
            "kamada-kawai distances computed"
        );
        Ok(())
    }

    fn restart(&mut self, _frame: &Frame, _params: &Self::Parameters) {}

    fn iterate(
        &mut self,
        ctx: IterationContext<'_, Self::Parameters>,
        out: &mut [Vector],
    ) -> Result<ModelStep> {
        let IterationContext { frame, params, .. } = ctx;
        let tolerance = params.gradient_tolerance;

        let mut best: Option<(f64, usize)> = None;
        for m in (0..self.n).filter(|&m| !frame.is_fixed(m)) {
            let delta = self.gradient(out, m).norm();
            if best.is_none_or(|(b, _)| delta > b) {
                best = Some((delta, m));
            }
        }

        match best {
            Some((delta, m)) if delta > tolerance => {
                let start = out[m];
                self.newton(out, m, tolerance);
                // The driver stops on an iteration without movement.
                if !params.exchange_vertices || (out[m] - start).norm_squared() > MOVE_EPSILON {
                    return Ok(ModelStep::Continue);
                }
                Ok(self.settle(out, frame))
            }
            Some(_) if params.exchange_vertices => Ok(self.settle(out, frame)),
            _ => Ok(ModelStep::Converged),
        }
    }
}
