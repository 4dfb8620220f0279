//! LinLog energy model minimized with a Barnes-Hut quad-tree.
//!
//! The energy of a node is the sum of
//! - attraction to its neighbors, `w * d^a / a` (`w * ln d` for `a = 0`),
//! - repulsion from every other node, `-f * w_u * w_v * d^r / r` (`-f * w_u * w_v * ln d` for
//!   `r = 0`), where a node's repulsion weight is the sum of its edge weights,
//! - gravitation towards the barycenter, shaped like attraction and scaled by
//!   `gravitation_multiplier * f * w_u`.
//!
//! Repulsion is approximated with a quad-tree: a cell farther away than `opening_factor`
//! times its width acts as one point mass, unless the node itself lies inside it. Each node
//! moves along a Newton-like direction by the step multiple with the lowest energy. While the
//! final repulsion exponent is below one, the exponents start higher and blend towards their
//! final values over the first 90% of the iterations.

mod quad_tree;

use super::{ForceModel, IterationContext, ModelStep};
use crate::error::Result;
use crate::frame::Frame;
use crate::geometry::Vector;
use crate::params::{
    CommonParameters, LayoutParameters, ensure_finite, ensure_iterations, ensure_non_negative,
    ensure_positive, invalid,
};
use quad_tree::QuadTree;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinLogParameters {
    #[serde(flatten)]
    pub common: CommonParameters,
    pub max_iterations: usize,
    pub attraction_exponent: f64,
    pub repulsion_exponent: f64,
    pub gravitation_multiplier: f64,
    /// Cells closer than this many widths are opened instead of approximated.
    pub opening_factor: f64,
}

impl Default for LinLogParameters {
    fn default() -> Self {
        Self {
            common: CommonParameters::default(),
            max_iterations: 100,
            attraction_exponent: 1.0,
            repulsion_exponent: 0.0,
            gravitation_multiplier: 0.05,
            opening_factor: 2.0,
        }
    }
}

impl LayoutParameters for LinLogParameters {
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
        ensure_finite("attractionExponent", self.attraction_exponent)?;
        ensure_finite("repulsionExponent", self.repulsion_exponent)?;
        if self.repulsion_exponent >= self.attraction_exponent {
            return Err(invalid(
                "repulsionExponent",
                format!(
                    "must be below attractionExponent ({} >= {})",
                    self.repulsion_exponent, self.attraction_exponent
                ),
            ));
        }
        ensure_non_negative("gravitationMultiplier", self.gravitation_multiplier)?;
        ensure_positive("openingFactor", self.opening_factor)?;
        Ok(())
    }
}

/// Energy terms for one iteration. Positions are passed separately so the line search can
/// move a node in place.
struct Forces<'a> {
    frame: &'a Frame,
    weights: &'a [f64],
    repulsion_factor: f64,
    attraction_exponent: f64,
    repulsion_exponent: f64,
    gravitation: f64,
    opening_factor: f64,
    barycenter: Vector,
}

impl Forces<'_> {
    fn energy(&self, pos: &[Vector], slot: usize, tree: Option<&QuadTree>) -> f64 {
        let repulsion = tree.map_or(0.0, |t| self.repulsion_energy(pos, slot, t, QuadTree::ROOT));
        repulsion + self.attraction_energy(pos, slot) + self.gravitation_energy(pos, slot)
    }

    fn repulsion_energy(&self, pos: &[Vector], slot: usize, tree: &QuadTree, cell: usize) -> f64 {
        let w = self.weights[slot];
        let c = tree.cell(cell);
        if w == 0.0 || c.node == Some(slot) {
            return 0.0;
        }
        let dist = (pos[slot] - c.position).norm();
        if c.has_children() && (c.contains(pos[slot]) || dist < self.opening_factor * c.width()) {
            return c
                .children
                .iter()
                .flatten()
                .map(|&child| self.repulsion_energy(pos, slot, tree, child))
                .sum();
        }
        if dist == 0.0 {
            return 0.0;
        }
        let scale = self.repulsion_factor * w * c.weight;
        if self.repulsion_exponent == 0.0 {
            -scale * dist.ln()
        } else {
            -scale * dist.powf(self.repulsion_exponent) / self.repulsion_exponent
        }
    }

    fn attraction_energy(&self, pos: &[Vector], slot: usize) -> f64 {
        let mut energy = 0.0;
        for &(other, e) in self.frame.adjacency(slot) {
            let weight = self.frame.edges()[e].weight;
            let dist = (pos[other] - pos[slot]).norm();
            if weight == 0.0 || dist == 0.0 {
                continue;
            }
            energy += weight * potential(dist, self.attraction_exponent);
        }
        energy
    }

    fn gravitation_energy(&self, pos: &[Vector], slot: usize) -> f64 {
        let dist = (pos[slot] - self.barycenter).norm();
        if dist == 0.0 {
            return 0.0;
        }
        self.gravitation
            * self.repulsion_factor
            * self.weights[slot]
            * potential(dist, self.attraction_exponent)
    }

    /// Adds the repulsion direction to `dir` and returns its second-derivative estimate.
    fn repulsion_dir(
        &self,
        pos: &[Vector],
        slot: usize,
        tree: &QuadTree,
        cell: usize,
        dir: &mut Vector,
    ) -> f64 {
        let w = self.weights[slot];
        let c = tree.cell(cell);
        if w == 0.0 || c.node == Some(slot) {
            return 0.0;
        }
        let dist = (pos[slot] - c.position).norm();
        if c.has_children() && (c.contains(pos[slot]) || dist < self.opening_factor * c.width()) {
            let mut dir2 = 0.0;
            for &child in c.children.iter().flatten() {
                dir2 += self.repulsion_dir(pos, slot, tree, child, dir);
            }
            return dir2;
        }
        if dist == 0.0 {
            return 0.0;
        }
        let tmp = self.repulsion_factor * w * c.weight * dist.powf(self.repulsion_exponent - 2.0);
        *dir -= (c.position - pos[slot]) * tmp;
        tmp * (self.repulsion_exponent - 1.0).abs()
    }

    fn attraction_dir(&self, pos: &[Vector], slot: usize, dir: &mut Vector) -> f64 {
        let mut dir2 = 0.0;
        for &(other, e) in self.frame.adjacency(slot) {
            let weight = self.frame.edges()[e].weight;
            let delta = pos[other] - pos[slot];
            let dist = delta.norm();
            if weight == 0.0 || dist == 0.0 {
                continue;
            }
            let tmp = weight * dist.powf(self.attraction_exponent - 2.0);
            dir2 += tmp * (self.attraction_exponent - 1.0).abs();
            *dir += delta * tmp;
        }
        dir2
    }

    fn gravitation_dir(&self, pos: &[Vector], slot: usize, dir: &mut Vector) -> f64 {
        let delta = self.barycenter - pos[slot];
        let dist = delta.norm();
        if dist == 0.0 {
            return 0.0;
        }
        let tmp = self.gravitation
            * self.repulsion_factor
            * self.weights[slot]
            * dist.powf(self.attraction_exponent - 2.0);
        *dir += delta * tmp;
        tmp * (self.attraction_exponent - 1.0).abs()
    }

    /// Descent direction, scaled by the second-derivative estimate and capped at an eighth of
    /// the tree width.
    fn direction(&self, pos: &[Vector], slot: usize, tree: Option<&QuadTree>) -> Vector {
        let mut dir = Vector::zeros();
        let mut dir2 = 0.0;
        if let Some(t) = tree {
            dir2 += self.repulsion_dir(pos, slot, t, QuadTree::ROOT, &mut dir);
        }
        dir2 += self.attraction_dir(pos, slot, &mut dir);
        dir2 += self.gravitation_dir(pos, slot, &mut dir);
        if dir2 != 0.0 {
            dir /= dir2;
        }
        if let Some(t) = tree {
            let limit = t.root().width() / 8.0;
            let len = dir.norm();
            if len > limit {
                dir *= limit / len;
            }
        }
        dir
    }
}

fn potential(dist: f64, exponent: f64) -> f64 {
    if exponent == 0.0 {
        dist.ln()
    } else {
        dist.powf(exponent) / exponent
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinLog {
    weights: Vec<f64>,
    repulsion_factor: f64,
    attraction_exponent: f64,
    repulsion_exponent: f64,
    /// Layout units per model unit.
    unit: f64,
    positions: Vec<Vector>,
}

impl LinLog {
    pub fn repulsion_factor(&self) -> f64 {
        self.repulsion_factor
    }

    /// Current `(attraction, repulsion)` exponents after cooling.
    pub fn exponents(&self) -> (f64, f64) {
        (self.attraction_exponent, self.repulsion_exponent)
    }

    fn cool(&mut self, params: &LinLogParameters, step: usize) {
        let (fa, fr) = (params.attraction_exponent, params.repulsion_exponent);
        self.attraction_exponent = fa;
        self.repulsion_exponent = fr;
        let total = params.max_iterations as f64;
        let step = step as f64;
        if total < 50.0 || fr >= 1.0 {
            return;
        }
        let blend = if step <= 0.6 * total {
            1.0
        } else if step <= 0.9 * total {
            (0.9 - step / total) / 0.3
        } else {
            0.0
        };
        self.attraction_exponent += 1.1 * (1.0 - fr) * blend;
        self.repulsion_exponent += 0.9 * (1.0 - fr) * blend;
    }

    fn barycenter(&self, pos: &[Vector]) -> Vector {
        let total: f64 = self.weights.iter().sum();
        if total > 0.0 {
            pos.iter()
                .zip(&self.weights)
                .fold(Vector::zeros(), |acc, (p, w)| acc + p * *w)
                / total
        } else if pos.is_empty() {
            Vector::zeros()
        } else {
            pos.iter().sum::<Vector>() / pos.len() as f64
        }
    }

    fn build_tree(&self, pos: &[Vector]) -> Option<QuadTree> {
        QuadTree::build(
            self.weights
                .iter()
                .enumerate()
                .filter(|(_, w)| **w > 0.0)
                .map(|(slot, w)| (slot, pos[slot], *w)),
        )
    }
}

impl ForceModel for LinLog {
    type Parameters = LinLogParameters;

    const NAME: &'static str = "linlog";

    fn prepare(&mut self, frame: &Frame, params: &Self::Parameters) -> Result<()> {
        let n = frame.len();
        self.weights = vec![0.0; n];
        for e in frame.edges() {
            self.weights[e.source] += e.weight;
            self.weights[e.target] += e.weight;
        }
        let attraction_sum: f64 = frame.edges().iter().map(|e| e.weight).sum();
        let repulsion_sum: f64 = self.weights.iter().sum();
        self.repulsion_factor = if attraction_sum > 0.0 && repulsion_sum > 0.0 {
            attraction_sum / (repulsion_sum * repulsion_sum)
                * repulsion_sum
                    .powf(0.5 * (params.attraction_exponent - params.repulsion_exponent))
        } else {
            1.0
        };
        self.unit = (params.common.bounding_box.area() / n.max(1) as f64).sqrt();
        Ok(())
    }

    fn restart(&mut self, _frame: &Frame, params: &Self::Parameters) {
        self.attraction_exponent = params.attraction_exponent;
        self.repulsion_exponent = params.repulsion_exponent;
    }

    fn iterate(
        &mut self,
        ctx: IterationContext<'_, Self::Parameters>,
        out: &mut [Vector],
    ) -> Result<ModelStep> {
        let IterationContext {
            frame,
            params,
            iteration,
            ..
        } = ctx;
        self.cool(params, iteration + 1);

        let unit = self.unit;
        let mut pos = std::mem::take(&mut self.positions);
        pos.clear();
        pos.extend(frame.positions().iter().map(|p| p / unit));

        let forces = Forces {
            frame,
            weights: &self.weights,
            repulsion_factor: self.repulsion_factor,
            attraction_exponent: self.attraction_exponent,
            repulsion_exponent: self.repulsion_exponent,
            gravitation: params.gravitation_multiplier,
            opening_factor: params.opening_factor,
            barycenter: self.barycenter(&pos),
        };
        let mut tree = self.build_tree(&pos);
        let mut moved = false;

        for slot in 0..frame.len() {
            if frame.is_fixed(slot) {
                continue;
            }
            let old = pos[slot];
            let mut best_energy = forces.energy(&pos, slot, tree.as_ref());
            let dir = forces.direction(&pos, slot, tree.as_ref()) / 32.0;

            let mut best_multiple = 0u32;
            let mut multiple = 32u32;
            while multiple >= 1 && (best_multiple == 0 || best_multiple / 2 == multiple) {
                pos[slot] = old + dir * f64::from(multiple);
                let e = forces.energy(&pos, slot, tree.as_ref());
                if e < best_energy {
                    best_energy = e;
                    best_multiple = multiple;
                }
                multiple /= 2;
            }
            let mut multiple = 64u32;
            while multiple <= 128 && best_multiple == multiple / 2 {
                pos[slot] = old + dir * f64::from(multiple);
                let e = forces.energy(&pos, slot, tree.as_ref());
                if e < best_energy {
                    best_energy = e;
                    best_multiple = multiple;
                }
                multiple *= 2;
            }

            pos[slot] = old + dir * f64::from(best_multiple);
            if best_multiple == 0 || pos[slot] == old {
                continue;
            }
            moved = true;
            out[slot] = pos[slot] * unit;
            let w = self.weights[slot];
            if w > 0.0 {
                let relocated = tree
                    .as_mut()
                    .is_some_and(|t| t.move_node(slot, old, pos[slot], w));
                if !relocated {
                    tree = self.build_tree(&pos);
                }
            }
        }

        self.positions = pos;
        Ok(if moved {
            ModelStep::Continue
        } else {
            ModelStep::Converged
        })
    }
}
