//! Fruchterman-Reingold spring embedder.
//!
//! Every pair of nodes repels with `cr / d`, every edge attracts with `w * d^2 / ca`, and each
//! node's displacement is capped by a temperature that cools every iteration. The run ends once
//! the temperature falls below 1% of its initial value.

use super::{ForceModel, IterationContext, ModelStep};
use crate::error::Result;
use crate::frame::Frame;
use crate::geometry::Vector;
use crate::params::{
    CommonParameters, LayoutParameters, ensure_in_range, ensure_iterations, ensure_positive,
    invalid,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Cooling {
    /// `t *= 1 - iteration / max_iterations`.
    #[default]
    Linear,
    /// `t *= lambda`.
    Exponential { lambda: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FruchtermanReingoldParameters {
    #[serde(flatten)]
    pub common: CommonParameters,
    pub max_iterations: usize,
    /// Ideal edge length `K`. Derived as `sqrt(area / n)` when unset.
    pub ideal_edge_length: Option<f64>,
    pub attraction_multiplier: f64,
    pub repulsion_multiplier: f64,
    /// Distances are clamped to at least this value before dividing by them.
    pub min_distance: f64,
    /// Displacement cap of the first iteration. Defaults to a tenth of the shorter box side.
    pub initial_temperature: Option<f64>,
    pub cooling: Cooling,
    /// Keep nodes inside the bounding box.
    pub keep_in_bounds: bool,
}

impl Default for FruchtermanReingoldParameters {
    fn default() -> Self {
        Self {
            common: CommonParameters::default(),
            max_iterations: 700,
            ideal_edge_length: None,
            attraction_multiplier: 0.75,
            repulsion_multiplier: 0.75,
            min_distance: 1e-6,
            initial_temperature: None,
            cooling: Cooling::Linear,
            keep_in_bounds: true,
        }
    }
}

impl LayoutParameters for FruchtermanReingoldParameters {
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
        if let Some(k) = self.ideal_edge_length {
            ensure_positive("idealEdgeLength", k)?;
        }
        ensure_positive("attractionMultiplier", self.attraction_multiplier)?;
        ensure_positive("repulsionMultiplier", self.repulsion_multiplier)?;
        ensure_positive("minDistance", self.min_distance)?;
        if let Some(t) = self.initial_temperature {
            ensure_positive("initialTemperature", t)?;
        }
        if let Cooling::Exponential { lambda } = self.cooling {
            ensure_in_range("cooling.lambda", lambda, 0.0, 1.0)?;
            if lambda == 0.0 || lambda == 1.0 {
                return Err(invalid("cooling.lambda", "must lie strictly between 0 and 1"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FruchtermanReingold {
    ideal_edge_length: f64,
    attraction_constant: f64,
    repulsion_constant: f64,
    initial_temperature: f64,
    temperature: f64,
    displacement: Vec<Vector>,
}

impl FruchtermanReingold {
    pub fn ideal_edge_length(&self) -> f64 {
        self.ideal_edge_length
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl ForceModel for FruchtermanReingold {
    type Parameters = FruchtermanReingoldParameters;

    const NAME: &'static str = "fruchterman-reingold";

    fn prepare(&mut self, frame: &Frame, params: &Self::Parameters) -> Result<()> {
        let n = frame.len().max(1) as f64;
        let k = params
            .ideal_edge_length
            .unwrap_or_else(|| (params.common.bounding_box.area() / n).sqrt());
        self.ideal_edge_length = k;
        self.attraction_constant = k * params.attraction_multiplier;
        let r = k * params.repulsion_multiplier;
        self.repulsion_constant = r * r;
        self.displacement = vec![Vector::zeros(); frame.len()];
        Ok(())
    }

    fn restart(&mut self, _frame: &Frame, params: &Self::Parameters) {
        let b = &params.common.bounding_box;
        self.initial_temperature = params
            .initial_temperature
            .unwrap_or_else(|| b.width.min(b.height) / 10.0);
        self.temperature = self.initial_temperature;
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
        if self.temperature < self.initial_temperature * 0.01 {
            return Ok(ModelStep::Converged);
        }

        let n = frame.len();
        let pos = frame.positions();
        let min_d = params.min_distance;
        self.displacement.clear();
        self.displacement.resize(n, Vector::zeros());

        for v in 0..n {
            if frame.is_fixed(v) {
                continue;
            }
            let mut disp = Vector::zeros();
            for u in 0..n {
                if u == v {
                    continue;
                }
                let delta = pos[v] - pos[u];
                let len = delta.norm();
                if len == 0.0 {
                    continue;
                }
                let d = len.max(min_d);
                disp += delta / len * (self.repulsion_constant / d);
            }
            self.displacement[v] = disp;
        }

        for e in frame.edges() {
            let delta = pos[e.source] - pos[e.target];
            let len = delta.norm();
            if len == 0.0 || e.weight == 0.0 {
                continue;
            }
            let d = len.max(min_d);
            let pull = delta / len * (d * d / self.attraction_constant) * e.weight;
            self.displacement[e.source] -= pull;
            self.displacement[e.target] += pull;
        }

        let bbox = frame.bounding_box();
        for v in 0..n {
            if frame.is_fixed(v) {
                continue;
            }
            let disp = self.displacement[v];
            let len = disp.norm();
            if len == 0.0 {
                continue;
            }
            let mut next = pos[v] + disp / len * len.min(self.temperature);
            if params.keep_in_bounds {
                next = bbox.clamp(next);
            }
            out[v] = next;
        }

        self.temperature = match params.cooling {
            Cooling::Linear => {
                let max = params.max_iterations as f64;
                self.temperature * (1.0 - iteration as f64 / max).max(0.0)
            }
            Cooling::Exponential { lambda } => self.temperature * lambda,
        };
        Ok(ModelStep::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::item::{Link, Vertex};
    use crate::rng::XorShift64Star;
    use narwhal_graphlib::Graph;

    #[test]
    fn ideal_length_follows_area() {
        let mut g: Graph<Vertex, Link> = Graph::new();
        for id in ["a", "b", "c", "d"] {
            g.add_node(id, Vertex::default());
        }
        let params = FruchtermanReingoldParameters {
            common: CommonParameters {
                bounding_box: Rect::new(0.0, 0.0, 400.0, 100.0),
                ..CommonParameters::default()
            },
            ..FruchtermanReingoldParameters::default()
        };
        let frame = Frame::from_graph(&g, params.common.bounding_box);
        let mut model = FruchtermanReingold::default();
        model.prepare(&frame, &params).unwrap();
        assert_eq!(model.ideal_edge_length(), 100.0);
        model.restart(&frame, &params);
        assert_eq!(model.temperature(), 10.0);
    }

    #[test]
    fn displacement_is_capped_by_temperature() {
        let mut g: Graph<Vertex, Link> = Graph::new();
        g.add_node("a", Vertex::at(500.0, 500.0));
        g.add_node("b", Vertex::at(500.5, 500.0));
        let params = FruchtermanReingoldParameters {
            initial_temperature: Some(3.0),
            ..FruchtermanReingoldParameters::default()
        };
        let frame = Frame::from_graph(&g, params.common.bounding_box);
        let mut model = FruchtermanReingold::default();
        model.prepare(&frame, &params).unwrap();
        model.restart(&frame, &params);
        let mut out = frame.positions().to_vec();
        let mut rng = XorShift64Star::new(1);
        let ctx = IterationContext {
            frame: &frame,
            params: &params,
            iteration: 0,
            rng: &mut rng,
        };
        assert_eq!(model.iterate(ctx, &mut out).unwrap(), ModelStep::Continue);
        assert!(((out[0] - frame.position(0)).norm() - 3.0).abs() < 1e-9);
        assert!(((out[1] - frame.position(1)).norm() - 3.0).abs() < 1e-9);
        assert!(out[0].x < 500.0 && out[1].x > 500.5);
    }

    #[test]
    fn exponential_cooling_needs_lambda_below_one() {
        let bad = FruchtermanReingoldParameters {
            cooling: Cooling::Exponential { lambda: 1.0 },
            ..FruchtermanReingoldParameters::default()
        };
        assert!(bad.validate().is_err());
        let ok = FruchtermanReingoldParameters {
            cooling: Cooling::Exponential { lambda: 0.95 },
            ..FruchtermanReingoldParameters::default()
        };
        assert!(ok.validate().is_ok());
    }
}
