//! Inverted self-organizing map (ISOM) layout.
//!
//! Each iteration picks a stimulus point, finds the winning node and pulls it and its
//! graph neighborhood towards the point. The pull halves with every hop and stops at the
//! current radius. The radius shrinks every `radius_constant_time` iterations and the
//! adaptation rate decays exponentially.
//!
//! With a barycenter node configured (and still present with outgoing edges), that node is
//! always the winner and the stimulus is the center of the bounding box.

use super::{ForceModel, IterationContext, ModelStep};
use crate::error::Result;
use crate::frame::Frame;
use crate::geometry::Vector;
use crate::params::{
    CommonParameters, LayoutParameters, ensure_in_range, ensure_iterations, ensure_positive,
    invalid,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IsomParameters {
    #[serde(flatten)]
    pub common: CommonParameters,
    pub max_iterations: usize,
    /// Iterations between two radius decrements.
    pub radius_constant_time: usize,
    pub initial_radius: usize,
    pub min_radius: usize,
    pub initial_adaptation: f64,
    pub min_adaptation: f64,
    pub cooling_factor: f64,
    /// Id of a node that always wins and is pulled towards the center.
    pub barycenter: Option<String>,
}

impl Default for IsomParameters {
    fn default() -> Self {
        Self {
            common: CommonParameters::default(),
            max_iterations: 2000,
            radius_constant_time: 100,
            initial_radius: 5,
            min_radius: 1,
            initial_adaptation: 0.9,
            min_adaptation: 0.0,
            cooling_factor: 2.0,
            barycenter: None,
        }
    }
}

impl LayoutParameters for IsomParameters {
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
        if self.radius_constant_time == 0 {
            return Err(invalid("radiusConstantTime", "must be at least 1"));
        }
        if self.min_radius > self.initial_radius {
            return Err(invalid(
                "minRadius",
                format!(
                    "must not exceed initialRadius ({} > {})",
                    self.min_radius, self.initial_radius
                ),
            ));
        }
        ensure_in_range("initialAdaptation", self.initial_adaptation, 0.0, 1.0)?;
        ensure_in_range("minAdaptation", self.min_adaptation, 0.0, self.initial_adaptation)?;
        ensure_positive("coolingFactor", self.cooling_factor)?;
        Ok(())
    }

    fn set_root(&mut self, root: Option<String>) -> bool {
        self.barycenter = root;
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct Isom {
    radius: usize,
    adaptation: f64,
    hops: Vec<Option<usize>>,
    queue: VecDeque<usize>,
}

impl Isom {
    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn adaptation(&self) -> f64 {
        self.adaptation
    }

    /// Barycenter slot if the configured node is present and has outgoing edges.
    fn barycenter(frame: &Frame, params: &IsomParameters) -> Option<usize> {
        let id = params.barycenter.as_deref()?;
        frame.slot_of(id).filter(|&s| frame.out_degree(s) > 0)
    }

    fn nearest(positions: &[Vector], target: Vector) -> Option<usize> {
        positions
            .iter()
            .enumerate()
            .map(|(slot, p)| (slot, (p - target).norm_squared()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(slot, _)| slot)
    }

    /// Pulls `winner` and every node within `radius` hops towards `target`.
    fn adjust(&mut self, frame: &Frame, out: &mut [Vector], winner: usize, target: Vector) {
        self.hops.clear();
        self.hops.resize(frame.len(), None);
        self.queue.clear();
        self.hops[winner] = Some(0);
        self.queue.push_back(winner);
        while let Some(v) = self.queue.pop_front() {
            let Some(d) = self.hops[v] else {
                continue;
            };
            let factor = self.adaptation / f64::powi(2.0, d as i32);
            out[v] += (target - out[v]) * factor;
            if d < self.radius {
                for &(w, _) in frame.adjacency(v) {
                    if self.hops[w].is_none() {
                        self.hops[w] = Some(d + 1);
                        self.queue.push_back(w);
                    }
                }
            }
        }
    }
}

impl ForceModel for Isom {
    type Parameters = IsomParameters;

    const NAME: &'static str = "isom";

    fn prepare(&mut self, frame: &Frame, _params: &Self::Parameters) -> Result<()> {
        self.hops = vec![None; frame.len()];
        Ok(())
    }

    fn restart(&mut self, _frame: &Frame, params: &Self::Parameters) {
        self.radius = params.initial_radius;
        self.adaptation = params.initial_adaptation;
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
            rng,
        } = ctx;
        let bbox = frame.bounding_box();

        let (winner, target) = match Self::barycenter(frame, params) {
            Some(slot) => (Some(slot), bbox.center()),
            None => {
                let target = rng.point_in(bbox);
                (Self::nearest(out, target), target)
            }
        };
        if let Some(winner) = winner {
            self.adjust(frame, out, winner, target);
        }

        let epoch = iteration + 1;
        let max = params.max_iterations as f64;
        let decay = (-params.cooling_factor * epoch as f64 / max).exp();
        self.adaptation = (decay * params.initial_adaptation).max(params.min_adaptation);
        if self.radius > params.min_radius && epoch % params.radius_constant_time == 0 {
            self.radius -= 1;
        }
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
    fn pull_halves_per_hop_and_stops_at_radius() {
        let mut g: Graph<Vertex, Link> = Graph::new();
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            g.add_node(*id, Vertex::at(i as f64 * 100.0, 0.0));
        }
        g.add_edge("a", "b", Link::default(), false);
        g.add_edge("b", "c", Link::default(), false);
        g.add_edge("c", "d", Link::default(), false);
        let frame = Frame::from_graph(&g, Rect::default());

        let mut model = Isom {
            radius: 2,
            adaptation: 0.5,
            ..Isom::default()
        };
        let mut out = frame.positions().to_vec();
        let target = Vector::new(0.0, 400.0);
        model.adjust(&frame, &mut out, 0, target);

        assert_eq!(out[0], Vector::new(0.0, 200.0));
        assert_eq!(out[1], Vector::new(75.0, 100.0));
        assert_eq!(out[2], Vector::new(175.0, 50.0));
        assert_eq!(out[3], frame.position(3));
    }

    #[test]
    fn barycenter_needs_outgoing_edges() {
        let mut g: Graph<Vertex, Link> = Graph::new();
        g.add_edge("hub", "leaf", Link::default(), false);
        let frame = Frame::from_graph(&g, Rect::default());
        let mut params = IsomParameters::default();
        assert!(params.set_root(Some("leaf".into())));
        assert_eq!(Isom::barycenter(&frame, &params), None);
        params.barycenter = Some("hub".into());
        assert_eq!(Isom::barycenter(&frame, &params), frame.slot_of("hub"));
        params.barycenter = Some("gone".into());
        assert_eq!(Isom::barycenter(&frame, &params), None);
    }

    #[test]
    fn schedule_decays() {
        let mut g: Graph<Vertex, Link> = Graph::new();
        g.add_edge("a", "b", Link::default(), false);
        let frame = Frame::from_graph(&g, Rect::default());
        let params = IsomParameters {
            max_iterations: 10,
            radius_constant_time: 2,
            initial_radius: 3,
            min_radius: 1,
            ..IsomParameters::default()
        };
        let mut model = Isom::default();
        model.prepare(&frame, &params).unwrap();
        model.restart(&frame, &params);
        let mut rng = XorShift64Star::new(3);
        let mut out = frame.positions().to_vec();
        for iteration in 0..6 {
            let ctx = IterationContext {
                frame: &frame,
                params: &params,
                iteration,
                rng: &mut rng,
            };
            model.iterate(ctx, &mut out).unwrap();
        }
        assert_eq!(model.radius(), 1);
        let expected = (-2.0_f64 * 6.0 / 10.0).exp() * 0.9;
        assert!((model.adaptation() - expected).abs() < 1e-12);
    }
}
