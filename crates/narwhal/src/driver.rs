//! Iteration driver shared by every force model.
//!
//! [`ForceDirected`] owns the graph and runs the lifecycle around a [`ForceModel`]:
//!
//! 1. refresh the [`Frame`] (rebuilt when the graph versions moved),
//! 2. recompute model constants when topology, counts or the parameter revision changed,
//! 3. restart the model if a reset is pending,
//! 4. let the model compute new positions into a scratch buffer,
//! 5. restore pinned nodes, measure displacement and commit positions into the node labels.
//!
//! Blocking [`ForceDirected::compute`] loops until the iteration cap, an abort, the model
//! reporting convergence, the iteration callback declining, or an iteration in which nothing
//! moved. [`ForceDirected::step`] runs the same loop one iteration per call.

use crate::algo::{ForceModel, IterationContext, MOVE_EPSILON, ModelStep};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::geometry::{Rect, Vector};
use crate::item::{LayoutEdge, LayoutNode};
use crate::lifecycle::{ComputeState, ControlHandle};
use crate::params::{LayoutParameters, Parameters};
use crate::rng::XorShift64Star;
use indexmap::IndexMap;
use narwhal_graphlib::Graph;
use rustc_hash::FxHashSet;

/// Metrics of one completed iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Completed iterations in the current run, starting at 1.
    pub iteration: usize,
    pub max_iterations: usize,
    pub status_percent: f64,
    /// Sum of squared node displacements.
    pub total_displacement: f64,
    /// Bounding-box diagonal squared times node count.
    pub max_displacement: f64,
    pub item_moved: bool,
}

impl IterationReport {
    /// Total displacement relative to its theoretical maximum.
    pub fn relative_change(&self) -> f64 {
        if self.max_displacement > 0.0 {
            self.total_displacement / self.max_displacement
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Execution {
    Blocking,
    Stepped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    versions: (u64, u64),
    nodes: usize,
    edges: usize,
    revision: u64,
}

type IterationCallback = Box<dyn FnMut(&IterationReport) -> bool + Send>;

pub struct ForceDirected<M: ForceModel, N, E> {
    graph: Graph<N, E>,
    params: Parameters<M::Parameters>,
    model: M,
    control: ControlHandle,
    frame: Frame,
    scratch: Vec<Vector>,
    rng: XorShift64Star,
    prepared: Option<CacheKey>,
    resetting: bool,
    item_moved: bool,
    iteration: usize,
    stepping: bool,
    last_report: Option<IterationReport>,
    on_iteration: Option<IterationCallback>,
}

impl<M, N, E> ForceDirected<M, N, E>
where
    M: ForceModel,
    M::Parameters: Default,
    N: LayoutNode,
    E: LayoutEdge,
{
    /// Layout with default parameters over `bounding_box`.
    pub fn with_bounding_box(graph: Graph<N, E>, bounding_box: Rect) -> Result<Self> {
        let mut params = M::Parameters::default();
        params.common_mut().bounding_box = bounding_box;
        Self::new(graph, params)
    }
}

impl<M, N, E> ForceDirected<M, N, E>
where
    M: ForceModel,
    N: LayoutNode,
    E: LayoutEdge,
{
    pub fn new(graph: Graph<N, E>, params: M::Parameters) -> Result<Self> {
        let params = Parameters::new(params)?;
        let common = params.get().common();
        let frame = Frame::from_graph(&graph, common.bounding_box);
        let rng = XorShift64Star::new(common.seed);
        Ok(Self {
            graph,
            params,
            model: M::default(),
            control: ControlHandle::new(),
            frame,
            scratch: Vec::new(),
            rng,
            prepared: None,
            resetting: true,
            item_moved: false,
            iteration: 0,
            stepping: false,
            last_report: None,
            on_iteration: None,
        })
    }

    pub fn graph(&self) -> &Graph<N, E> {
        &self.graph
    }

    /// Mutable access to the graph between runs or steps. Topology changes are picked up by
    /// the next iteration; call [`Self::reset`] after moving nodes by hand.
    pub fn graph_mut(&mut self) -> &mut Graph<N, E> {
        &mut self.graph
    }

    pub fn into_graph(self) -> Graph<N, E> {
        self.graph
    }

    pub fn params(&self) -> &M::Parameters {
        self.params.get()
    }

    pub fn set_params(&mut self, params: M::Parameters) -> Result<()> {
        self.params.replace(params)
    }

    pub fn update_params<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut M::Parameters),
    {
        self.params.update(f)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    pub fn state(&self) -> ComputeState {
        self.control.state()
    }

    pub fn abort(&self) -> Result<bool> {
        self.control.abort()
    }

    /// Iterations completed in the current (or last) run.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Whether the last iteration moved any node beyond a negligible distance.
    pub fn item_moved(&self) -> bool {
        self.item_moved
    }

    pub fn last_report(&self) -> Option<&IterationReport> {
        self.last_report.as_ref()
    }

    /// Forces the model to re-initialize before the next iteration.
    pub fn reset(&mut self) {
        self.resetting = true;
    }

    /// Registers a callback run after every iteration. Returning `false` ends the run.
    pub fn on_iteration<F>(&mut self, f: F)
    where
        F: FnMut(&IterationReport) -> bool + Send + 'static,
    {
        self.on_iteration = Some(Box::new(f));
    }

    pub fn clear_iteration_callback(&mut self) {
        self.on_iteration = None;
    }

    /// Committed positions of the visible nodes, in graph index order.
    pub fn positions(&self) -> IndexMap<String, Vector> {
        self.graph
            .nodes()
            .filter(|(ix, _, _)| self.graph.is_node_visible(*ix))
            .map(|(_, id, label)| (id.to_string(), label.position()))
            .collect()
    }

    /// Runs the layout to completion on the calling thread.
    pub fn compute(&mut self) -> Result<ComputeState> {
        self.settle_stepping()?;
        self.control.begin("compute")?;
        self.start_run();
        tracing::debug!(
            algorithm = M::NAME,
            nodes = self.graph.visible_node_count(),
            edges = self.graph.visible_edge_count(),
            "layout started"
        );
        let result = self.run(Execution::Blocking);
        self.conclude(result)
    }

    /// Installs `root` as the layout root and computes.
    pub fn compute_rooted(&mut self, root: &str) -> Result<ComputeState> {
        if !self.graph.has_node(root) {
            return Err(Error::NodeNotFound {
                id: root.to_string(),
            });
        }
        let mut next = self.params.get().clone();
        if !next.set_root(Some(root.to_string())) {
            return Err(Error::RootNotSupported {
                algorithm: M::NAME,
            });
        }
        self.params.replace(next)?;
        self.compute()
    }

    /// Runs a single iteration.
    ///
    /// The first call starts a stepping session (state `Running`); later calls continue it.
    /// Returns `false` once the session ended, after which the state is `Finished` or
    /// `Aborted` and the next call starts a new session. `force_restart` restarts the current
    /// session from iteration zero.
    pub fn step(&mut self, force_restart: bool) -> Result<bool> {
        if self.stepping {
            if self.control.is_abort_requested() {
                self.conclude(Ok(false))?;
                return Ok(false);
            }
            if force_restart {
                self.start_run();
            }
        } else {
            self.control.begin("step")?;
            self.stepping = true;
            self.start_run();
        }
        let result = self.run(Execution::Stepped);
        let more = matches!(result, Ok(true));
        self.conclude(result)?;
        Ok(more)
    }

    fn settle_stepping(&mut self) -> Result<()> {
        if self.stepping && self.control.is_abort_requested() {
            self.conclude(Ok(false))?;
        }
        Ok(())
    }

    fn start_run(&mut self) {
        self.iteration = 0;
        self.item_moved = false;
        self.last_report = None;
        self.rng = XorShift64Star::new(self.params.get().common().seed);
        self.resetting = true;
    }

    fn run(&mut self, execution: Execution) -> Result<bool> {
        loop {
            if self.control.is_abort_requested() {
                return Ok(false);
            }
            if !self.iterate_once()? {
                return Ok(false);
            }
            if execution == Execution::Stepped {
                return Ok(true);
            }
        }
    }

    fn conclude(&mut self, result: Result<bool>) -> Result<ComputeState> {
        match result {
            Ok(true) => {
                self.update_edges();
                Ok(self.control.state())
            }
            Ok(false) => {
                self.stepping = false;
                self.update_edges();
                let state = self.control.finish();
                tracing::debug!(
                    algorithm = M::NAME,
                    iterations = self.iteration,
                    state = ?state,
                    "layout ended"
                );
                Ok(state)
            }
            Err(err) => {
                self.stepping = false;
                self.control.fail();
                tracing::debug!(algorithm = M::NAME, error = %err, "layout failed");
                Err(err)
            }
        }
    }

    /// One iteration. Returns whether the run should continue.
    fn iterate_once(&mut self) -> Result<bool> {
        let common = self.params.get().common().clone();
        let max_iterations = self.params.get().max_iterations();
        if self.frame.is_current(&self.graph) {
            self.frame.refresh(&self.graph, common.bounding_box);
        } else {
            self.frame = Frame::from_graph(&self.graph, common.bounding_box);
        }

        let key = CacheKey {
            versions: (self.graph.node_version(), self.graph.edge_version()),
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            revision: self.params.revision(),
        };
        if self.prepared != Some(key) {
            tracing::debug!(
                algorithm = M::NAME,
                nodes = self.frame.len(),
                edges = self.frame.edges().len(),
                "recomputing layout constants"
            );
            self.model.prepare(&self.frame, self.params.get())?;
            self.prepared = Some(key);
        }

        if self.resetting {
            if common.jitter_coincident {
                self.separate_coincident()?;
            }
            self.model.restart(&self.frame, self.params.get());
            self.resetting = false;
        }

        let n = self.frame.len();
        let step = if n == 0 {
            ModelStep::Converged
        } else {
            self.scratch.clear();
            self.scratch.extend_from_slice(self.frame.positions());
            let ctx = IterationContext {
                frame: &self.frame,
                params: self.params.get(),
                iteration: self.iteration,
                rng: &mut self.rng,
            };
            self.model.iterate(ctx, &mut self.scratch)?
        };

        let mut total = 0.0;
        let mut moved = false;
        for slot in 0..n {
            let old = self.frame.position(slot);
            let p = &mut self.scratch[slot];
            if self.frame.is_fixed(slot) || !(p.x.is_finite() && p.y.is_finite()) {
                *p = old;
                continue;
            }
            let d2 = (*p - old).norm_squared();
            total += d2;
            moved |= d2 > MOVE_EPSILON;
        }
        if n > 0 {
            self.commit()?;
        }

        self.iteration += 1;
        self.item_moved = moved;
        let report = IterationReport {
            iteration: self.iteration,
            max_iterations,
            status_percent: (self.iteration as f64 * 100.0 / max_iterations as f64)
                .min(100.0),
            total_displacement: total,
            max_displacement: common.bounding_box.diagonal_squared() * n as f64,
            item_moved: moved,
        };
        tracing::trace!(
            algorithm = M::NAME,
            iteration = report.iteration,
            total_displacement = report.total_displacement,
            relative_change = report.relative_change(),
            item_moved = moved,
            "iteration ended"
        );
        self.last_report = Some(report);

        let keep_going = match self.on_iteration.as_mut() {
            Some(callback) => callback(&report),
            None => true,
        };
        Ok(keep_going
            && moved
            && step == ModelStep::Continue
            && self.iteration < max_iterations)
    }

    fn commit(&mut self) -> Result<()> {
        self.frame.swap_positions(&mut self.scratch);
        for slot in 0..self.frame.len() {
            let node = self.graph.node_at_mut(self.frame.graph_index(slot))?;
            node.set_position(self.frame.position(slot));
            node.update();
        }
        Ok(())
    }

    /// Nudges unpinned nodes that share a position with another node.
    fn separate_coincident(&mut self) -> Result<()> {
        fn bits(p: Vector) -> (u64, u64) {
            // `+ 0.0` folds negative zero into positive zero.
            ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
        }

        let n = self.frame.len();
        let bbox = *self.frame.bounding_box();
        let spread = (bbox.diagonal_squared().sqrt() * 1e-3).max(1e-3);
        let mut seen: FxHashSet<(u64, u64)> = FxHashSet::default();
        for slot in (0..n).filter(|&s| self.frame.is_fixed(s)) {
            seen.insert(bits(self.frame.position(slot)));
        }

        let mut nudged = 0usize;
        for slot in 0..n {
            if self.frame.is_fixed(slot) {
                continue;
            }
            let p = self.frame.position(slot);
            if seen.insert(bits(p)) {
                continue;
            }
            let q = loop {
                let offset =
                    Vector::new(self.rng.next_f64_signed(), self.rng.next_f64_signed()) * spread;
                let q = p + offset;
                if seen.insert(bits(q)) {
                    break q;
                }
            };
            self.frame.positions_mut()[slot] = q;
            self.graph
                .node_at_mut(self.frame.graph_index(slot))?
                .set_position(q);
            nudged += 1;
        }
        if nudged > 0 {
            tracing::debug!(nudged, "separated coincident nodes");
        }
        Ok(())
    }

    fn update_edges(&mut self) {
        for ix in 0..self.graph.edge_count() {
            if !self.graph.is_edge_visible(ix) {
                continue;
            }
            if let Ok(e) = self.graph.edge_at_mut(ix) {
                e.update();
            }
        }
    }
}
