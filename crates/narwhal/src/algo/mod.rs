pub mod fruchterman_reingold;
pub mod isom;
pub mod kamada_kawai;
pub mod linlog;

use crate::error::Result;
use crate::frame::Frame;
use crate::geometry::Vector;
use crate::params::LayoutParameters;
use crate::rng::XorShift64Star;

/// Squared displacement below which a node counts as not moved.
pub(crate) const MOVE_EPSILON: f64 = 1e-6;

/// Inputs of one iteration of a [`ForceModel`].
pub struct IterationContext<'a, P> {
    pub frame: &'a Frame,
    pub params: &'a P,
    /// Zero-based iteration number within the current run.
    pub iteration: usize,
    pub rng: &'a mut XorShift64Star,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStep {
    Continue,
    /// The model has nothing left to improve; the run finishes after this iteration.
    Converged,
}

/// A force or energy model driven by [`ForceDirected`](crate::ForceDirected).
pub trait ForceModel: Default + Send {
    type Parameters: LayoutParameters;

    const NAME: &'static str;

    /// Recomputes constants derived from the topology and the parameters. Called before an
    /// iteration whenever either changed.
    fn prepare(&mut self, frame: &Frame, params: &Self::Parameters) -> Result<()>;

    /// Resets per-run state (temperatures, radii, exponents) at the start of a run or after
    /// an external reset.
    fn restart(&mut self, frame: &Frame, params: &Self::Parameters);

    /// Writes the next position of every slot into `out`, which starts as a copy of the
    /// current positions. Pinned slots are restored by the driver afterwards.
    fn iterate(
        &mut self,
        ctx: IterationContext<'_, Self::Parameters>,
        out: &mut [Vector],
    ) -> Result<ModelStep>;
}
