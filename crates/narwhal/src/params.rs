//! Layout parameter objects.
//!
//! Each engine has a plain parameter struct embedding [`CommonParameters`]. Parameters are
//! installed into a [`Parameters`] cell; every accepted change bumps the cell's revision, which
//! the driver compares against its cached value to decide when derived constants are stale.

use crate::error::{Error, Result};
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommonParameters {
    /// Area the layout is computed for.
    pub bounding_box: Rect,
    /// Seed of the deterministic random source used by randomized engines.
    pub seed: u64,
    /// Nudge nodes sharing a position apart when the layout (re)starts.
    pub jitter_coincident: bool,
}

impl Default for CommonParameters {
    fn default() -> Self {
        Self {
            bounding_box: Rect::default(),
            seed: 0x5EED,
            jitter_coincident: true,
        }
    }
}

impl CommonParameters {
    pub fn validate(&self) -> Result<()> {
        let b = &self.bounding_box;
        for (name, v) in [("boundingBox.x", b.x), ("boundingBox.y", b.y)] {
            ensure_finite(name, v)?;
        }
        ensure_positive("boundingBox.width", b.width)?;
        ensure_positive("boundingBox.height", b.height)
    }
}

/// Checks an engine's iteration cap.
pub(crate) fn ensure_iterations(max_iterations: usize) -> Result<()> {
    if max_iterations == 0 {
        Err(invalid("maxIterations", "must be at least 1"))
    } else {
        Ok(())
    }
}

/// Behavior shared by every engine's parameter struct.
pub trait LayoutParameters: Clone + Debug + Send + 'static {
    fn common(&self) -> &CommonParameters;

    fn common_mut(&mut self) -> &mut CommonParameters;

    /// Hard cap on iterations per `compute()` or stepping session.
    fn max_iterations(&self) -> usize;

    /// Argument checking run whenever the parameters are installed or changed.
    fn validate(&self) -> Result<()>;

    /// Installs a layout root. Returns `false` for engines without a notion of root.
    fn set_root(&mut self, root: Option<String>) -> bool {
        let _ = root;
        false
    }
}

/// Validated parameter cell with a change revision.
#[derive(Debug, Clone)]
pub struct Parameters<P> {
    value: P,
    revision: u64,
}

impl<P: LayoutParameters> Parameters<P> {
    pub fn new(value: P) -> Result<Self> {
        value.validate()?;
        Ok(Self { value, revision: 0 })
    }

    pub fn get(&self) -> &P {
        &self.value
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Applies `f` to a copy and commits it only if the result validates.
    pub fn update<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut P),
    {
        let mut next = self.value.clone();
        f(&mut next);
        self.replace(next)
    }

    pub fn replace(&mut self, value: P) -> Result<()> {
        value.validate()?;
        self.value = value;
        self.revision = self.revision.wrapping_add(1);
        Ok(())
    }
}

pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

pub(crate) fn ensure_finite(name: &'static str, v: f64) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, format!("must be finite, got {v}")))
    }
}

pub(crate) fn ensure_positive(name: &'static str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be a positive number, got {v}")))
    }
}

pub(crate) fn ensure_non_negative(name: &'static str, v: f64) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be a non-negative number, got {v}")))
    }
}

pub(crate) fn ensure_in_range(name: &'static str, v: f64, lo: f64, hi: f64) -> Result<()> {
    if v.is_finite() && v >= lo && v <= hi {
        Ok(())
    } else {
        Err(invalid(name, format!("must lie in [{lo}, {hi}], got {v}")))
    }
}
