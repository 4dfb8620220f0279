#![forbid(unsafe_code)]

//! Force-directed layout engines over [`narwhal_graphlib::Graph`].
//!
//! A layout is a [`ForceDirected`] driver parameterized by a [`ForceModel`]. The driver owns the
//! graph, runs the shared iteration lifecycle (dirty tracking, resets, convergence detection,
//! blocking or stepped execution) and commits positions back into the node labels. The models
//! only turn a [`Frame`] of current positions into new positions.
//!
//! ```no_run
//! use narwhal::{FruchtermanReingoldLayout, FruchtermanReingoldParameters, Link, Vertex};
//! use narwhal_graphlib::Graph;
//!
//! let mut g: Graph<Vertex, Link> = Graph::new();
//! g.add_node("a", Vertex::at(100.0, 100.0));
//! g.add_node("b", Vertex::at(400.0, 300.0));
//! g.add_edge("a", "b", Link::default(), false);
//!
//! let mut layout = FruchtermanReingoldLayout::new(g, FruchtermanReingoldParameters::default())?;
//! layout.compute()?;
//! for (id, p) in layout.positions() {
//!     println!("{id}: {} {}", p.x, p.y);
//! }
//! # Ok::<(), narwhal::Error>(())
//! ```

pub mod algo;
pub mod driver;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod item;
pub mod lifecycle;
pub mod params;
pub mod rng;

pub use algo::fruchterman_reingold::{Cooling, FruchtermanReingold, FruchtermanReingoldParameters};
pub use algo::isom::{Isom, IsomParameters};
pub use algo::kamada_kawai::{KamadaKawai, KamadaKawaiParameters};
pub use algo::linlog::{LinLog, LinLogParameters};
pub use algo::{ForceModel, IterationContext, ModelStep};
pub use driver::{ForceDirected, IterationReport};
pub use error::{Error, Result};
pub use frame::Frame;
pub use geometry::{Rect, Vector};
pub use item::{LayoutEdge, LayoutNode, Link, Vertex};
pub use lifecycle::{ComputeState, ControlHandle};
pub use params::{CommonParameters, LayoutParameters, Parameters};

pub type FruchtermanReingoldLayout<N = Vertex, E = Link> = ForceDirected<FruchtermanReingold, N, E>;
pub type KamadaKawaiLayout<N = Vertex, E = Link> = ForceDirected<KamadaKawai, N, E>;
pub type IsomLayout<N = Vertex, E = Link> = ForceDirected<Isom, N, E>;
pub type LinLogLayout<N = Vertex, E = Link> = ForceDirected<LinLog, N, E>;
