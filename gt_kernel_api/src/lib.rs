//! The Graphtide kernel API: everything an algorithm kernel needs without
//! pulling in the engine machinery.
//!
//! A graph is partitioned into [`GraphTile`]s, each owned by exactly one
//! worker for the duration of a run. Cross-tile edges never reach into
//! another tile's memory: the source tile keeps a [`MirrorVertex`] for each
//! remote destination and coalesces outbound updates into it before a single
//! bulk send.
//!
//! Kernels implement either the edge-centric contract
//! ([`EdgeCentricKernel`]: scatter per edge, gather per update) or the
//! vertex-centric contract ([`VertexCentricKernel`]: gather per edge, apply
//! per accumulated update, scatter to activate).

mod error;
mod graph;
mod ids;
mod kernel;

// Public exports from root of the crate.
pub use error::GraphError;
pub use graph::{propagate_mirror_degrees, Edge, GraphTile, MirrorVertex, ScatterView, Vertex};
pub use ids::{
    DegreeCount, EdgeId, IterCount, TileId, VertexId, INF_ITER_COUNT, INVALID_VERTEX_ID,
};
pub use kernel::{EdgeCentricKernel, EdgeWeight, KernelBase, UpdateCombine, VertexCentricKernel};
