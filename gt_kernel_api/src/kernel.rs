use crate::graph::{GraphTile, Vertex};
use crate::ids::IterCount;
use std::fmt::Display;
use std::str::FromStr;

/// An update that can be merged with another. The combine operation must be
/// associative and commutative: mirrors fold many local contributions into
/// one message, and the gather phase observes messages from different tiles
/// in no defined order.
pub trait UpdateCombine: Send + 'static {
    /// The neutral element of [`combine`](Self::combine).
    fn identity() -> Self;

    fn combine(&mut self, other: Self);
}

/// Edge weights: plain copyable scalars that can be parsed from an edge-list
/// file and printed in diagnostics.
pub trait EdgeWeight: Copy + Display + FromStr + Send + Sync + 'static {}

impl<T: Copy + Display + FromStr + Send + Sync + 'static> EdgeWeight for T {}

/// Types and hooks shared by both kernel variants.
///
/// Hook default implementations do nothing; the output hook returns `None`,
/// meaning the kernel produces no per-vertex output file.
pub trait KernelBase: Send + Sync {
    type VertexData: Send + 'static;
    type Update: UpdateCombine;
    type Weight: EdgeWeight;

    /// Called on each tile once before the first iteration.
    fn on_start(&self, _tile: &mut GraphTile<Self::VertexData, Self::Update, Self::Weight>) {}

    /// Called on each tile after each iteration, before the convergence
    /// barrier.
    fn on_iteration_end(
        &self,
        _tile: &mut GraphTile<Self::VertexData, Self::Update, Self::Weight>,
        _iter: IterCount,
    ) {
    }

    /// Called on each tile once after the last iteration.
    fn on_end(&self, _tile: &mut GraphTile<Self::VertexData, Self::Update, Self::Weight>) {}

    /// The kernel-specific part of a `<vid>\t<string>` output line.
    fn output_line(&self, _vertex: &Vertex<Self::VertexData>) -> Option<String> {
        None
    }
}

/// The edge-centric contract: one scatter per edge, one gather per received
/// update.
pub trait EdgeCentricKernel: KernelBase {
    /// Produces the update this edge contributes in this iteration, or
    /// `None` if it contributes nothing. Must not mutate vertex state.
    fn scatter(
        &self,
        iter: IterCount,
        src: &Vertex<Self::VertexData>,
        weight: &mut Self::Weight,
    ) -> Option<Self::Update>;

    /// Folds `update` into the destination vertex. Returns whether the
    /// destination is converged in this iteration; the per-tile verdict is
    /// the AND over all gathers.
    fn gather(
        &self,
        iter: IterCount,
        dst: &mut Vertex<Self::VertexData>,
        update: Self::Update,
    ) -> bool;
}

/// The vertex-centric contract: gather along each in-edge of an active
/// source, apply the accumulated update, scatter to decide re-activation.
pub trait VertexCentricKernel: KernelBase {
    /// Produces the update flowing along one edge out of an active source.
    fn gather(
        &self,
        iter: IterCount,
        src: &Vertex<Self::VertexData>,
        weight: &mut Self::Weight,
    ) -> Self::Update;

    /// Folds the accumulated update of this iteration into the vertex.
    fn apply(
        &self,
        iter: IterCount,
        vertex: &mut Vertex<Self::VertexData>,
        acc_update: Self::Update,
    );

    /// Returns whether the vertex should be active in the next iteration.
    fn scatter(&self, iter: IterCount, vertex: &Vertex<Self::VertexData>) -> bool;
}
