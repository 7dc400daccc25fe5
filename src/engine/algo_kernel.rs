use crate::comm::CommSync;
use crate::engine::{edge_centric, vertex_centric};
use gt_kernel_api::{
    EdgeCentricKernel, EdgeWeight, GraphTile, IterCount, UpdateCombine, Vertex, VertexCentricKernel,
    VertexId, INF_ITER_COUNT,
};
use log::{debug, info};

pub type BoxedEdgeCentric<D, U, W> =
    Box<dyn EdgeCentricKernel<VertexData = D, Update = U, Weight = W>>;
pub type BoxedVertexCentric<D, U, W> =
    Box<dyn VertexCentricKernel<VertexData = D, Update = U, Weight = W>>;

/// The two kernel capability sets, dispatched on by the per-iteration
/// drivers.
pub enum KernelKind<D, U, W> {
    EdgeCentric(BoxedEdgeCentric<D, U, W>),
    VertexCentric(BoxedVertexCentric<D, U, W>),
}

/// Per-tile driver state living across the iterations of one kernel run.
enum RunState {
    EdgeCentric,
    VertexCentric(vertex_centric::ActivationState),
}

/// An algorithm kernel with its run configuration. One [`run`](Self::run)
/// call executes the kernel to convergence (or the iteration cap) on one
/// tile, in lockstep with every other worker.
pub struct AlgoKernel<D, U, W> {
    name: String,
    verbose: bool,
    max_iters: IterCount,
    num_parts: usize,
    kind: KernelKind<D, U, W>,
}

impl<D, U, W> AlgoKernel<D, U, W>
where
    D: Send + 'static,
    U: UpdateCombine,
    W: EdgeWeight,
{
    pub fn edge_centric(name: impl Into<String>, kernel: BoxedEdgeCentric<D, U, W>) -> Self {
        Self::with_kind(name, KernelKind::EdgeCentric(kernel))
    }

    pub fn vertex_centric(name: impl Into<String>, kernel: BoxedVertexCentric<D, U, W>) -> Self {
        Self::with_kind(name, KernelKind::VertexCentric(kernel))
    }

    fn with_kind(name: impl Into<String>, kind: KernelKind<D, U, W>) -> Self {
        Self { name: name.into(), verbose: false, max_iters: INF_ITER_COUNT, num_parts: 1, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &'static str {
        match self.kind {
            KernelKind::EdgeCentric(_) => "edge-centric",
            KernelKind::VertexCentric(_) => "vertex-centric",
        }
    }

    /// If the primary tile's worker prints progress.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Maximum gather-scatter iterations to run.
    pub fn set_max_iters(&mut self, max_iters: IterCount) {
        self.max_iters = max_iters;
    }

    /// Number of gather-side subpartitions per tile.
    pub fn set_num_parts(&mut self, num_parts: usize) {
        self.num_parts = num_parts.max(1);
    }

    /// Runs the kernel on one tile. Returns the number of iterations
    /// executed; every worker returns the same number, because leaving the
    /// loop is decided by the unanimous AND reduction.
    pub fn run(&self, tile: &mut GraphTile<D, U, W>, cs: &CommSync<VertexId, U>) -> IterCount {
        let print_progress = self.verbose && tile.tid().index() == 0;

        // Join with all workers before touching any shared stream state.
        cs.barrier();

        self.on_start(tile);

        let mut state = match self.kind {
            KernelKind::EdgeCentric(_) => RunState::EdgeCentric,
            KernelKind::VertexCentric(_) => {
                RunState::VertexCentric(vertex_centric::ActivationState::new())
            }
        };

        let mut iter = IterCount::new(0);
        let mut all_converged = false;
        while !all_converged && iter < self.max_iters {
            let converged = self.run_iteration(tile, cs, iter, &mut state);
            self.on_iteration_end(tile, iter);
            if print_progress {
                debug!("->{}", iter);
            }

            // Check if all tiles have converged.
            all_converged = cs.barrier_and(converged);
            iter = iter.next();
        }
        if print_progress {
            info!("Kernel '{}' completed in {} iterations", self.name, iter);
        }

        self.on_end(tile);

        iter
    }

    fn run_iteration(
        &self,
        tile: &mut GraphTile<D, U, W>,
        cs: &CommSync<VertexId, U>,
        iter: IterCount,
        state: &mut RunState,
    ) -> bool {
        match (&self.kind, state) {
            (KernelKind::EdgeCentric(kernel), RunState::EdgeCentric) => {
                edge_centric::run_iteration(tile, cs, iter, kernel.as_ref(), self.num_parts)
            }
            (KernelKind::VertexCentric(kernel), RunState::VertexCentric(activation)) => {
                vertex_centric::run_iteration(
                    tile,
                    cs,
                    iter,
                    kernel.as_ref(),
                    self.num_parts,
                    activation,
                )
            }
            _ => unreachable!("Run state constructed from the kernel kind"),
        }
    }

    fn on_start(&self, tile: &mut GraphTile<D, U, W>) {
        match &self.kind {
            KernelKind::EdgeCentric(kernel) => kernel.on_start(tile),
            KernelKind::VertexCentric(kernel) => kernel.on_start(tile),
        }
    }

    fn on_iteration_end(&self, tile: &mut GraphTile<D, U, W>, iter: IterCount) {
        match &self.kind {
            KernelKind::EdgeCentric(kernel) => kernel.on_iteration_end(tile, iter),
            KernelKind::VertexCentric(kernel) => kernel.on_iteration_end(tile, iter),
        }
    }

    fn on_end(&self, tile: &mut GraphTile<D, U, W>) {
        match &self.kind {
            KernelKind::EdgeCentric(kernel) => kernel.on_end(tile),
            KernelKind::VertexCentric(kernel) => kernel.on_end(tile),
        }
    }

    /// The kernel-specific part of a vertex output line.
    pub fn output_line(&self, vertex: &Vertex<D>) -> Option<String> {
        match &self.kind {
            KernelKind::EdgeCentric(kernel) => kernel.output_line(vertex),
            KernelKind::VertexCentric(kernel) => kernel.output_line(vertex),
        }
    }
}
