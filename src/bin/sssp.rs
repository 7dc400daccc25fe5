use graphtide::computations::sssp::{self, Sssp};
use graphtide::engine::AlgoKernel;
use graphtide::error::{invalid_argument_error, GtError};
use graphtide::harness;
use gt_kernel_api::VertexId;

fn main() -> Result<(), GtError> {
    let args = harness::parse_args(sssp::NAME, "[ <root> ]")?;

    let mut root = VertexId::new(0);
    if let Some(arg) = args.kernel_args.get(0) {
        root = arg
            .parse::<u64>()
            .map(VertexId::new)
            .map_err(|e| invalid_argument_error(format!("Invalid root '{}': {}", arg, e)))?;
    }

    let kernel = AlgoKernel::edge_centric(sssp::NAME, Box::new(Sssp::new(root)));
    harness::run_kernel(&args, 1, Sssp::vertex_data, kernel)
}
