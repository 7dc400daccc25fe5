use graphtide::computations::pagerank::{self, PageRank};
use graphtide::engine::AlgoKernel;
use graphtide::error::{invalid_argument_error, GtError};
use graphtide::harness;

fn main() -> Result<(), GtError> {
    let args = harness::parse_args(pagerank::NAME, "[ <beta> [ <tolerance> ] ]")?;

    let mut beta = pagerank::BETA_DEFAULT;
    let mut tolerance = pagerank::TOLERANCE_DEFAULT;
    if let Some(arg) = args.kernel_args.get(0) {
        beta = arg
            .parse()
            .map_err(|e| invalid_argument_error(format!("Invalid beta '{}': {}", arg, e)))?;
    }
    if let Some(arg) = args.kernel_args.get(1) {
        tolerance = arg
            .parse()
            .map_err(|e| invalid_argument_error(format!("Invalid tolerance '{}': {}", arg, e)))?;
    }

    let kernel = AlgoKernel::edge_centric(pagerank::NAME, Box::new(PageRank::new(beta, tolerance)));
    harness::run_kernel(&args, 1, PageRank::vertex_data, kernel)
}
