use graphtide::computations::wcc::{self, Wcc};
use graphtide::engine::AlgoKernel;
use graphtide::error::GtError;
use graphtide::harness;

fn main() -> Result<(), GtError> {
    let args = harness::parse_args(wcc::NAME, "")?;
    let kernel = AlgoKernel::vertex_centric(wcc::NAME, Box::new(Wcc::new()));
    harness::run_kernel(&args, 1, Wcc::vertex_data, kernel)
}
