//! Bundled algorithm kernels. Each kernel implements one of the two
//! capability sets from `gt_kernel_api` and is wrapped into an
//! [`AlgoKernel`](crate::engine::AlgoKernel) by its binary harness.

pub mod pagerank;
pub mod sssp;
pub mod wcc;
