//! Graph input. The tile data model itself lives in `gt_kernel_api`; this
//! module turns edge-list and partition files into finalized tiles.

pub mod load;
