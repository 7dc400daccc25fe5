//! Graphtide is a tiled, multi-threaded, iterative graph-processing engine
//! implementing the gather-apply-scatter paradigm. A graph is partitioned
//! into tiles; each tile is owned by one worker thread; workers exchange
//! per-destination update messages through an NxN stream matrix and
//! synchronize at per-iteration barriers until a global convergence vote or
//! an iteration cap terminates the run.

// Enable warnings for all clippy lints. This automatically enables new lints
// shipped with new rust versions.
#![warn(
    clippy::correctness,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::cargo
)]
// Now selectively disable unneeded lints.
#![allow(
    clippy::indexing_slicing,               // Allow `vec[i]` indexing.
    clippy::module_name_repetitions,        // Allow.
    clippy::float_arithmetic,               // Allow.
    clippy::must_use_candidate,             // Allow.
    clippy::inline_always,                  // Allow.
    clippy::missing_errors_doc,             // Disabled.
    clippy::missing_panics_doc,             // Disabled.
    clippy::multiple_crate_versions         // Disabled.
)]
// Do not allow print statements. Use `log::info!()` or equivalent instead.
#![deny(clippy::print_stdout)]

pub mod comm;
pub mod computations;
pub mod engine;
pub mod error;
pub mod graph;
pub mod harness;
pub mod util;
