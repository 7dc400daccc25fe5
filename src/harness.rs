//! Shared binary harness: argument parsing, graph loading, engine setup and
//! per-vertex output writing. Each bundled kernel ships as its own binary on
//! top of this module.

use crate::engine::{AlgoKernel, Engine};
use crate::error::{invalid_argument_error, GtError};
use crate::graph::load::tiles_from_edge_list;
use crate::util::io::GtWriter;
use crate::util::logger::init_logger_with_level;
use crate::util::memory_usage::print_memory_usage;
use clap::{arg_enum, value_t, App, Arg, ArgMatches};
use gt_kernel_api::{EdgeWeight, IterCount, UpdateCombine, VertexId};
use log::{info, Level};

pub const MAX_ITERS_DEFAULT: u64 = 1000;
pub const NUM_PARTS_DEFAULT: usize = 16;

arg_enum! {
    #[derive(PartialEq, Debug)]
    pub enum LogLevel {
        Error,
        Warn,
        Info,
        Debug,
        Trace,
    }
}

/// Common arguments of every kernel binary.
pub struct HarnessArgs {
    pub threads: usize,
    pub tile_count: usize,
    pub max_iters: IterCount,
    pub num_parts: usize,
    pub edge_list: String,
    pub partition: Option<String>,
    pub output: Option<String>,
    pub kernel_args: Vec<String>,
}

impl HarnessArgs {
    /// The factor collapsing the partition file's tile indices onto the
    /// worker tiles.
    pub fn tile_merge_factor(&self) -> usize {
        self.tile_count / self.threads
    }
}

/// Parses the command line and initializes logging. `kernel_args_usage`
/// documents the trailing kernel-specific arguments.
pub fn parse_args(app_name: &str, kernel_args_usage: &str) -> Result<HarnessArgs, GtError> {
    let matches = App::new(app_name)
        .arg(
            Arg::with_name("threads")
                .short("t")
                .takes_value(true)
                .required(true)
                .help("Number of worker threads, one per tile"),
        )
        .arg(
            Arg::with_name("gtiles")
                .short("g")
                .takes_value(true)
                .required(true)
                .help("Number of graph tiles; must be a multiple of threads"),
        )
        .arg(
            Arg::with_name("maxiter")
                .short("m")
                .takes_value(true)
                .help("Maximum iteration number"),
        )
        .arg(
            Arg::with_name("numparts")
                .short("p")
                .takes_value(true)
                .help("Number of gather partitions per tile"),
        )
        .arg(
            Arg::from_usage("-l, --loglevel=[LEVEL] 'Set the log level'")
                .possible_values(&LogLevel::variants())
                .case_insensitive(true),
        )
        .arg(Arg::with_name("edge_list").required(true).help("Edge list file"))
        .arg(Arg::with_name("partition").help("Partition file"))
        .arg(Arg::with_name("output").help("Per-vertex output file"))
        .arg(Arg::with_name("kernel_args").multiple(true).help(kernel_args_usage))
        .get_matches();

    setup_logger(&matches)?;

    let threads = value_t!(matches, "threads", usize)
        .map_err(|e| invalid_argument_error(format!("Invalid thread count: {}", e)))?;
    let tile_count = value_t!(matches, "gtiles", usize)
        .map_err(|e| invalid_argument_error(format!("Invalid tile count: {}", e)))?;
    let max_iters = value_t!(matches, "maxiter", u64).unwrap_or(MAX_ITERS_DEFAULT);
    let num_parts = value_t!(matches, "numparts", usize).unwrap_or(NUM_PARTS_DEFAULT);

    if threads == 0 || tile_count == 0 {
        return Err(invalid_argument_error(
            "Thread count and tile count must be positive".to_string(),
        ));
    }
    if tile_count % threads != 0 {
        return Err(invalid_argument_error(format!(
            "Tile count {} is not a multiple of thread count {}",
            tile_count, threads
        )));
    }

    Ok(HarnessArgs {
        threads,
        tile_count,
        max_iters: IterCount::new(max_iters),
        num_parts,
        edge_list: matches.value_of("edge_list").expect("Required argument").to_string(),
        partition: matches.value_of("partition").map(str::to_string),
        output: matches.value_of("output").map(str::to_string),
        kernel_args: matches
            .values_of("kernel_args")
            .map(|values| values.map(str::to_string).collect())
            .unwrap_or_default(),
    })
}

fn setup_logger(matches: &ArgMatches) -> Result<(), GtError> {
    let log_level = match value_t!(matches, "loglevel", LogLevel).unwrap_or(LogLevel::Info) {
        LogLevel::Error => Level::Error,
        LogLevel::Warn => Level::Warn,
        LogLevel::Info => Level::Info,
        LogLevel::Debug => Level::Debug,
        LogLevel::Trace => Level::Trace,
    };
    init_logger_with_level(log_level)
}

/// Loads the graph, runs the configured kernel on it, and writes the output
/// file if one was requested.
pub fn run_kernel<D, U, W, F>(
    args: &HarnessArgs,
    default_weight: W,
    vertex_data: F,
    mut kernel: AlgoKernel<D, U, W>,
) -> Result<(), GtError>
where
    D: Send + 'static,
    U: UpdateCombine,
    W: EdgeWeight,
    F: Fn(VertexId) -> D,
{
    let tiles = tiles_from_edge_list(
        args.threads,
        &args.edge_list,
        args.partition.as_deref(),
        default_weight,
        args.tile_merge_factor(),
        true,
        vertex_data,
    )?;
    info!(
        "Graph loaded from '{}'{} with {} graph tiles into {} tiles",
        args.edge_list,
        args.partition.as_ref().map_or_else(String::new, |p| format!(" and '{}'", p)),
        args.tile_count,
        args.threads
    );

    kernel.set_verbose(true);
    kernel.set_max_iters(args.max_iters);
    kernel.set_num_parts(args.num_parts);
    info!(
        "Algorithm kernel '{}' is {}, with max iterations {} and {} partitions",
        kernel.name(),
        kernel.tag(),
        args.max_iters,
        args.num_parts
    );

    let mut engine = Engine::new();
    engine.set_tiles(tiles)?;
    engine.add_kernel(kernel);
    engine.run()?;
    print_memory_usage(format_args!("after kernel run"));

    if let Some(output) = &args.output {
        write_output(&engine, output)?;
    }

    Ok(())
}

/// Writes one `<vid>\t<kernel string>` line per vertex, tile by tile, using
/// the last kernel's output hook. Kernels without per-vertex output produce
/// an empty file.
pub fn write_output<D, U, W>(engine: &Engine<D, U, W>, output_path: &str) -> Result<(), GtError>
where
    D: Send + 'static,
    U: UpdateCombine,
    W: EdgeWeight,
{
    let kernel = match engine.kernels().last() {
        Some(kernel) => kernel,
        None => return Ok(()),
    };
    info!("Writing output to '{}'", output_path);
    let mut writer = GtWriter::new(output_path.to_string())?;
    for tile in engine.tiles() {
        writer.write_file_lines(tile.vertices().filter_map(|vertex| {
            kernel.output_line(vertex).map(|line| format!("{}\t{}", vertex.vid(), line))
        }))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computations::sssp::Sssp;
    use gt_kernel_api::TileId;

    #[test]
    fn output_lines_per_vertex() {
        let tiles = tiles_from_edge_list(
            1,
            "data/test_data/sssp/path.dat",
            None,
            1,
            1,
            true,
            Sssp::vertex_data,
        )
        .expect("Loading path failed");

        let mut engine = Engine::new();
        engine.set_tiles(tiles).expect("set_tiles failed");
        let mut kernel = AlgoKernel::edge_centric(
            crate::computations::sssp::NAME,
            Box::new(Sssp::new(VertexId::new(0))),
        );
        kernel.set_max_iters(IterCount::new(100));
        engine.add_kernel(kernel);
        engine.run().expect("Engine run failed");

        let output_path = std::env::temp_dir().join("graphtide_harness_output_test.txt");
        let output_path = output_path.to_str().expect("Path is valid UTF-8");
        write_output(&engine, output_path).expect("Writing output failed");

        let mut lines = std::fs::read_to_string(output_path)
            .expect("Reading output failed")
            .lines()
            .map(str::to_string)
            .collect::<Vec<_>>();
        lines.sort();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "0\t0 18446744073709551615");
        assert_eq!(lines[1], "1\t1 0");
        assert_eq!(lines[2], "2\t3 1");
        assert_eq!(lines[3], "3\t7 2");
        std::fs::remove_file(output_path).expect("Removing output failed");

        // The engine still owns its tiles after the run.
        assert!(engine.tile(TileId::new(0)).is_some());
    }
}
