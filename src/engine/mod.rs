//! The engine binds tiles to workers and drives the kernel list.
//!
//! Worker count equals tile count; a tile is statically bound to its worker
//! for the entire run, and workers share nothing but the [`CommSync`]
//! utility. The engine itself never touches vertex data.

pub mod algo_kernel;
mod edge_centric;
mod vertex_centric;

pub use algo_kernel::{AlgoKernel, KernelKind};

use crate::comm::CommSync;
use crate::error::{invalid_argument_error, GtError};
use crate::util::timer::GtTimer;
use gt_kernel_api::{EdgeWeight, GraphTile, TileId, UpdateCombine};
use crossbeam_utils::thread;
use itertools::Itertools;
use log::{debug, info};

pub struct Engine<D, U, W> {
    tiles: Vec<GraphTile<D, U, W>>,
    kernels: Vec<AlgoKernel<D, U, W>>,
}

impl<D, U, W> Default for Engine<D, U, W>
where
    D: Send + 'static,
    U: UpdateCombine,
    W: EdgeWeight,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<D, U, W> Engine<D, U, W>
where
    D: Send + 'static,
    U: UpdateCombine,
    W: EdgeWeight,
{
    pub fn new() -> Self {
        Self { tiles: Vec::new(), kernels: Vec::new() }
    }

    pub fn tile(&self, tid: TileId) -> Option<&GraphTile<D, U, W>> {
        self.tiles.get(tid.index())
    }

    pub fn tiles(&self) -> &[GraphTile<D, U, W>] {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Appends a single tile. Tile indices must be incremental.
    pub fn add_tile(&mut self, tile: GraphTile<D, U, W>) -> Result<(), GtError> {
        if tile.tid().index() != self.tiles.len() {
            return Err(invalid_argument_error(format!(
                "Tile id {} does not follow the {} tiles already added",
                tile.tid(),
                self.tiles.len()
            )));
        }
        self.tiles.push(tile);
        Ok(())
    }

    /// Assigns all tiles at once. Each tile must carry its own index.
    pub fn set_tiles(&mut self, tiles: Vec<GraphTile<D, U, W>>) -> Result<(), GtError> {
        for (idx, tile) in tiles.iter().enumerate() {
            if tile.tid().index() != idx {
                return Err(invalid_argument_error(format!(
                    "Tile at position {} carries tile id {}",
                    idx,
                    tile.tid()
                )));
            }
        }
        self.tiles = tiles;
        Ok(())
    }

    pub fn add_kernel(&mut self, kernel: AlgoKernel<D, U, W>) {
        self.kernels.push(kernel);
    }

    pub fn kernels(&self) -> &[AlgoKernel<D, U, W>] {
        &self.kernels
    }

    pub fn kernel_count(&self) -> usize {
        self.kernels.len()
    }

    /// Runs all kernels in sequence on the graph tiles, one worker thread
    /// per tile. Kernel k+1 starts only after every worker finished kernel
    /// k: workers execute an identical barrier sequence, so the start
    /// barrier of the next kernel cannot complete early.
    pub fn run(&mut self) -> Result<(), GtError> {
        if self.tiles.is_empty() {
            return Err(invalid_argument_error("Engine has no graph tiles".to_string()));
        }

        let thread_count = self.tiles.len();
        info!(
            "Running {} kernels on {} tiles with one worker each",
            self.kernels.len(),
            thread_count
        );

        let cs = CommSync::new(thread_count);
        let cs_ref = &cs;
        let kernels = &self.kernels;
        let tiles = &mut self.tiles;
        let timer = GtTimer::now();

        thread::scope(|s| {
            for tile in tiles.iter_mut() {
                s.spawn(move |_| {
                    for kernel in kernels {
                        let kernel_timer = GtTimer::now();
                        let iters = kernel.run(tile, cs_ref);
                        debug!(
                            "Tile {} finished {} kernel '{}' after {} iterations in {}",
                            tile.tid(),
                            kernel.tag(),
                            kernel.name(),
                            iters,
                            kernel_timer.elapsed().to_seconds_string()
                        );
                    }
                });
            }
        })
        .expect("Error joining engine workers");

        debug!(
            "Workers sent [{}] key-value pairs in total",
            (0..thread_count).map(|prod| cs.send_count(prod)).join(", ")
        );
        info!("All kernels done in {}", timer.elapsed().to_seconds_string());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use gt_kernel_api::{
        EdgeCentricKernel, IterCount, KernelBase, UpdateCombine, Vertex, VertexId,
    };

    #[derive(Debug, Default, Clone, Copy)]
    struct NoUpdate;

    impl UpdateCombine for NoUpdate {
        fn identity() -> Self {
            NoUpdate
        }

        fn combine(&mut self, _other: Self) {}
    }

    struct IdleKernel;

    impl KernelBase for IdleKernel {
        type VertexData = f64;
        type Update = NoUpdate;
        type Weight = u32;
    }

    impl EdgeCentricKernel for IdleKernel {
        fn scatter(
            &self,
            _iter: IterCount,
            _src: &Vertex<f64>,
            _weight: &mut u32,
        ) -> Option<NoUpdate> {
            None
        }

        fn gather(&self, _iter: IterCount, _dst: &mut Vertex<f64>, _update: NoUpdate) -> bool {
            true
        }
    }

    type TestTile = GraphTile<f64, NoUpdate, u32>;

    fn two_tiles() -> Vec<TestTile> {
        let mut tiles =
            vec![TestTile::new(TileId::new(0)), TestTile::new(TileId::new(1))];
        for vid in 0..4_u64 {
            tiles[(vid % 2) as usize].add_vertex(VertexId::new(vid), 0.0).expect("add_vertex");
        }
        for tile in &mut tiles {
            tile.finalize();
        }
        tiles
    }

    fn idle_kernel(name: &str, max_iters: u64) -> AlgoKernel<f64, NoUpdate, u32> {
        let mut kernel = AlgoKernel::edge_centric(name, Box::new(IdleKernel));
        kernel.set_max_iters(IterCount::new(max_iters));
        kernel
    }

    #[test]
    fn tile_accessors() {
        let mut engine = Engine::new();
        engine.set_tiles(two_tiles()).expect("set_tiles");
        assert_eq!(engine.tile_count(), 2);
        for idx in 0..2 {
            let tile = engine.tile(TileId::new(idx)).expect("tile");
            assert_eq!(tile.tid(), TileId::new(idx));
        }
        assert!(engine.tile(TileId::new(5)).is_none());
    }

    #[test]
    fn add_tile_enforces_incremental_ids() {
        let mut engine = Engine::<f64, NoUpdate, u32>::new();
        engine.add_tile(TestTile::new(TileId::new(0))).expect("add_tile");
        let err = engine.add_tile(TestTile::new(TileId::new(5))).expect_err("bad tid accepted");
        assert_eq!(err.error_type(), ErrorType::InvalidArgumentError);
        assert_eq!(engine.tile_count(), 1);
    }

    #[test]
    fn set_tiles_enforces_ids() {
        let mut engine = Engine::<f64, NoUpdate, u32>::new();
        let err = engine
            .set_tiles(vec![TestTile::new(TileId::new(1))])
            .expect_err("bad tid accepted");
        assert_eq!(err.error_type(), ErrorType::InvalidArgumentError);
        assert_eq!(engine.tile_count(), 0);
    }

    #[test]
    fn run_requires_tiles() {
        let mut engine = Engine::<f64, NoUpdate, u32>::new();
        engine.add_kernel(idle_kernel("idle", 10));
        let err = engine.run().expect_err("ran without tiles");
        assert_eq!(err.error_type(), ErrorType::InvalidArgumentError);
    }

    #[test]
    fn runs_kernels_in_sequence() {
        let mut engine = Engine::new();
        engine.set_tiles(two_tiles()).expect("set_tiles");
        engine.add_kernel(idle_kernel("first", 10));
        engine.add_kernel(idle_kernel("second", 15));
        assert_eq!(engine.kernel_count(), 2);
        engine.run().expect("run failed");
        // An idle kernel converges in its first iteration.
        assert_eq!(engine.tile_count(), 2);
    }
}
