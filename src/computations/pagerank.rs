use gt_kernel_api::{
    DegreeCount, EdgeCentricKernel, GraphTile, IterCount, KernelBase, UpdateCombine, Vertex,
    VertexId,
};

pub const NAME: &str = "pagerank";
pub const BETA_DEFAULT: f64 = 0.85;
pub const TOLERANCE_DEFAULT: f64 = 1e-4;

#[derive(Debug, Default, Clone, Copy)]
pub struct PageRankData {
    collected: DegreeCount,
    sum: f64,
    rank: f64,
}

impl PageRankData {
    pub fn rank(&self) -> f64 {
        self.rank
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageRankUpdate {
    contribute: f64,
    count: DegreeCount,
}

impl UpdateCombine for PageRankUpdate {
    fn identity() -> Self {
        Self { contribute: 0.0, count: DegreeCount::new(0) }
    }

    fn combine(&mut self, other: Self) {
        self.contribute += other.contribute;
        self.count += other.count;
    }
}

/// Iterative PageRank with teleport factor `beta`. A vertex recomputes its
/// rank once the contributions of all its in-edges have been collected, and
/// reports convergence when the rank moved by at most `tolerance`.
pub struct PageRank {
    beta: f64,
    tolerance: f64,
}

impl PageRank {
    pub fn new(beta: f64, tolerance: f64) -> Self {
        Self { beta, tolerance }
    }

    /// Vertex constructor handed to the loader.
    pub fn vertex_data(_vid: VertexId) -> PageRankData {
        PageRankData::default()
    }
}

impl KernelBase for PageRank {
    type VertexData = PageRankData;
    type Update = PageRankUpdate;
    type Weight = u32;

    fn on_start(&self, tile: &mut GraphTile<PageRankData, PageRankUpdate, u32>) {
        // Vertices without in-edges are never gathered; their rank is the
        // teleport value from the start and never changes.
        for vertex in tile.vertices_mut() {
            if vertex.in_deg().count() == 0 {
                vertex.data_mut().rank = 1.0 - self.beta;
            }
        }
    }

    fn output_line(&self, vertex: &Vertex<PageRankData>) -> Option<String> {
        Some(format!("{}", vertex.data().rank))
    }
}

impl EdgeCentricKernel for PageRank {
    fn scatter(
        &self,
        _iter: IterCount,
        src: &Vertex<PageRankData>,
        _weight: &mut u32,
    ) -> Option<PageRankUpdate> {
        #[allow(clippy::cast_precision_loss)]
        let contribute = src.data().rank / src.out_deg().count() as f64;
        Some(PageRankUpdate { contribute, count: DegreeCount::new(1) })
    }

    fn gather(
        &self,
        _iter: IterCount,
        dst: &mut Vertex<PageRankData>,
        update: PageRankUpdate,
    ) -> bool {
        let in_deg = dst.in_deg();
        let data = dst.data_mut();
        data.sum += update.contribute;
        data.collected += update.count;
        if data.collected == in_deg {
            let new_rank = self.beta * data.sum + (1.0 - self.beta);
            let converged = (new_rank - data.rank).abs() <= self.tolerance;
            data.rank = new_rank;
            data.sum = 0.0;
            data.collected = DegreeCount::new(0);
            converged
        } else {
            // Convergence is unknown until all contributions are collected.
            true
        }
    }
}
