use gt_kernel_api::{
    EdgeCentricKernel, GraphTile, IterCount, KernelBase, UpdateCombine, Vertex, VertexId,
    INVALID_VERTEX_ID,
};

pub const NAME: &str = "sssp";

const INF_DISTANCE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
pub struct SsspData {
    distance: u32,
    predecessor: VertexId,
    // The iteration in which this vertex last improved; its out-edges
    // scatter only in the following iteration.
    active_iter: Option<IterCount>,
}

impl Default for SsspData {
    fn default() -> Self {
        Self { distance: INF_DISTANCE, predecessor: INVALID_VERTEX_ID, active_iter: None }
    }
}

impl SsspData {
    pub fn distance(&self) -> Option<u32> {
        if self.distance == INF_DISTANCE {
            None
        } else {
            Some(self.distance)
        }
    }

    pub fn predecessor(&self) -> Option<VertexId> {
        if self.predecessor == INVALID_VERTEX_ID {
            None
        } else {
            Some(self.predecessor)
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SsspUpdate {
    distance: u32,
    predecessor: VertexId,
}

impl UpdateCombine for SsspUpdate {
    fn identity() -> Self {
        Self { distance: INF_DISTANCE, predecessor: INVALID_VERTEX_ID }
    }

    fn combine(&mut self, other: Self) {
        // Minimum of distances.
        if self.distance > other.distance {
            *self = other;
        }
    }
}

/// Single-source shortest paths over `u32` edge weights, tracking distance
/// and predecessor per vertex.
pub struct Sssp {
    root: VertexId,
}

impl Sssp {
    pub fn new(root: VertexId) -> Self {
        Self { root }
    }

    /// Vertex constructor handed to the loader.
    pub fn vertex_data(_vid: VertexId) -> SsspData {
        SsspData::default()
    }
}

impl KernelBase for Sssp {
    type VertexData = SsspData;
    type Update = SsspUpdate;
    type Weight = u32;

    fn on_start(&self, tile: &mut GraphTile<SsspData, SsspUpdate, u32>) {
        // Only the tile that masters the root seeds it.
        if let Some(root) = tile.vertex_mut(self.root) {
            root.data_mut().distance = 0;
            root.data_mut().active_iter = Some(IterCount::new(0));
        }
    }

    fn output_line(&self, vertex: &Vertex<SsspData>) -> Option<String> {
        let data = vertex.data();
        Some(format!("{} {}", data.distance, data.predecessor))
    }
}

impl EdgeCentricKernel for Sssp {
    fn scatter(
        &self,
        iter: IterCount,
        src: &Vertex<SsspData>,
        weight: &mut u32,
    ) -> Option<SsspUpdate> {
        let data = src.data();
        if data.active_iter == Some(iter) {
            Some(SsspUpdate {
                distance: data.distance.saturating_add(*weight),
                predecessor: src.vid(),
            })
        } else {
            None
        }
    }

    fn gather(&self, iter: IterCount, dst: &mut Vertex<SsspData>, update: SsspUpdate) -> bool {
        let data = dst.data_mut();
        if data.distance > update.distance {
            data.distance = update.distance;
            data.predecessor = update.predecessor;
            data.active_iter = Some(iter.next());
            // Improved, so not converged yet.
            return false;
        }
        true
    }
}
