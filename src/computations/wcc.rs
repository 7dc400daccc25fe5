use gt_kernel_api::{
    IterCount, KernelBase, UpdateCombine, Vertex, VertexCentricKernel, VertexId,
    INVALID_VERTEX_ID,
};

pub const NAME: &str = "wcc";

#[derive(Debug, Clone, Copy)]
pub struct WccData {
    component: VertexId,
    changed: bool,
}

impl WccData {
    pub fn component(&self) -> VertexId {
        self.component
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WccUpdate {
    label: VertexId,
}

impl UpdateCombine for WccUpdate {
    fn identity() -> Self {
        // The sentinel orders after every real id, so it is neutral for the
        // minimum.
        Self { label: INVALID_VERTEX_ID }
    }

    fn combine(&mut self, other: Self) {
        self.label = self.label.min(other.label);
    }
}

/// Connected components by minimum-label propagation, expressed through the
/// vertex-centric contract. Labels flow along edge direction; undirected
/// semantics need both directions present in the input.
pub struct Wcc;

impl Wcc {
    pub fn new() -> Self {
        Self
    }

    /// Vertex constructor handed to the loader: every vertex starts in its
    /// own component.
    pub fn vertex_data(vid: VertexId) -> WccData {
        WccData { component: vid, changed: false }
    }
}

impl Default for Wcc {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBase for Wcc {
    type VertexData = WccData;
    type Update = WccUpdate;
    type Weight = u32;

    fn output_line(&self, vertex: &Vertex<WccData>) -> Option<String> {
        Some(format!("{}", vertex.data().component))
    }
}

impl VertexCentricKernel for Wcc {
    fn gather(&self, _iter: IterCount, src: &Vertex<WccData>, _weight: &mut u32) -> WccUpdate {
        WccUpdate { label: src.data().component }
    }

    fn apply(&self, _iter: IterCount, vertex: &mut Vertex<WccData>, acc_update: WccUpdate) {
        let data = vertex.data_mut();
        if acc_update.label < data.component {
            data.component = acc_update.label;
            data.changed = true;
        } else {
            data.changed = false;
        }
    }

    fn scatter(&self, _iter: IterCount, vertex: &Vertex<WccData>) -> bool {
        vertex.data().changed
    }
}
