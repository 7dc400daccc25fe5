//! One vertex-centric superstep on one tile.
//!
//! The driver owns the activation state so that kernel vertex data stays
//! free of scheduling concerns. Every vertex starts active in iteration 0;
//! afterwards a vertex is active only if its kernel `scatter` asked for it
//! when the vertex last received updates. A tile votes converged when its
//! next-iteration activation set is empty.

use crate::comm::CommSync;
use gt_kernel_api::{
    EdgeWeight, GraphTile, IterCount, UpdateCombine, Vertex, VertexCentricKernel, VertexId,
    INVALID_VERTEX_ID,
};
use hashbrown::hash_map::Entry;
use hashbrown::{HashMap, HashSet};

pub(crate) struct ActivationState {
    active: HashSet<VertexId>,
    all_active: bool,
}

impl ActivationState {
    pub(crate) fn new() -> Self {
        Self { active: HashSet::new(), all_active: true }
    }

    fn is_active(&self, vid: VertexId) -> bool {
        self.all_active || self.active.contains(&vid)
    }
}

/// Executes one gather, send, apply, scatter pass over the tile. Returns
/// whether the tile converged locally in this iteration.
pub(crate) fn run_iteration<D, U, W>(
    tile: &mut GraphTile<D, U, W>,
    cs: &CommSync<VertexId, U>,
    iter: IterCount,
    kernel: &dyn VertexCentricKernel<VertexData = D, Update = U, Weight = W>,
    num_parts: usize,
    state: &mut ActivationState,
) -> bool
where
    D: Send + 'static,
    U: UpdateCombine,
    W: EdgeWeight,
{
    let tid = tile.tid().index();

    cs.prod_reset(tid);

    // Gather along every out-edge of an active source.
    {
        let view = tile.scatter_view();
        let mut cached_src: Option<&Vertex<D>> = None;
        let mut cached_src_id = INVALID_VERTEX_ID;
        for edge in view.edges.iter_mut() {
            let src_id = edge.src();
            if !state.is_active(src_id) {
                continue;
            }
            let dst_id = edge.dst();
            if src_id != cached_src_id {
                cached_src = view.vertices.get(&src_id);
                cached_src_id = src_id;
            }
            let src = cached_src.expect("Edge source must be a local vertex");

            let update = kernel.gather(iter, src, edge.weight_mut());
            if view.vertices.contains_key(&dst_id) {
                cs.send(tid, tid, dst_id, update);
            } else {
                view.mirrors
                    .get_mut(&dst_id)
                    .expect("Remote destination must have a mirror vertex")
                    .accumulate(update);
            }
        }
    }

    for mv in tile.mirrors_mut() {
        let update = mv.take_update();
        cs.send(tid, mv.master_tile().index(), mv.vid(), update);
    }

    // Receive; accumulate per destination, then apply once per vertex and
    // let its scatter decide re-activation.
    let mut next_active = HashSet::new();
    let partitions = cs.drain(tid, num_parts, |vid: &VertexId| vid.index());
    for partition in partitions {
        let mut accumulated: HashMap<VertexId, U> = HashMap::new();
        for kv in partition {
            match accumulated.entry(kv.key) {
                Entry::Occupied(mut entry) => entry.get_mut().combine(kv.val),
                Entry::Vacant(entry) => {
                    entry.insert(kv.val);
                }
            }
        }
        for (vid, acc_update) in accumulated {
            let vertex =
                tile.vertex_mut(vid).expect("Update destination must be a local master");
            kernel.apply(iter, vertex, acc_update);
            let vertex = tile.vertex(vid).expect("Update destination must be a local master");
            if kernel.scatter(iter, vertex) {
                next_active.insert(vid);
            }
        }
    }

    cs.cons_reset(tid);

    state.active = next_active;
    state.all_active = false;

    state.active.is_empty()
}
