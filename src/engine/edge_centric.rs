//! One edge-centric superstep on one tile.

use crate::comm::CommSync;
use gt_kernel_api::{
    EdgeCentricKernel, EdgeWeight, GraphTile, IterCount, UpdateCombine, Vertex, VertexId,
    INVALID_VERTEX_ID,
};

/// Executes one scatter, send, receive, gather pass over the tile. Returns
/// whether the tile converged locally in this iteration.
pub(crate) fn run_iteration<D, U, W>(
    tile: &mut GraphTile<D, U, W>,
    cs: &CommSync<VertexId, U>,
    iter: IterCount,
    kernel: &dyn EdgeCentricKernel<VertexData = D, Update = U, Weight = W>,
    num_parts: usize,
) -> bool
where
    D: Send + 'static,
    U: UpdateCombine,
    W: EdgeWeight,
{
    let tid = tile.tid().index();

    // The previous iteration's outgoing buffers can only be reclaimed now:
    // the iteration-end barrier guarantees all consumers have drained them.
    cs.prod_reset(tid);

    // Scatter.
    {
        let view = tile.scatter_view();
        // Edges are sorted by source, so one map lookup serves a whole run
        // of edges.
        let mut cached_src: Option<&Vertex<D>> = None;
        let mut cached_src_id = INVALID_VERTEX_ID;
        for edge in view.edges.iter_mut() {
            let src_id = edge.src();
            let dst_id = edge.dst();
            if src_id != cached_src_id {
                cached_src = view.vertices.get(&src_id);
                cached_src_id = src_id;
            }
            let src = cached_src.expect("Edge source must be a local vertex");

            if let Some(update) = kernel.scatter(iter, src, edge.weight_mut()) {
                if view.vertices.contains_key(&dst_id) {
                    // Local destination.
                    cs.send(tid, tid, dst_id, update);
                } else {
                    // Remote destination: coalesce into the mirror vertex.
                    view.mirrors
                        .get_mut(&dst_id)
                        .expect("Remote destination must have a mirror vertex")
                        .accumulate(update);
                }
            }
        }
    }

    // Send the coalesced update of each mirror to its master tile.
    for mv in tile.mirrors_mut() {
        let update = mv.take_update();
        cs.send(tid, mv.master_tile().index(), mv.vid(), update);
    }

    // Receive and gather. The barrier embedded in drain stands in for an
    // explicit end-of-message tag: afterwards the inbox is complete.
    let mut converged = true;
    let partitions = cs.drain(tid, num_parts, |vid: &VertexId| vid.index());
    for partition in partitions {
        for kv in partition {
            let dst = tile.vertex_mut(kv.key).expect("Update destination must be a local master");
            converged &= kernel.gather(iter, dst, kv.val);
        }
    }

    cs.cons_reset(tid);

    converged
}
