use crate::error::GraphError;
use crate::ids::{DegreeCount, TileId, VertexId};
use crate::kernel::UpdateCombine;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use std::cmp::Ordering;

/// A vertex record. Owned by exactly one tile, its *master*; `data` is
/// mutated only by the worker that owns that tile.
#[derive(Debug, Clone)]
pub struct Vertex<D> {
    vid: VertexId,
    in_deg: DegreeCount,
    out_deg: DegreeCount,
    data: D,
}

impl<D> Vertex<D> {
    pub fn new(vid: VertexId, data: D) -> Self {
        Self { vid, in_deg: DegreeCount::default(), out_deg: DegreeCount::default(), data }
    }

    #[inline(always)]
    pub fn vid(&self) -> VertexId {
        self.vid
    }

    #[inline(always)]
    pub fn in_deg(&self) -> DegreeCount {
        self.in_deg
    }

    #[inline(always)]
    pub fn out_deg(&self) -> DegreeCount {
        self.out_deg
    }

    #[inline(always)]
    pub fn data(&self) -> &D {
        &self.data
    }

    #[inline(always)]
    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    fn in_deg_add(&mut self, deg: DegreeCount) {
        self.in_deg += deg;
    }
}

/// A local surrogate for a vertex mastered on another tile. Coalesces
/// outbound updates so that many local contributions to the same remote
/// destination become one sent message.
///
/// During graph construction it temporarily accumulates the in-degree
/// contributed by this tile's edges; finalization propagates that count to
/// the master and zeroes it.
#[derive(Debug)]
pub struct MirrorVertex<U> {
    vid: VertexId,
    master_tile: TileId,
    acc_update: U,
    acc_deg: DegreeCount,
}

impl<U: UpdateCombine> MirrorVertex<U> {
    fn new(vid: VertexId, master_tile: TileId) -> Self {
        Self { vid, master_tile, acc_update: U::identity(), acc_deg: DegreeCount::default() }
    }

    #[inline(always)]
    pub fn vid(&self) -> VertexId {
        self.vid
    }

    #[inline(always)]
    pub fn master_tile(&self) -> TileId {
        self.master_tile
    }

    /// Folds `update` into the local accumulator.
    #[inline(always)]
    pub fn accumulate(&mut self, update: U) {
        self.acc_update.combine(update);
    }

    /// Returns the accumulated update, resetting the accumulator to the
    /// combine identity.
    pub fn take_update(&mut self) -> U {
        std::mem::replace(&mut self.acc_update, U::identity())
    }

    pub fn acc_deg(&self) -> DegreeCount {
        self.acc_deg
    }

    fn take_deg(&mut self) -> DegreeCount {
        std::mem::take(&mut self.acc_deg)
    }
}

/// A directed edge. Lives in the tile of its source vertex.
#[derive(Debug, Clone)]
pub struct Edge<W> {
    src: VertexId,
    dst: VertexId,
    weight: W,
}

impl<W> Edge<W> {
    pub fn new(src: VertexId, dst: VertexId, weight: W) -> Self {
        Self { src, dst, weight }
    }

    #[inline(always)]
    pub fn src(&self) -> VertexId {
        self.src
    }

    #[inline(always)]
    pub fn dst(&self) -> VertexId {
        self.dst
    }

    #[inline(always)]
    pub fn weight(&self) -> &W {
        &self.weight
    }

    #[inline(always)]
    pub fn weight_mut(&mut self) -> &mut W {
        &mut self.weight
    }

    /// Edge order used for sorting: source index first, then destination.
    pub fn cmp_by_endpoints(a: &Self, b: &Self) -> Ordering {
        (a.src, a.dst).cmp(&(b.src, b.dst))
    }
}

/// Split borrow of a tile for the scatter phase: edge weights are mutable,
/// vertices are read-only, mirror accumulators are mutable.
pub struct ScatterView<'a, D, U, W> {
    pub edges: &'a mut [Edge<W>],
    pub vertices: &'a HashMap<VertexId, Vertex<D>>,
    pub mirrors: &'a mut HashMap<VertexId, MirrorVertex<U>>,
}

/// One partition of the graph, owned by exactly one worker.
///
/// Tiles are constructed empty, populated by the loader, finalized, then
/// frozen: after finalization only vertex data, mirror accumulators and edge
/// weights may change.
#[derive(Debug)]
pub struct GraphTile<D, U, W> {
    tid: TileId,
    vertices: HashMap<VertexId, Vertex<D>>,
    mirrors: HashMap<VertexId, MirrorVertex<U>>,
    edges: Vec<Edge<W>>,
    edge_sorted: bool,
    finalized: bool,
}

impl<D, U: UpdateCombine, W> GraphTile<D, U, W> {
    pub fn new(tid: TileId) -> Self {
        Self {
            tid,
            vertices: HashMap::new(),
            mirrors: HashMap::new(),
            edges: Vec::new(),
            // An empty edge list is trivially sorted.
            edge_sorted: true,
            finalized: false,
        }
    }

    #[inline(always)]
    pub fn tid(&self) -> TileId {
        self.tid
    }

    /* Vertices. */

    pub fn add_vertex(&mut self, vid: VertexId, data: D) -> Result<(), GraphError> {
        if self.finalized {
            return Err(GraphError::Permission("add_vertex"));
        }
        match self.vertices.entry(vid) {
            Entry::Occupied(_) => Err(GraphError::KeyInUse(vid)),
            Entry::Vacant(entry) => {
                entry.insert(Vertex::new(vid, data));
                Ok(())
            }
        }
    }

    #[inline(always)]
    pub fn vertex(&self, vid: VertexId) -> Option<&Vertex<D>> {
        self.vertices.get(&vid)
    }

    #[inline(always)]
    pub fn vertex_mut(&mut self, vid: VertexId) -> Option<&mut Vertex<D>> {
        self.vertices.get_mut(&vid)
    }

    #[inline(always)]
    pub fn has_vertex(&self, vid: VertexId) -> bool {
        self.vertices.contains_key(&vid)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex<D>> {
        self.vertices.values()
    }

    pub fn vertices_mut(&mut self) -> impl Iterator<Item = &mut Vertex<D>> {
        self.vertices.values_mut()
    }

    /* Edges. */

    /// Adds an edge from a local `src` to `dst`, whose master tile is
    /// `dst_tid`. Repeated edges with the same endpoints are accepted.
    ///
    /// Bumps the source out-degree, and the destination in-degree either
    /// directly (local destination) or on the mirror created for it.
    pub fn add_edge(
        &mut self,
        src: VertexId,
        dst: VertexId,
        dst_tid: TileId,
        weight: W,
    ) -> Result<(), GraphError> {
        if self.finalized {
            return Err(GraphError::Permission("add_edge"));
        }
        self.vertices.get_mut(&src).ok_or(GraphError::VertexNotFound(src))?.out_deg.inc();
        if dst_tid == self.tid {
            self.vertices.get_mut(&dst).ok_or(GraphError::VertexNotFound(dst))?.in_deg.inc();
        } else {
            self.mirrors
                .entry(dst)
                .or_insert_with(|| MirrorVertex::new(dst, dst_tid))
                .acc_deg
                .inc();
        }

        let edge = Edge::new(src, dst, weight);
        if let Some(last) = self.edges.last() {
            if Edge::cmp_by_endpoints(last, &edge) == Ordering::Greater {
                self.edge_sorted = false;
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge<W>] {
        &self.edges
    }

    #[inline(always)]
    pub fn edge_sorted(&self) -> bool {
        self.edge_sorted
    }

    /// Sorts edges by `(src, dst)` and restores the sorted flag. Sorting
    /// enables the source-vertex cache during scatter.
    pub fn sort_edges(&mut self) {
        self.edges.sort_by(Edge::cmp_by_endpoints);
        self.edge_sorted = true;
    }

    /* Mirror vertices. */

    #[inline(always)]
    pub fn mirror(&self, vid: VertexId) -> Option<&MirrorVertex<U>> {
        self.mirrors.get(&vid)
    }

    pub fn mirror_count(&self) -> usize {
        self.mirrors.len()
    }

    pub fn mirrors(&self) -> impl Iterator<Item = &MirrorVertex<U>> {
        self.mirrors.values()
    }

    pub fn mirrors_mut(&mut self) -> impl Iterator<Item = &mut MirrorVertex<U>> {
        self.mirrors.values_mut()
    }

    /* Finalization. */

    #[inline(always)]
    pub fn finalized(&self) -> bool {
        self.finalized
    }

    /// Sorts edges and freezes the tile structure. Mirror degree propagation
    /// is cross-tile and must happen first; see [`propagate_mirror_degrees`].
    pub fn finalize(&mut self) {
        self.sort_edges();
        self.finalized = true;
    }

    /// Split borrow used by the scatter phase, which walks edges while
    /// reading source vertices and folding into mirror accumulators.
    pub fn scatter_view(&mut self) -> ScatterView<'_, D, U, W> {
        ScatterView {
            edges: &mut self.edges,
            vertices: &self.vertices,
            mirrors: &mut self.mirrors,
        }
    }
}

/// Propagates every mirror's accumulated degree to the in-degree of the
/// master copy and zeroes the accumulator. Called once, before tiles are
/// finalized.
pub fn propagate_mirror_degrees<D, U: UpdateCombine, W>(
    tiles: &mut [GraphTile<D, U, W>],
) -> Result<(), GraphError> {
    for src in 0..tiles.len() {
        let moves = tiles[src]
            .mirrors_mut()
            .map(|mv| (mv.vid(), mv.master_tile(), mv.take_deg()))
            .collect::<Vec<_>>();
        for (vid, master_tile, deg) in moves {
            tiles[master_tile.index()]
                .vertex_mut(vid)
                .ok_or(GraphError::VertexNotFound(vid))?
                .in_deg_add(deg);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::INVALID_VERTEX_ID;

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct MinUpdate(f64);

    impl UpdateCombine for MinUpdate {
        fn identity() -> Self {
            MinUpdate(f64::INFINITY)
        }

        fn combine(&mut self, other: Self) {
            self.0 = self.0.min(other.0);
        }
    }

    type TestTile = GraphTile<f64, MinUpdate, u32>;

    fn two_tiles() -> Vec<TestTile> {
        // Vertices 0 and 1 on tile 0; 2 and 3 on tile 1. Tile 0 has one
        // local edge and two remote ones.
        let mut t0 = TestTile::new(TileId::new(0));
        let mut t1 = TestTile::new(TileId::new(1));
        for vid in &[0, 1] {
            t0.add_vertex(VertexId::new(*vid), 0.0).expect("add_vertex failed");
        }
        for vid in &[2, 3] {
            t1.add_vertex(VertexId::new(*vid), 0.0).expect("add_vertex failed");
        }
        t0.add_edge(VertexId::new(0), VertexId::new(1), TileId::new(0), 1).expect("edge");
        t0.add_edge(VertexId::new(0), VertexId::new(2), TileId::new(1), 1).expect("edge");
        t0.add_edge(VertexId::new(1), VertexId::new(3), TileId::new(1), 1).expect("edge");
        t1.add_edge(VertexId::new(2), VertexId::new(3), TileId::new(1), 1).expect("edge");
        t1.add_edge(VertexId::new(3), VertexId::new(0), TileId::new(0), 1).expect("edge");
        vec![t0, t1]
    }

    #[test]
    fn vertex_lookup() {
        let tiles = two_tiles();
        assert_eq!(tiles[0].vertex(VertexId::new(0)).expect("vertex").vid(), VertexId::new(0));
        assert!(tiles[0].vertex(VertexId::new(11)).is_none());
        assert_eq!(tiles[0].vertex_count(), 2);
        assert_eq!(tiles[1].vertex_count(), 2);
    }

    #[test]
    fn vertex_key_in_use() {
        let mut tiles = two_tiles();
        let err = tiles[0].add_vertex(VertexId::new(0), 0.0).expect_err("duplicate accepted");
        assert_eq!(err, GraphError::KeyInUse(VertexId::new(0)));
        assert_eq!(tiles[0].vertex_count(), 2);
    }

    #[test]
    fn mirrors_track_remote_destinations() {
        let tiles = two_tiles();
        let mv = tiles[0].mirror(VertexId::new(2)).expect("mirror");
        assert_eq!(mv.vid(), VertexId::new(2));
        assert_eq!(mv.master_tile(), TileId::new(1));
        assert!(tiles[0].mirror(VertexId::new(0)).is_none());
        assert_eq!(tiles[0].mirror_count(), 2);
        assert_eq!(tiles[1].mirror_count(), 1);
    }

    #[test]
    fn edge_source_is_always_local() {
        let tiles = two_tiles();
        for tile in &tiles {
            for edge in tile.edges() {
                assert!(tile.vertex(edge.src()).is_some());
            }
        }
    }

    #[test]
    fn edge_unknown_source_rejected() {
        let mut tiles = two_tiles();
        let err = tiles[0]
            .add_edge(VertexId::new(9), VertexId::new(0), TileId::new(0), 1)
            .expect_err("unknown source accepted");
        assert_eq!(err, GraphError::VertexNotFound(VertexId::new(9)));
    }

    #[test]
    fn degree_propagation() {
        let mut tiles = two_tiles();
        // Before propagation the remote in-degrees sit on the mirrors.
        assert_eq!(tiles[0].mirror(VertexId::new(3)).expect("mirror").acc_deg().count(), 1);
        propagate_mirror_degrees(&mut tiles).expect("propagation failed");
        // v3 gets one edge from tile 0 and one from its own tile.
        let v3 = tiles[1].vertex(VertexId::new(3)).expect("vertex");
        assert_eq!(v3.in_deg().count(), 2);
        let v0 = tiles[0].vertex(VertexId::new(0)).expect("vertex");
        assert_eq!(v0.in_deg().count(), 1);
        assert_eq!(v0.out_deg().count(), 2);
        // Accumulators are zeroed.
        assert_eq!(tiles[0].mirror(VertexId::new(3)).expect("mirror").acc_deg().count(), 0);
    }

    #[test]
    fn sorted_flag_follows_appends() {
        let mut tile = TestTile::new(TileId::new(0));
        assert!(tile.edge_sorted());
        for vid in 0..3 {
            tile.add_vertex(VertexId::new(vid), 0.0).expect("add_vertex failed");
        }
        // In-order appends keep the flag.
        tile.add_edge(VertexId::new(0), VertexId::new(1), TileId::new(0), 1).expect("edge");
        tile.add_edge(VertexId::new(0), VertexId::new(2), TileId::new(0), 1).expect("edge");
        assert!(tile.edge_sorted());
        // An out-of-order append flips it; sorting restores it.
        tile.add_edge(VertexId::new(0), VertexId::new(1), TileId::new(0), 1).expect("edge");
        assert!(!tile.edge_sorted());
        tile.sort_edges();
        assert!(tile.edge_sorted());
        assert_eq!(tile.edges().len(), 3);
    }

    #[test]
    fn finalize_freezes_structure() {
        let mut tiles = two_tiles();
        propagate_mirror_degrees(&mut tiles).expect("propagation failed");
        for tile in &mut tiles {
            tile.finalize();
        }
        assert!(tiles[0].finalized());
        assert!(tiles[0].edge_sorted());
        assert_eq!(
            tiles[0].add_vertex(VertexId::new(7), 0.0),
            Err(GraphError::Permission("add_vertex"))
        );
        assert_eq!(
            tiles[0].add_edge(VertexId::new(0), VertexId::new(1), TileId::new(0), 1),
            Err(GraphError::Permission("add_edge"))
        );
    }

    #[test]
    fn mirror_accumulates_updates() {
        let mut tiles = two_tiles();
        let view = tiles[0].scatter_view();
        let mv = view.mirrors.get_mut(&VertexId::new(2)).expect("mirror");
        mv.accumulate(MinUpdate(3.0));
        mv.accumulate(MinUpdate(1.5));
        mv.accumulate(MinUpdate(2.5));
        assert_eq!(mv.take_update(), MinUpdate(1.5));
        // Taking resets to the combine identity.
        assert_eq!(mv.take_update(), MinUpdate::identity());
    }

    #[test]
    fn invalid_vertex_id_is_reserved() {
        let tiles = two_tiles();
        assert!(tiles[0].vertex(INVALID_VERTEX_ID).is_none());
    }
}
