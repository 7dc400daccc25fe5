use crate::error::{
    file_error, invalid_argument_error, key_in_use_error, range_error, GtError,
};
use crate::util::io::get_file_lines;
use crate::util::memory_usage::print_memory_usage;
use crate::util::timer::GtTimer;
use gt_kernel_api::{
    propagate_mirror_degrees, EdgeWeight, GraphTile, TileId, UpdateCombine, VertexId,
};
use hashbrown::HashMap;
use itertools::Itertools;
use log::info;

/// Builds graph tiles from an edge-list file and an optional partition file.
///
/// Edge-list lines are `<src> <dst> [<weight>]`; partition lines are
/// `<vid> <tid>`. Lines starting with `#` and blank lines are ignored in
/// both. A missing weight falls back to `default_weight`.
///
/// The graph is partitioned iff `tile_count != 1`; the partition file is
/// then required, and every edge endpoint must appear in it. The tile index
/// read from the file is divided by `tile_merge_factor` and must stay below
/// `tile_count`. In the unpartitioned case vertices are created in tile 0 on
/// first sight and the partition file is ignored.
///
/// With `finalize` set, mirror degrees are propagated to their masters and
/// every tile is sorted and frozen; otherwise edges are only sorted.
pub fn tiles_from_edge_list<D, U, W, F>(
    tile_count: usize,
    edge_list_path: &str,
    partition_path: Option<&str>,
    default_weight: W,
    tile_merge_factor: usize,
    finalize: bool,
    vertex_data: F,
) -> Result<Vec<GraphTile<D, U, W>>, GtError>
where
    U: UpdateCombine,
    W: EdgeWeight,
    F: Fn(VertexId) -> D,
{
    if tile_count == 0 {
        return Err(invalid_argument_error("Tile count must be positive".to_string()));
    }
    if tile_merge_factor == 0 {
        return Err(invalid_argument_error("Tile merge factor must be positive".to_string()));
    }

    let mut tiles =
        (0..tile_count).map(|tid| GraphTile::new(TileId::new(tid as u64))).collect::<Vec<_>>();

    let partitioned = tile_count != 1;

    // Read vertices and their partitioned tile number, build the map.
    let mut tid_map: HashMap<VertexId, TileId> = HashMap::new();
    if partitioned {
        let partition_path = match partition_path {
            Some(path) if !path.is_empty() => path,
            _ => {
                return Err(file_error(format!(
                    "A partition file is required for {} tiles",
                    tile_count
                )))
            }
        };
        info!("Loading partition from file '{}'", partition_path);
        let timer = GtTimer::now();
        for (index, line) in get_file_lines(partition_path)?.enumerate() {
            if is_skipped(&line) {
                continue;
            }
            let mut parts = line.split_whitespace();
            let vid = parse_vid(parts.next(), index, partition_path)?;
            let tid = parts
                .next()
                .and_then(|t| t.parse::<u64>().ok())
                .ok_or_else(|| {
                    file_error(format!(
                        "Could not parse tile id at line {} in file '{}'",
                        index + 1,
                        partition_path
                    ))
                })?;

            // Merge tiles.
            let tid = TileId::new(tid / tile_merge_factor as u64);
            if tid.index() >= tile_count {
                return Err(range_error(format!(
                    "Tile id {} at line {} in file '{}' exceeds tile count {}",
                    tid,
                    index + 1,
                    partition_path,
                    tile_count
                )));
            }

            if tid_map.insert(vid, tid).is_some() {
                return Err(key_in_use_error(format!(
                    "Duplicate vertex id {} at line {} in file '{}'",
                    vid,
                    index + 1,
                    partition_path
                )));
            }
            tiles[tid.index()].add_vertex(vid, vertex_data(vid))?;

            if index > 0 && index % 500_000 == 0 {
                info!("Processed {} vertices in {}", index, timer.elapsed().to_seconds_string());
            }
        }
    }

    // Read the edge-list file, build the graph tiles.
    info!("Loading edges from file '{}'", edge_list_path);
    let timer = GtTimer::now();
    let mut total_edges = 0_usize;
    for (index, line) in get_file_lines(edge_list_path)?.enumerate() {
        if is_skipped(&line) {
            continue;
        }
        let mut parts = line.split_whitespace();
        let src = parse_vid(parts.next(), index, edge_list_path)?;
        let dst = parse_vid(parts.next(), index, edge_list_path)?;
        let weight = match parts.next() {
            Some(token) => token.parse::<W>().map_err(|_| {
                file_error(format!(
                    "Could not parse edge weight '{}' at line {} in file '{}'",
                    token,
                    index + 1,
                    edge_list_path
                ))
            })?,
            None => default_weight,
        };

        let (src_tid, dst_tid) = if partitioned {
            (
                vertex_tile(&tid_map, src, edge_list_path)?,
                vertex_tile(&tid_map, dst, edge_list_path)?,
            )
        } else {
            // Single tile: create vertices on first sight.
            if !tiles[0].has_vertex(src) {
                tiles[0].add_vertex(src, vertex_data(src))?;
            }
            if !tiles[0].has_vertex(dst) {
                tiles[0].add_vertex(dst, vertex_data(dst))?;
            }
            (TileId::new(0), TileId::new(0))
        };

        tiles[src_tid.index()].add_edge(src, dst, dst_tid, weight)?;
        total_edges += 1;

        if total_edges % 1_000_000 == 0 {
            info!("Processed {} edges in {}", total_edges, timer.elapsed().to_seconds_string());
        }
    }

    if finalize {
        propagate_mirror_degrees(&mut tiles)?;
        for tile in &mut tiles {
            tile.finalize();
        }
    } else {
        for tile in &mut tiles {
            tile.sort_edges();
        }
    }

    let total_vertices = tiles.iter().map(GraphTile::vertex_count).sum::<usize>();
    info!(
        "Loaded {} vertices and {} edges into {} tiles in {}",
        total_vertices,
        total_edges,
        tile_count,
        timer.elapsed().to_seconds_string()
    );
    info!(
        "Tile sizes: {}",
        tiles
            .iter()
            .map(|tile| format!(
                "{}v/{}e/{}m",
                tile.vertex_count(),
                tile.edge_count(),
                tile.mirror_count()
            ))
            .join(" ")
    );
    print_memory_usage(format_args!("after graph load"));

    Ok(tiles)
}

fn is_skipped(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with('#')
}

fn parse_vid(token: Option<&str>, index: usize, file_path: &str) -> Result<VertexId, GtError> {
    token.and_then(|t| t.parse::<u64>().ok()).map(VertexId::new).ok_or_else(|| {
        file_error(format!(
            "Could not parse vertex id at line {} in file '{}'",
            index + 1,
            file_path
        ))
    })
}

fn vertex_tile(
    tid_map: &HashMap<VertexId, TileId>,
    vid: VertexId,
    file_path: &str,
) -> Result<TileId, GtError> {
    tid_map.get(&vid).copied().ok_or_else(|| {
        range_error(format!(
            "Vertex {} in file '{}' is not present in the partition file",
            vid, file_path
        ))
    })
}
