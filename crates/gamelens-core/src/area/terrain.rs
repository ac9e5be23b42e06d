//! Height grid and tile-name reconstruction from the terrain metadata.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::area::GridPoint;
use crate::memory::layout::area::{
    SubTileStruct, TILE_HEIGHT_FINAL_MULTIPLIER, TILE_TO_GRID_CONVERSION, TerrainStruct,
    TgtFileStruct, TileStructure,
};
use crate::memory::{NativeRead, ReadMemory};

/// Rotation selector to permutation group
const ROTATION_SELECTOR: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Groups of three: axis swap, x flip, y flip
const ROTATOR_HELPER: [u8; 27] = [
    0, 1, 1, //
    1, 1, 0, //
    0, 0, 0, //
    1, 0, 1, //
    0, 0, 1, //
    1, 1, 1, //
    0, 1, 0, //
    1, 0, 0, //
    0, 1, 1, //
];

/// Start of the permutation used for unknown selectors
const DEFAULT_PERMUTATION: usize = 24;

const MAX_TILES_PER_AXIS: i64 = 256;

/// Tile counts along x and y, `None` when the metadata is unusable
fn tile_counts(terrain: &TerrainStruct) -> Option<(usize, usize)> {
    let valid = |count: i64| count > 0 && count <= MAX_TILES_PER_AXIS;
    if !valid(terrain.total_tiles_x) || !valid(terrain.total_tiles_y) {
        if terrain.total_tiles_x != 0 || terrain.total_tiles_y != 0 {
            warn!(
                "Ignoring terrain of {}x{} tiles",
                terrain.total_tiles_x, terrain.total_tiles_y
            );
        }
        return None;
    }
    Some((
        terrain.total_tiles_x as usize,
        terrain.total_tiles_y as usize,
    ))
}

/// Tile counts plus the tile table, `None` unless the table covers every tile
fn read_tiles(
    reader: &dyn ReadMemory,
    terrain: &TerrainStruct,
) -> Option<(usize, usize, Vec<TileStructure>)> {
    let (tiles_x, tiles_y) = tile_counts(terrain)?;
    let tiles: Vec<TileStructure> = reader.read_std_vector(&terrain.tile_details);
    if tiles.len() < tiles_x * tiles_y {
        warn!(
            "Ignoring terrain of {}x{} tiles with only {} tile records",
            tiles_x,
            tiles_y,
            tiles.len()
        );
        return None;
    }
    Some((tiles_x, tiles_y, tiles))
}

/// Map a cell offset inside its tile through the tile's rotation
fn rotated_offset(rotation_selector: u8, x: usize, y: usize) -> (usize, usize) {
    let helper = ROTATION_SELECTOR
        .get(rotation_selector as usize)
        .map_or(DEFAULT_PERMUTATION, |&group| group as usize * 3)
        .min(DEFAULT_PERMUTATION);

    let last = TILE_TO_GRID_CONVERSION - 1;
    let candidates = [last - x, x, last - y, y];
    let swap = ROTATOR_HELPER[helper] as usize;
    let flip_x = ROTATOR_HELPER[helper + 1] as usize;
    let flip_y = ROTATOR_HELPER[helper + 2] as usize;
    let y_base = if swap == 0 { 2 } else { 0 };

    (candidates[swap * 2 + flip_x], candidates[flip_y + y_base])
}

/// Height contributed by the subtile itself. Always zero for this layout.
fn subtile_height_offset(_heights: &[i8], x: usize, y: usize) -> i32 {
    if x >= TILE_TO_GRID_CONVERSION || y >= TILE_TO_GRID_CONVERSION {
        return 0;
    }
    0
}

/// Terrain height for every grid cell, row-major by y
pub fn height_grid(reader: &dyn ReadMemory, terrain: &TerrainStruct) -> Vec<Vec<f32>> {
    let Some((tiles_x, tiles_y, tiles)) = read_tiles(reader, terrain) else {
        return Vec::new();
    };

    let distinct: HashSet<u64> = tiles.iter().map(|t| t.sub_tile_details_ptr).collect();
    let subtiles: HashMap<u64, Vec<i8>> = distinct
        .into_par_iter()
        .map(|address| {
            let subtile: SubTileStruct = reader.read_value(address);
            (address, reader.read_std_vector(&subtile.sub_tile_height))
        })
        .collect();
    debug!(
        "Decoded {} distinct subtiles for {} tiles",
        subtiles.len(),
        tiles.len()
    );

    let width = tiles_x * TILE_TO_GRID_CONVERSION;
    let height = tiles_y * TILE_TO_GRID_CONVERSION;
    let multiplier = terrain.tile_height_multiplier as f32;

    (0..height)
        .into_par_iter()
        .map(|y| {
            let mut row = vec![0.0f32; width];
            let tile_row = y / TILE_TO_GRID_CONVERSION * tiles_x;
            for (x, cell) in row.iter_mut().enumerate() {
                let Some(tile) = tiles.get(tile_row + x / TILE_TO_GRID_CONVERSION) else {
                    continue;
                };
                let Some(heights) = subtiles.get(&tile.sub_tile_details_ptr) else {
                    continue;
                };
                let (sub_x, sub_y) = rotated_offset(
                    tile.rotation_selector,
                    x % TILE_TO_GRID_CONVERSION,
                    y % TILE_TO_GRID_CONVERSION,
                );
                let offset = subtile_height_offset(heights, sub_x, sub_y);
                *cell = (tile.tile_height as f32 * multiplier + offset as f32)
                    * TILE_HEIGHT_FINAL_MULTIPLIER
                    * -1.0;
            }
            row
        })
        .collect()
}

/// Grid origins of every tile, grouped by tile name
pub fn tile_locations(
    reader: &dyn ReadMemory,
    terrain: &TerrainStruct,
) -> HashMap<String, Vec<GridPoint>> {
    let Some((tiles_x, _, tiles)) = read_tiles(reader, terrain) else {
        return HashMap::new();
    };

    tiles
        .par_iter()
        .enumerate()
        .fold(HashMap::new, |mut local: HashMap<String, Vec<GridPoint>>, (index, tile)| {
            let tgt: TgtFileStruct = reader.read_value(tile.tgt_file_ptr);
            let path = reader.read_wide_string(&tgt.tgt_path);
            if path.is_empty() {
                return local;
            }
            let name = if tile.rotation_selector % 2 != 0 {
                format!("{}x:{}-y:{}", path, tile.tile_id_y, tile.tile_id_x)
            } else {
                format!("{}x:{}-y:{}", path, tile.tile_id_x, tile.tile_id_y)
            };
            let origin = GridPoint::new(
                ((index % tiles_x) * TILE_TO_GRID_CONVERSION) as f32,
                ((index / tiles_x) * TILE_TO_GRID_CONVERSION) as f32,
            );
            local.entry(name).or_default().push(origin);
            local
        })
        .reduce(HashMap::new, |mut merged, local| {
            for (name, mut origins) in local {
                merged.entry(name).or_default().append(&mut origins);
            }
            merged
        })
}
