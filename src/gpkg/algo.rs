use std::collections::BTreeMap;
use std::ops::Range;

use crate::gpkg::types::{TileOrigin, TileRef, ZoomLevelMetadata};
use crate::projection::Projection;

#[derive(Debug, Clone, Copy)]
struct TileExtent {
    min_col: u32,
    max_col: u32,
    min_row: u32,
    max_row: u32,
}

impl TileExtent {
    fn new(tile: &TileRef) -> Self {
        Self {
            min_col: tile.column,
            max_col: tile.column,
            min_row: tile.row,
            max_row: tile.row,
        }
    }

    fn include(&mut self, tile: &TileRef) {
        self.min_col = self.min_col.min(tile.column);
        self.max_col = self.max_col.max(tile.column);
        self.min_row = self.min_row.min(tile.row);
        self.max_row = self.max_row.max(tile.row);
    }
}

/// Builds one metadata record per zoom level present in `tiles`, ordered by
/// zoom. A level directly below an already-built level inherits its parent's
/// extent doubled, so every level covers the same area as the shallowest one.
pub fn build_zoom_metadata(
    tiles: &[TileRef],
    origin: TileOrigin,
    projection: &dyn Projection,
) -> Vec<ZoomLevelMetadata> {
    let mut extents: BTreeMap<u8, TileExtent> = BTreeMap::new();
    for tile in tiles {
        extents
            .entry(tile.zoom)
            .and_modify(|extent| extent.include(tile))
            .or_insert_with(|| TileExtent::new(tile));
    }

    let mut levels: Vec<ZoomLevelMetadata> = Vec::with_capacity(extents.len());
    for (zoom, extent) in extents {
        let parent = levels
            .last()
            .filter(|prev| zoom.checked_sub(1) == Some(prev.zoom));
        let mut level = match parent {
            Some(parent) => ZoomLevelMetadata::derived_from(parent),
            None => ZoomLevelMetadata::from_ranges(
                zoom,
                extent.min_col,
                extent.max_col,
                extent.min_row,
                extent.max_row,
            ),
        };
        let [min_x, min_y, max_x, max_y] = level_bounds(&level, origin, projection);
        level.min_x = min_x;
        level.min_y = min_y;
        level.max_x = max_x;
        level.max_y = max_y;
        levels.push(level);
    }
    levels
}

/// Projected `[min_x, min_y, max_x, max_y]` of a level's tile range.
pub fn level_bounds(
    level: &ZoomLevelMetadata,
    origin: TileOrigin,
    projection: &dyn Projection,
) -> [f64; 4] {
    let zoom = level.zoom;
    let min_row = i64::from(level.min_row);
    let max_row = i64::from(level.max_row);
    let (top_row, bottom_row) = match origin {
        TileOrigin::BottomLeft => (max_row + 1, min_row),
        TileOrigin::TopLeft => (
            projection.invert_row(zoom, min_row) + 1,
            projection.invert_row(zoom, max_row),
        ),
    };
    let (min_x, max_y) = projection.tile_origin_coord(zoom, i64::from(level.min_col), top_row);
    let (max_x, min_y) =
        projection.tile_origin_coord(zoom, i64::from(level.max_col) + 1, bottom_row);
    [min_x, min_y, max_x, max_y]
}

pub fn find_level(levels: &[ZoomLevelMetadata], zoom: u8) -> Option<&ZoomLevelMetadata> {
    levels
        .binary_search_by_key(&zoom, |level| level.zoom)
        .ok()
        .map(|index| &levels[index])
}

/// Matrix-local `(column, row)` of a tile, with row 0 at the top of the
/// level. Returns `None` when the tile falls before the level's first
/// column or row.
pub fn matrix_position(
    level: &ZoomLevelMetadata,
    tile: &TileRef,
    origin: TileOrigin,
    projection: &dyn Projection,
) -> Option<(u32, u32)> {
    let column = i64::from(tile.column) - i64::from(level.min_col);
    let row = match origin {
        TileOrigin::BottomLeft => {
            projection.invert_row(tile.zoom, i64::from(tile.row))
                - projection.invert_row(tile.zoom, i64::from(level.max_row))
        }
        TileOrigin::TopLeft => i64::from(tile.row) - i64::from(level.min_row),
    };
    Some((u32::try_from(column).ok()?, u32::try_from(row).ok()?))
}

/// Splits `tiles` into exactly `worker_count` contiguous slices by recursive
/// halving. Slices may be empty when there are fewer tiles than workers.
pub fn allocate(worker_count: usize, tiles: Range<usize>) -> Vec<Range<usize>> {
    if worker_count <= 1 {
        return vec![tiles];
    }
    let head_workers = worker_count / 2;
    let mid = tiles.start + tiles.len() * head_workers / worker_count;
    let mut slices = allocate(head_workers, tiles.start..mid);
    slices.extend(allocate(worker_count - head_workers, mid..tiles.end));
    slices
}
