use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::format::TileFormat;
use crate::gpkg::TileRef;
use crate::projection::MAX_ZOOM;

/// Walks `root` for `zoom/column/row.ext` image files, sorted by
/// `(zoom, column, row)`. Image files whose path segments are not numeric,
/// or whose zoom is deeper than [`MAX_ZOOM`], are skipped with a warning.
pub fn scan_tile_dir(root: &Path) -> Result<Vec<TileRef>> {
    if !root.is_dir() {
        anyhow::bail!("source tile directory does not exist: {}", root.display());
    }
    let mut tiles = Vec::new();
    let mut skipped = 0u64;
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || TileFormat::from_extension(path).is_none() {
            continue;
        }
        match parse_tile_path(path) {
            Some(tile) if tile.zoom <= MAX_ZOOM => tiles.push(tile),
            Some(tile) => {
                skipped += 1;
                tracing::warn!(
                    path = %path.display(),
                    zoom = tile.zoom,
                    max_zoom = MAX_ZOOM,
                    "skipping tile beyond the deepest supported zoom level"
                );
            }
            None => {
                skipped += 1;
                tracing::warn!(
                    path = %path.display(),
                    "skipping image with non-numeric z/x/y path"
                );
            }
        }
    }
    tiles.sort_by_key(|tile| (tile.zoom, tile.column, tile.row));
    tracing::info!(
        tiles = tiles.len(),
        skipped,
        source = %root.display(),
        "scanned tile directory"
    );
    Ok(tiles)
}

/// Reads `zoom/column/row.ext` from the last three path segments.
pub fn parse_tile_path(path: &Path) -> Option<TileRef> {
    let row = path.file_stem()?.to_str()?.parse().ok()?;
    let column_dir = path.parent()?;
    let column = column_dir.file_name()?.to_str()?.parse().ok()?;
    let zoom = column_dir.parent()?.file_name()?.to_str()?.parse().ok()?;
    Some(TileRef {
        zoom,
        column,
        row,
        path: path.to_path_buf(),
    })
}
