use anyhow::Result;
use serde_json::json;

use crate::gpkg::ConversionReport;

pub fn ndjson_lines(report: &ConversionReport) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    lines.push(serde_json::to_string(&json!({
        "type": "summary",
        "output": report.output.display().to_string(),
        "srs": report.srs,
        "origin": report.origin,
        "input_tiles": report.input_tiles,
        "tile_count": report.tile_count,
        "workers": report.workers,
        "merged_parts": report.merged_parts,
        "counts": report.counts,
        "bounds": report.bounds,
    }))?);

    for level in report.levels.iter() {
        lines.push(serde_json::to_string(&json!({
            "type": "tile_matrix",
            "level": level,
        }))?);
    }

    Ok(lines)
}

pub fn text_lines(report: &ConversionReport) -> Vec<String> {
    let mut lines = vec![
        format!("output: {}", report.output.display()),
        format!("srs: EPSG:{} origin: {}", report.srs, report.origin),
        format!(
            "tiles: input={} stored={} skipped={} workers={} parts={}",
            report.input_tiles,
            report.tile_count,
            report.counts.skipped,
            report.workers,
            report.merged_parts
        ),
        format!(
            "formats: png={} jpeg={} unknown={} bytes={}",
            report.counts.png, report.counts.jpeg, report.counts.unknown_format, report.counts.bytes
        ),
    ];
    if report.counts.partially_transparent > 0 || report.counts.fully_transparent > 0 {
        lines.push(format!(
            "transparency: partial={} full={}",
            report.counts.partially_transparent, report.counts.fully_transparent
        ));
    }
    let [min_x, min_y, max_x, max_y] = report.bounds;
    lines.push(format!("bounds: {min_x:.2} {min_y:.2} {max_x:.2} {max_y:.2}"));
    for level in report.levels.iter() {
        lines.push(format!(
            "zoom {}: matrix {}x{} columns {}-{} rows {}-{}",
            level.zoom,
            level.matrix_width,
            level.matrix_height,
            level.min_col,
            level.max_col,
            level.min_row,
            level.max_row
        ));
    }
    lines
}
