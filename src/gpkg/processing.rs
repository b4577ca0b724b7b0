use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::codec::{TileEncoder, encoder_for};
use crate::gpkg::algo::{allocate, build_zoom_metadata, find_level, matrix_position};
use crate::gpkg::stats::{ConversionReport, TileCounts, WorkerReport};
use crate::gpkg::store::{GeoPackage, PartContainer, discover_parts};
use crate::gpkg::types::{ConvertOptions, NormalizedTile, TileOrigin, TileRef, ZoomLevelMetadata};
use crate::inventory::scan_tile_dir;
use crate::projection::Srs;

/// Read-only state shared by every worker.
pub struct WorkerConfig {
    pub part_dir: PathBuf,
    pub levels: Arc<Vec<ZoomLevelMetadata>>,
    pub origin: TileOrigin,
    pub srs: Srs,
    pub encoder: Arc<dyn TileEncoder>,
}

/// Writes `tiles` into a fresh part container, returning its path and counts.
/// Tiles that fall outside their level's matrix are skipped with a warning.
/// `progress` advances once per tile.
pub fn run_worker(
    worker: usize,
    tiles: &[TileRef],
    config: &WorkerConfig,
    progress: &ProgressBar,
) -> Result<WorkerReport> {
    let projection = config.srs.projection();
    let mut part = PartContainer::create_in(&config.part_dir)?;
    let mut counts = TileCounts::default();

    for tile in tiles {
        let level = find_level(&config.levels, tile.zoom)
            .with_context(|| format!("no tile matrix for zoom level {}", tile.zoom))?;
        let Some((column, row)) = matrix_position(level, tile, config.origin, projection) else {
            tracing::warn!(
                worker,
                zoom = tile.zoom,
                column = tile.column,
                row = tile.row,
                "tile lies outside its zoom level matrix; skipping"
            );
            counts.record_skipped();
            progress.inc(1);
            continue;
        };
        let source = fs::read(&tile.path)
            .with_context(|| format!("failed to read tile: {}", tile.path.display()))?;
        let encoded = config
            .encoder
            .encode(&source)
            .with_context(|| format!("failed to encode tile: {}", tile.path.display()))?;
        counts.record(&encoded);
        part.insert_tile(&NormalizedTile {
            zoom: tile.zoom,
            column,
            row,
            data: encoded.data,
        })?;
        progress.inc(1);
    }

    let part = part.finish()?;
    tracing::debug!(worker, part = %part.display(), tiles = counts.written, "worker finished");
    Ok(WorkerReport {
        worker,
        part,
        counts,
    })
}

/// Runs one worker per non-empty slice of `tiles`. A single slice runs on the
/// calling thread. Every worker is awaited before the first failure, if any,
/// is returned.
pub fn run_workers(
    tiles: Arc<Vec<TileRef>>,
    config: Arc<WorkerConfig>,
    worker_count: usize,
    progress: &ProgressBar,
) -> Result<Vec<WorkerReport>> {
    let slices: Vec<_> = allocate(worker_count, 0..tiles.len())
        .into_iter()
        .filter(|slice| !slice.is_empty())
        .collect();

    if slices.len() <= 1 {
        return Ok(vec![run_worker(0, &tiles[..], &config, progress)?]);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(slices.len())
        .thread_name(|index| format!("tiles2gpkg-worker-{index}"))
        .panic_handler(|_| tracing::error!("tile worker panicked"))
        .build()
        .context("failed to build worker pool")?;
    let (tx, rx) = crossbeam_channel::unbounded();
    for (worker, slice) in slices.iter().cloned().enumerate() {
        tracing::info!(worker, start = slice.start, tiles = slice.len(), "spawning worker");
        let tx = tx.clone();
        let tiles = Arc::clone(&tiles);
        let config = Arc::clone(&config);
        let progress = progress.clone();
        pool.spawn(move || {
            let result = run_worker(worker, &tiles[slice], &config, &progress);
            let _ = tx.send((worker, result));
        });
    }
    drop(tx);

    let mut reports = Vec::with_capacity(slices.len());
    let mut failures = Vec::new();
    while reports.len() + failures.len() < slices.len() {
        match rx.recv() {
            Ok((_, Ok(report))) => reports.push(report),
            Ok((worker, Err(err))) => {
                let err = err.context(format!("worker {worker} failed"));
                tracing::error!(error = ?err, "tile worker failed");
                failures.push(err);
            }
            Err(_) => {
                anyhow::bail!(
                    "{} worker(s) exited without reporting",
                    slices.len() - reports.len() - failures.len()
                );
            }
        }
    }

    if let Some(err) = failures.into_iter().next() {
        return Err(err);
    }
    reports.sort_by_key(|report| report.worker);
    Ok(reports)
}

/// Converts a z/x/y tile folder into a new GeoPackage.
pub fn convert_tiles(options: &ConvertOptions) -> Result<ConversionReport> {
    options.validate()?;
    let tiles = scan_tile_dir(&options.source)?;
    if tiles.is_empty() {
        anyhow::bail!(
            "no tiles found in {}; check that the source tile directory is correct",
            options.source.display()
        );
    }
    let input_tiles = tiles.len() as u64;

    let projection = options.srs.projection();
    let levels = Arc::new(build_zoom_metadata(&tiles, options.origin, projection));
    for level in levels.iter() {
        tracing::debug!(
            zoom = level.zoom,
            matrix_width = level.matrix_width,
            matrix_height = level.matrix_height,
            "built tile matrix"
        );
    }

    let part_dir = options.part_dir();
    let mut gpkg = GeoPackage::create(&options.output, options.srs)?;
    let config = Arc::new(WorkerConfig {
        part_dir: part_dir.clone(),
        levels: Arc::clone(&levels),
        origin: options.origin,
        srs: gpkg.srs(),
        encoder: encoder_for(options.imagery, options.jpeg_quality()),
    });
    let workers = options.worker_count().min(tiles.len());

    let progress = make_progress_bar(input_tiles, "tiles", options.no_progress)?;
    let reports = match run_workers(Arc::new(tiles), config, workers, &progress) {
        Ok(reports) => reports,
        Err(err) => {
            progress.abandon();
            discard_output(&part_dir, gpkg);
            return Err(err);
        }
    };
    progress.finish_and_clear();

    let mut counts = TileCounts::default();
    for report in &reports {
        counts.merge(&report.counts);
    }

    let merge_progress = make_progress_bar(reports.len() as u64, "parts", options.no_progress)?;
    let merged = gpkg.merge_parts(&part_dir, &merge_progress)?;
    merge_progress.finish_and_clear();
    if merged.parts != reports.len() {
        tracing::warn!(
            merged = merged.parts,
            workers = reports.len(),
            dir = %part_dir.display(),
            "part container count differs from worker count"
        );
    }

    gpkg.finalize(&levels)?;
    let tile_count = gpkg.tile_count()?;
    gpkg.close()?;

    let bounds = levels.first().map(|level| level.bounds()).unwrap_or_default();
    tracing::info!(
        output = %options.output.display(),
        tiles = tile_count,
        skipped = counts.skipped,
        zoom_levels = levels.len(),
        "geopackage written"
    );

    Ok(ConversionReport {
        output: options.output.clone(),
        srs: options.srs.code(),
        origin: options.origin.as_str().to_string(),
        input_tiles,
        workers: reports.len(),
        merged_parts: merged.parts,
        tile_count,
        counts,
        bounds,
        levels: levels.to_vec(),
    })
}

/// Removes part containers and the partially written output after a
/// worker failure. Cleanup errors are logged, not returned.
fn discard_output(part_dir: &Path, gpkg: GeoPackage) {
    let output = gpkg.path().to_path_buf();
    if let Err(err) = gpkg.close() {
        tracing::warn!(error = ?err, "failed to close geopackage during cleanup");
    }
    match discover_parts(part_dir) {
        Ok(parts) => {
            for part in parts {
                if let Err(err) = fs::remove_file(&part) {
                    tracing::warn!(
                        part = %part.display(),
                        error = %err,
                        "failed to remove part container"
                    );
                }
            }
        }
        Err(err) => tracing::warn!(error = ?err, "failed to list part containers for cleanup"),
    }
    if let Err(err) = fs::remove_file(&output) {
        tracing::warn!(output = %output.display(), error = %err, "failed to remove partial output");
    }
}

fn make_progress_bar(total: u64, message: &'static str, hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("invalid progress bar template")?
            .progress_chars("=>-"),
    );
    bar.set_message(message);
    Ok(bar)
}
