use std::path::PathBuf;

use anyhow::{Result, bail};
use serde::Serialize;

use crate::format::ImageMode;
use crate::projection::Srs;

pub const DEFAULT_JPEG_QUALITY: u8 = 75;
pub const MAX_JPEG_QUALITY: u8 = 99;

/// A source tile found on disk, addressed by its folder coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRef {
    pub zoom: u8,
    pub column: u32,
    pub row: u32,
    pub path: PathBuf,
}

/// Row numbering of the source folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileOrigin {
    /// TMS: row 0 is the southernmost row.
    #[default]
    BottomLeft,
    /// WMTS/XYZ: row 0 is the northernmost row.
    TopLeft,
}

impl TileOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            TileOrigin::BottomLeft => "bottom-left",
            TileOrigin::TopLeft => "top-left",
        }
    }
}

/// Extent and tile-matrix shape of one zoom level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoomLevelMetadata {
    pub zoom: u8,
    pub min_col: u32,
    pub max_col: u32,
    pub min_row: u32,
    pub max_row: u32,
    pub matrix_width: u32,
    pub matrix_height: u32,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ZoomLevelMetadata {
    /// Level spanning the observed ranges; a zero spread still counts as one.
    pub fn from_ranges(zoom: u8, min_col: u32, max_col: u32, min_row: u32, max_row: u32) -> Self {
        Self {
            zoom,
            min_col,
            max_col,
            min_row,
            max_row,
            matrix_width: (max_col - min_col).max(1),
            matrix_height: (max_row - min_row).max(1),
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        }
    }

    /// The next zoom level down, covering exactly the area of `parent`.
    /// Indices saturate at `u32::MAX`.
    pub fn derived_from(parent: &ZoomLevelMetadata) -> Self {
        let double = |index: u32| index.saturating_mul(2);
        Self {
            zoom: parent.zoom.saturating_add(1),
            min_col: double(parent.min_col),
            max_col: double(parent.max_col).saturating_add(1),
            min_row: double(parent.min_row),
            max_row: double(parent.max_row).saturating_add(1),
            matrix_width: double(parent.matrix_width),
            matrix_height: double(parent.matrix_height),
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        }
    }

    pub fn bounds(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// A tile ready for storage: matrix-local coordinates and encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTile {
    pub zoom: u8,
    pub column: u32,
    pub row: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub source: PathBuf,
    pub output: PathBuf,
    pub origin: TileOrigin,
    pub srs: Srs,
    pub imagery: ImageMode,
    pub quality: Option<u8>,
    pub threads: Option<usize>,
    pub parallel: bool,
    pub no_progress: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            output: PathBuf::new(),
            origin: TileOrigin::BottomLeft,
            srs: Srs::WebMercator,
            imagery: ImageMode::Source,
            quality: None,
            threads: None,
            parallel: true,
            no_progress: false,
        }
    }
}

impl ConvertOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.source.is_dir() {
            bail!("source tile directory does not exist: {}", self.source.display());
        }
        if self.output.exists() {
            bail!("output file already exists: {}", self.output.display());
        }
        if self.quality.is_some() && self.imagery == ImageMode::Png {
            bail!("jpeg quality cannot be combined with png imagery");
        }
        if self.quality.is_some_and(|quality| quality > MAX_JPEG_QUALITY) {
            bail!("jpeg quality must be between 0 and {MAX_JPEG_QUALITY}");
        }
        if self.threads == Some(0) {
            bail!("threads must be at least 1");
        }
        let part_dir = self.part_dir();
        if !part_dir.is_dir() {
            bail!("output directory does not exist: {}", part_dir.display());
        }
        Ok(())
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.quality.unwrap_or(DEFAULT_JPEG_QUALITY)
    }

    pub fn worker_count(&self) -> usize {
        if !self.parallel {
            return 1;
        }
        self.threads
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }

    /// Directory holding part containers: the output's parent, or `.`.
    pub fn part_dir(&self) -> PathBuf {
        match self.output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
