use std::path::PathBuf;

use serde::Serialize;

use crate::codec::{EncodedTile, Transparency};
use crate::format::TileFormat;
use crate::gpkg::types::ZoomLevelMetadata;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TileCounts {
    pub written: u64,
    pub skipped: u64,
    pub png: u64,
    pub jpeg: u64,
    pub unknown_format: u64,
    pub partially_transparent: u64,
    pub fully_transparent: u64,
    pub bytes: u64,
}

impl TileCounts {
    pub fn record(&mut self, tile: &EncodedTile) {
        self.written += 1;
        self.bytes += tile.data.len() as u64;
        match tile.format {
            Some(TileFormat::Png) => self.png += 1,
            Some(TileFormat::Jpeg) => self.jpeg += 1,
            None => self.unknown_format += 1,
        }
        match tile.transparency {
            Some(Transparency::Partial) => self.partially_transparent += 1,
            Some(Transparency::Full) => self.fully_transparent += 1,
            Some(Transparency::Opaque) | None => {}
        }
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn merge(&mut self, other: &TileCounts) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.png += other.png;
        self.jpeg += other.jpeg;
        self.unknown_format += other.unknown_format;
        self.partially_transparent += other.partially_transparent;
        self.fully_transparent += other.fully_transparent;
        self.bytes += other.bytes;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub worker: usize,
    pub part: PathBuf,
    pub counts: TileCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub output: PathBuf,
    pub srs: i32,
    pub origin: String,
    pub input_tiles: u64,
    pub workers: usize,
    pub merged_parts: usize,
    pub tile_count: u64,
    pub counts: TileCounts,
    pub bounds: [f64; 4],
    pub levels: Vec<ZoomLevelMetadata>,
}
