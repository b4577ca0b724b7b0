use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::format::ImageMode;
use crate::gpkg::TileOrigin;
use crate::projection::Srs;

#[derive(Debug, Parser)]
#[command(
    name = "tiles2gpkg",
    version,
    about = "Package a z/x/y raster tile folder into a GeoPackage"
)]
pub struct Cli {
    /// Source folder laid out as zoom/column/row.ext
    pub source: PathBuf,

    /// Output GeoPackage path (must not exist)
    pub output: PathBuf,

    /// Row numbering of the source folder
    #[arg(long, value_enum, default_value_t = TileOriginArg::Ll)]
    pub tile_origin: TileOriginArg,

    #[arg(long, value_enum, default_value_t = SrsArg::WebMercator)]
    pub srs: SrsArg,

    #[arg(long, value_enum, default_value_t = ImageryArg::Source)]
    pub imagery: ImageryArg,

    /// JPEG quality (0-99); not allowed with png imagery
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..100))]
    pub quality: Option<u8>,

    #[arg(long)]
    pub threads: Option<usize>,

    /// Run a single worker on the calling thread
    #[arg(short = 'T', long, default_value_t = false)]
    pub sync: bool,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,

    /// Log level (error|warn|info|debug|trace)
    #[arg(long, default_value = "info")]
    pub log: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TileOriginArg {
    #[value(aliases = ["sw", "bottom-left", "tms"])]
    Ll,
    #[value(aliases = ["nw", "top-left", "wmts"])]
    Ul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SrsArg {
    #[value(name = "3857")]
    WebMercator,
    #[value(name = "4326")]
    Wgs84,
    #[value(name = "3395")]
    WorldMercator,
    #[value(name = "9804")]
    ScaledWorldMercator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageryArg {
    Mixed,
    #[value(alias = "jpg")]
    Jpeg,
    Png,
    Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Ndjson,
}

impl From<TileOriginArg> for TileOrigin {
    fn from(arg: TileOriginArg) -> Self {
        match arg {
            TileOriginArg::Ll => TileOrigin::BottomLeft,
            TileOriginArg::Ul => TileOrigin::TopLeft,
        }
    }
}

impl From<SrsArg> for Srs {
    fn from(arg: SrsArg) -> Self {
        match arg {
            SrsArg::WebMercator => Srs::WebMercator,
            SrsArg::Wgs84 => Srs::Wgs84,
            SrsArg::WorldMercator => Srs::WorldMercator,
            SrsArg::ScaledWorldMercator => Srs::ScaledWorldMercator,
        }
    }
}

impl From<ImageryArg> for ImageMode {
    fn from(arg: ImageryArg) -> Self {
        match arg {
            ImageryArg::Mixed => ImageMode::Mixed,
            ImageryArg::Jpeg => ImageMode::Jpeg,
            ImageryArg::Png => ImageMode::Png,
            ImageryArg::Source => ImageMode::Source,
        }
    }
}
