//! Tile-grid projections supported by the GeoPackage writer.
//!
//! Every projection describes the same thing: where the bottom-left corner of
//! a `zoom/column/row` tile lands in projected units, how large a pixel is at
//! a zoom level, and how to flip a row between the TMS and WMTS numbering.

mod ellipsoidal;
mod geodetic;
mod mercator;

pub use self::ellipsoidal::{EllipsoidalMercator, ScaledWorldMercator};
pub use self::geodetic::Geodetic;
pub use self::mercator::SphericalMercator;

/// Edge length in pixels of every tile written to the tile matrix.
pub const TILE_SIZE: u32 = 256;

/// WGS 84 semi-major axis in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Deepest zoom level read from a tile folder. Column and row indices of this
/// level and the level derived below it fit in a `u32`.
pub const MAX_ZOOM: u8 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Srs {
    /// EPSG:3857
    WebMercator,
    /// EPSG:4326
    Wgs84,
    /// EPSG:3395
    WorldMercator,
    /// EPSG:9804
    ScaledWorldMercator,
}

impl Srs {
    pub const ALL: [Srs; 4] = [
        Srs::WebMercator,
        Srs::Wgs84,
        Srs::WorldMercator,
        Srs::ScaledWorldMercator,
    ];

    pub const fn code(self) -> i32 {
        match self {
            Srs::WebMercator => 3857,
            Srs::Wgs84 => 4326,
            Srs::WorldMercator => 3395,
            Srs::ScaledWorldMercator => 9804,
        }
    }

    /// Name written to `gpkg_spatial_ref_sys`.
    pub const fn name(self) -> &'static str {
        match self {
            Srs::WebMercator => "WGS 84 / Pseudo-Mercator",
            Srs::Wgs84 => "WGS 84",
            Srs::WorldMercator => "WGS 84 / World Mercator",
            Srs::ScaledWorldMercator => "WGS 84 / Scaled World Mercator",
        }
    }

    pub fn projection(self) -> &'static dyn Projection {
        match self {
            Srs::WebMercator => &SphericalMercator,
            Srs::Wgs84 => &Geodetic,
            Srs::WorldMercator => &EllipsoidalMercator,
            Srs::ScaledWorldMercator => &ScaledWorldMercator,
        }
    }
}

/// Coordinate math for one tile grid. Implementations are stateless and
/// shared read-only between workers.
pub trait Projection: Send + Sync {
    fn srs(&self) -> Srs;

    /// Ground size of one pixel at `zoom`, in projected units.
    fn pixel_size(&self, zoom: u8) -> f64;

    /// Flips a row between bottom-left and top-left numbering.
    fn invert_row(&self, zoom: u8, row: i64) -> i64;

    /// Latitude and longitude, in degrees, of the bottom-left corner of a tile.
    fn tile_to_lat_lon(&self, zoom: u8, column: i64, row: i64) -> (f64, f64);

    fn lat_lon_to_coord(&self, lat: f64, lon: f64) -> (f64, f64);

    fn coord_to_lat_lon(&self, x: f64, y: f64) -> (f64, f64);

    /// Projected `(x, y)` of the bottom-left corner of a tile.
    fn tile_origin_coord(&self, zoom: u8, column: i64, row: i64) -> (f64, f64) {
        let (lat, lon) = self.tile_to_lat_lon(zoom, column, row);
        self.lat_lon_to_coord(lat, lon)
    }
}

pub(crate) fn tiles_at(zoom: u8) -> f64 {
    2f64.powi(i32::from(zoom))
}

/// Row count of a `2^zoom` grid, saturating at `i64::MAX`.
pub(crate) fn grid_rows(zoom: u8) -> i64 {
    match 1i64.checked_shl(u32::from(zoom)) {
        Some(rows) if rows > 0 => rows,
        _ => i64::MAX,
    }
}

pub(crate) fn mercator_invert_row(zoom: u8, row: i64) -> i64 {
    grid_rows(zoom).saturating_sub(row).saturating_sub(1)
}

pub(crate) fn tile_longitude(zoom: u8, column: i64) -> f64 {
    column as f64 / tiles_at(zoom) * 360.0 - 180.0
}
