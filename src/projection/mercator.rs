use std::f64::consts::PI;

use super::{
    EARTH_RADIUS, Projection, Srs, mercator_invert_row, tile_longitude, tiles_at,
};

pub(crate) const ORIGIN_SHIFT: f64 = PI * EARTH_RADIUS;

/// Meters per pixel at zoom 0 for 256px Mercator tiles.
pub(crate) const MERCATOR_RESOLUTION: f64 = 156_543.033_928_041;

/// EPSG:3857, the spherical "web" Mercator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphericalMercator;

impl Projection for SphericalMercator {
    fn srs(&self) -> Srs {
        Srs::WebMercator
    }

    fn pixel_size(&self, zoom: u8) -> f64 {
        MERCATOR_RESOLUTION / tiles_at(zoom)
    }

    fn invert_row(&self, zoom: u8, row: i64) -> i64 {
        mercator_invert_row(zoom, row)
    }

    fn tile_to_lat_lon(&self, zoom: u8, column: i64, row: i64) -> (f64, f64) {
        let n = tiles_at(zoom);
        let lat = (PI * (2.0 * row as f64 / n - 1.0)).sinh().atan().to_degrees();
        (lat, tile_longitude(zoom, column))
    }

    fn lat_lon_to_coord(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x = lon * ORIGIN_SHIFT / 180.0;
        let y = ((90.0 + lat) * PI / 360.0).tan().ln() / (PI / 180.0);
        (x, y * ORIGIN_SHIFT / 180.0)
    }

    fn coord_to_lat_lon(&self, x: f64, y: f64) -> (f64, f64) {
        let lat = 2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0;
        (lat.to_degrees(), x / ORIGIN_SHIFT * 180.0)
    }
}
