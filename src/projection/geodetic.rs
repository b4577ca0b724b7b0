use super::{Projection, Srs, TILE_SIZE, grid_rows, tile_longitude, tiles_at};

/// EPSG:4326 plate carrée with square tiles: one 360° tile at zoom 0, two
/// 180° tiles side by side at zoom 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Geodetic;

impl Projection for Geodetic {
    fn srs(&self) -> Srs {
        Srs::Wgs84
    }

    fn pixel_size(&self, zoom: u8) -> f64 {
        360.0 / f64::from(TILE_SIZE) / tiles_at(zoom)
    }

    fn invert_row(&self, zoom: u8, row: i64) -> i64 {
        match zoom {
            0 => 0,
            _ => grid_rows(zoom - 1).saturating_sub(row).saturating_sub(1),
        }
    }

    fn tile_to_lat_lon(&self, zoom: u8, column: i64, row: i64) -> (f64, f64) {
        let lat = row as f64 * 360.0 / tiles_at(zoom) - 90.0;
        (lat, tile_longitude(zoom, column))
    }

    fn lat_lon_to_coord(&self, lat: f64, lon: f64) -> (f64, f64) {
        (lon, lat)
    }

    fn coord_to_lat_lon(&self, x: f64, y: f64) -> (f64, f64) {
        (y, x)
    }
}
