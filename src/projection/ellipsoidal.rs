use std::f64::consts::{FRAC_PI_2, PI};

use super::mercator::{MERCATOR_RESOLUTION, ORIGIN_SHIFT};
use super::{EARTH_RADIUS, Projection, Srs, mercator_invert_row, tile_longitude, tiles_at};

/// First eccentricity of the WGS 84 ellipsoid.
const ECCENTRICITY: f64 = 0.081_819_190_842_621;

/// Latitude bound, in radians, of the ellipsoidal Mercator tile grid.
const LATITUDE_LIMIT: f64 = 1.484_996_971_385_523_8;

/// Step size, in radians, below which the secant iteration stops.
const CONVERGENCE: f64 = 1e-4;
const MAX_ITERATIONS: usize = 64;

const SCALE_FACTOR: f64 = 0.857_385_503_731_176;
const SCALED_RADIUS: f64 = EARTH_RADIUS * SCALE_FACTOR;
const SCALED_RESOLUTION: f64 = 125_829.12;

fn northing(radius: f64, phi: f64) -> f64 {
    let e_sin = ECCENTRICITY * phi.sin();
    let conformal =
        ((FRAC_PI_2 + phi) / 2.0).tan() * ((1.0 - e_sin) / (1.0 + e_sin)).powf(ECCENTRICITY / 2.0);
    radius * conformal.ln()
}

/// Solves `northing(radius, phi) == target` for `phi` (radians) with a secant
/// iteration seeded at 0 and 1, clamped to the grid's latitude bound.
fn latitude_for_northing(radius: f64, target: f64) -> f64 {
    let residual = |phi: f64| northing(radius, phi) - target;
    let (mut lat, mut previous) = (0.0_f64, 1.0_f64);
    for _ in 0..MAX_ITERATIONS {
        let (f_lat, f_previous) = (residual(lat), residual(previous));
        if f_lat == f_previous {
            break;
        }
        let next = lat - f_lat * (lat - previous) / (f_lat - f_previous);
        previous = lat;
        lat = next.clamp(-LATITUDE_LIMIT, LATITUDE_LIMIT);
        if (lat - previous).abs() <= CONVERGENCE {
            break;
        }
    }
    lat
}

fn tile_latitude(radius: f64, zoom: u8, row: i64) -> f64 {
    let n = tiles_at(zoom);
    let target = (row as f64 - n / 2.0) * radius * 2.0 * PI / n;
    latitude_for_northing(radius, target).to_degrees()
}

/// EPSG:3395, Mercator on the WGS 84 ellipsoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct EllipsoidalMercator;

impl Projection for EllipsoidalMercator {
    fn srs(&self) -> Srs {
        Srs::WorldMercator
    }

    fn pixel_size(&self, zoom: u8) -> f64 {
        MERCATOR_RESOLUTION / tiles_at(zoom)
    }

    fn invert_row(&self, zoom: u8, row: i64) -> i64 {
        mercator_invert_row(zoom, row)
    }

    fn tile_to_lat_lon(&self, zoom: u8, column: i64, row: i64) -> (f64, f64) {
        (
            tile_latitude(EARTH_RADIUS, zoom, row),
            tile_longitude(zoom, column),
        )
    }

    fn lat_lon_to_coord(&self, lat: f64, lon: f64) -> (f64, f64) {
        (
            lon * ORIGIN_SHIFT / 180.0,
            northing(EARTH_RADIUS, lat.to_radians()),
        )
    }

    fn coord_to_lat_lon(&self, x: f64, y: f64) -> (f64, f64) {
        (
            latitude_for_northing(EARTH_RADIUS, y).to_degrees(),
            x * 180.0 / ORIGIN_SHIFT,
        )
    }
}

/// EPSG:9804, ellipsoidal Mercator on a radius scaled so zoom 0 spans
/// 125829.12 units per pixel. Northings are rounded to centimeters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaledWorldMercator;

impl Projection for ScaledWorldMercator {
    fn srs(&self) -> Srs {
        Srs::ScaledWorldMercator
    }

    fn pixel_size(&self, zoom: u8) -> f64 {
        SCALED_RESOLUTION / tiles_at(zoom)
    }

    fn invert_row(&self, zoom: u8, row: i64) -> i64 {
        mercator_invert_row(zoom, row)
    }

    fn tile_to_lat_lon(&self, zoom: u8, column: i64, row: i64) -> (f64, f64) {
        (
            tile_latitude(SCALED_RADIUS, zoom, row),
            tile_longitude(zoom, column),
        )
    }

    fn lat_lon_to_coord(&self, lat: f64, lon: f64) -> (f64, f64) {
        let y = northing(SCALED_RADIUS, lat.to_radians());
        (lon * PI * SCALED_RADIUS / 180.0, (y * 100.0).round() / 100.0)
    }

    fn coord_to_lat_lon(&self, x: f64, y: f64) -> (f64, f64) {
        (
            latitude_for_northing(SCALED_RADIUS, y).to_degrees(),
            x * 180.0 / (PI * SCALED_RADIUS),
        )
    }
}
