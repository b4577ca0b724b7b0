use tiles2gpkg::projection::{
    EllipsoidalMercator, Geodetic, Projection, ScaledWorldMercator, SphericalMercator, Srs,
};

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual} (tolerance {tolerance})"
    );
}

#[test]
fn srs_selects_matching_projection() {
    for srs in Srs::ALL {
        assert_eq!(srs.projection().srs(), srs);
    }
    assert_eq!(Srs::WebMercator.code(), 3857);
    assert_eq!(Srs::WebMercator.name(), "WGS 84 / Pseudo-Mercator");
}

#[test]
fn invert_row_saturates_past_the_i64_grid() {
    assert_eq!(SphericalMercator.invert_row(31, 0), 2_147_483_647);
    assert_eq!(Geodetic.invert_row(32, 0), 2_147_483_647);
    for zoom in [63, 64, 70, u8::MAX] {
        assert_eq!(SphericalMercator.invert_row(zoom, 0), i64::MAX - 1);
        assert_eq!(EllipsoidalMercator.invert_row(zoom, 5), i64::MAX - 6);
    }
    assert_eq!(Geodetic.invert_row(u8::MAX, 0), i64::MAX - 1);
}

#[test]
fn pixel_size_halves_per_zoom() {
    assert_close(SphericalMercator.pixel_size(0), 156_543.033_928_041, 1e-9);
    assert_close(EllipsoidalMercator.pixel_size(0), 156_543.033_928_041, 1e-9);
    assert_close(ScaledWorldMercator.pixel_size(0), 125_829.12, 1e-9);
    assert_close(Geodetic.pixel_size(0), 1.406_25, 1e-12);

    for srs in Srs::ALL {
        let projection = srs.projection();
        for zoom in 0..=22u8 {
            let scaled = projection.pixel_size(zoom) * 2f64.powi(i32::from(zoom));
            assert_close(scaled, projection.pixel_size(0), 1e-6);
        }
    }
}

#[test]
fn spherical_mercator_tile_corners() {
    let (lat, lon) = SphericalMercator.tile_to_lat_lon(0, 0, 0);
    assert_close(lat, -85.051_128_779_806_6, 1e-9);
    assert_close(lon, -180.0, 1e-12);

    let (x, y) = SphericalMercator.tile_origin_coord(0, 0, 0);
    assert_close(x, -20_037_508.34, 0.01);
    assert_close(y, -20_037_508.34, 0.01);

    let (x, y) = SphericalMercator.tile_origin_coord(14, 11332, 9870);
    assert_close(x, 7_680_392.60, 0.01);
    assert_close(y, 4_104_362.67, 0.01);

    let (x, y) = SphericalMercator.tile_origin_coord(14, 11333, 9871);
    assert_close(x, 7_682_838.58, 0.01);
    assert_close(y, 4_106_808.65, 0.01);
}

#[test]
fn spherical_mercator_coord_round_trip() {
    for (lat, lon) in [(0.0, 0.0), (38.74, -77.14), (-60.5, 151.2), (85.0, 179.9)] {
        let (x, y) = SphericalMercator.lat_lon_to_coord(lat, lon);
        let (back_lat, back_lon) = SphericalMercator.coord_to_lat_lon(x, y);
        assert_close(back_lat, lat, 1e-9);
        assert_close(back_lon, lon, 1e-9);
    }
}

#[test]
fn mercator_row_inversion() {
    assert_eq!(SphericalMercator.invert_row(1, 0), 1);
    assert_eq!(SphericalMercator.invert_row(3, 2), 5);
    assert_eq!(EllipsoidalMercator.invert_row(0, 0), 0);
    for srs in Srs::ALL {
        let projection = srs.projection();
        for row in 0..8 {
            assert_eq!(projection.invert_row(4, projection.invert_row(4, row)), row);
        }
    }
}

#[test]
fn ellipsoidal_mercator_latitudes() {
    let (lat, lon) = EllipsoidalMercator.tile_to_lat_lon(0, 0, 0);
    assert_close(lat, -85.084_059_049_783_49, 1e-6);
    assert_close(lon, -180.0, 1e-12);

    let (lat, lon) = EllipsoidalMercator.tile_to_lat_lon(3, 2, 5);
    assert_close(lat, 41.170_427_276_143_315, 1e-7);
    assert_close(lon, -90.0, 1e-12);

    let (lat, lon) = EllipsoidalMercator.tile_to_lat_lon(7, 114, 31);
    assert_close(lat, -67.744_313_478_340_5, 1e-7);
    assert_close(lon, 140.625, 1e-12);

    let (lat, lon) = EllipsoidalMercator.tile_to_lat_lon(17, 37448, 80770);
    assert_close(lat, 38.740_090_555_096_99, 1e-7);
    assert_close(lon, -77.145_996_093_75, 1e-12);
}

#[test]
fn ellipsoidal_mercator_coord_round_trip() {
    for (zoom, column, row) in [(3u8, 2i64, 5i64), (7, 114, 31), (17, 37448, 80770)] {
        let (lat, lon) = EllipsoidalMercator.tile_to_lat_lon(zoom, column, row);
        let (x, y) = EllipsoidalMercator.tile_origin_coord(zoom, column, row);
        let (back_lat, back_lon) = EllipsoidalMercator.coord_to_lat_lon(x, y);
        assert_close(back_lat, lat, 1e-4);
        assert_close(back_lon, lon, 1e-9);
    }
}

#[test]
fn scaled_world_mercator_origin() {
    let (lat, lon) = ScaledWorldMercator.tile_to_lat_lon(0, 0, 0);
    assert_close(lat, -85.084_059_0, 1e-6);
    assert_close(lon, -180.0, 1e-12);

    let (x, y) = ScaledWorldMercator.tile_origin_coord(0, 0, 0);
    assert_close(x, -17_179_869.18, 0.01);
    assert_close(y, -17_179_869.18, 0.02);
    assert_eq!((y * 100.0).round() / 100.0, y);
}

#[test]
fn geodetic_tile_corners() {
    assert_eq!(Geodetic.tile_origin_coord(1, 0, 0), (-180.0, -90.0));
    assert_eq!(Geodetic.tile_origin_coord(1, 1, 1), (0.0, 90.0));

    let (x, y) = Geodetic.tile_origin_coord(21, 599187, 749974);
    assert_close(x, -77.142_734_5, 1e-7);
    assert_close(y, 38.741_569_5, 1e-7);

    assert_eq!(Geodetic.coord_to_lat_lon(12.5, -4.0), (-4.0, 12.5));
}

#[test]
fn geodetic_row_inversion_uses_half_height() {
    assert_eq!(Geodetic.invert_row(0, 0), 0);
    assert_eq!(Geodetic.invert_row(1, 0), 0);
    assert_eq!(Geodetic.invert_row(2, 0), 1);
    assert_eq!(Geodetic.invert_row(2, 1), 0);
    assert_eq!(Geodetic.invert_row(5, 3), 12);
}
