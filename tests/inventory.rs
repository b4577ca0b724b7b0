use std::fs;
use std::path::Path;

use tiles2gpkg::inventory::{parse_tile_path, scan_tile_dir};

fn write_file(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, b"tile").expect("write");
}

#[test]
fn parse_tile_path_reads_last_three_segments() {
    let tile = parse_tile_path(Path::new("/data/tiles/7/114/31.png")).expect("tile");
    assert_eq!((tile.zoom, tile.column, tile.row), (7, 114, 31));
    assert_eq!(tile.path, Path::new("/data/tiles/7/114/31.png"));

    assert!(parse_tile_path(Path::new("tiles/7/abc/31.png")).is_none());
    assert!(parse_tile_path(Path::new("tiles/z7/1/31.png")).is_none());
    assert!(parse_tile_path(Path::new("tiles/7/1/thumb.png")).is_none());
    assert!(parse_tile_path(Path::new("tiles/300/1/1.png")).is_none());
}

#[test]
fn scan_returns_sorted_image_tiles() {
    let dir = tempfile::tempdir().expect("tempdir");
    for relative in [
        "2/1/3.png",
        "1/0/1.jpg",
        "2/0/2.JPEG",
        "1/0/0.png",
        "2/1/0.png",
        "2/1/notes.txt",
        "2/legend/0.png",
        "readme.md",
    ] {
        write_file(dir.path(), relative);
    }

    let tiles = scan_tile_dir(dir.path()).expect("scan");
    let coords: Vec<(u8, u32, u32)> = tiles
        .iter()
        .map(|tile| (tile.zoom, tile.column, tile.row))
        .collect();
    assert_eq!(coords, vec![(1, 0, 0), (1, 0, 1), (2, 0, 2), (2, 1, 0), (2, 1, 3)]);
    assert!(tiles.iter().all(|tile| tile.path.starts_with(dir.path())));
}

#[test]
fn scan_of_empty_directory_is_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(scan_tile_dir(dir.path()).expect("scan").is_empty());
}

#[test]
fn scan_rejects_missing_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(scan_tile_dir(&dir.path().join("missing")).is_err());
}

#[test]
fn scan_skips_zoom_levels_beyond_u32_indices() {
    let dir = tempfile::tempdir().expect("tempdir");
    for relative in ["31/0/0.png", "32/0/0.png", "64/0/0.png", "255/1/1.png"] {
        write_file(dir.path(), relative);
    }

    let tiles = scan_tile_dir(dir.path()).expect("scan");
    let zooms: Vec<u8> = tiles.iter().map(|tile| tile.zoom).collect();
    assert_eq!(zooms, vec![31]);
}
