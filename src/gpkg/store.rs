use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rusqlite::{Connection, params};

use crate::gpkg::types::{NormalizedTile, ZoomLevelMetadata};
use crate::projection::{Srs, TILE_SIZE};

/// File-name suffix of the per-worker containers merged into the output.
pub const PART_SUFFIX: &str = ".gpkg.part";
pub const TILES_TABLE: &str = "tiles";

/// "GPKG" read as a big-endian 32-bit integer.
const GPKG_APPLICATION_ID: i32 = 0x4750_4B47;
const GPKG_USER_VERSION: i32 = 10_200;
const PART_COMMIT_BATCH: usize = 1_000;

const TILES_SCHEMA: &str = "
    CREATE TABLE tiles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        zoom_level INTEGER NOT NULL,
        tile_column INTEGER NOT NULL,
        tile_row INTEGER NOT NULL,
        tile_data BLOB NOT NULL,
        UNIQUE (zoom_level, tile_column, tile_row)
    );
";

const SYSTEM_SCHEMA: &str = "
    CREATE TABLE gpkg_spatial_ref_sys (
        srs_name TEXT NOT NULL,
        srs_id INTEGER NOT NULL PRIMARY KEY,
        organization TEXT NOT NULL,
        organization_coordsys_id INTEGER NOT NULL,
        definition TEXT NOT NULL,
        description TEXT
    );
    CREATE TABLE gpkg_contents (
        table_name TEXT NOT NULL PRIMARY KEY,
        data_type TEXT NOT NULL,
        identifier TEXT UNIQUE,
        description TEXT DEFAULT '',
        last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        min_x DOUBLE,
        min_y DOUBLE,
        max_x DOUBLE,
        max_y DOUBLE,
        srs_id INTEGER,
        CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
    );
    CREATE TABLE gpkg_tile_matrix_set (
        table_name TEXT NOT NULL PRIMARY KEY,
        srs_id INTEGER NOT NULL,
        min_x DOUBLE NOT NULL,
        min_y DOUBLE NOT NULL,
        max_x DOUBLE NOT NULL,
        max_y DOUBLE NOT NULL,
        CONSTRAINT fk_gtms_table_name FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
        CONSTRAINT fk_gtms_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
    );
    CREATE TABLE gpkg_tile_matrix (
        table_name TEXT NOT NULL,
        zoom_level INTEGER NOT NULL,
        matrix_width INTEGER NOT NULL,
        matrix_height INTEGER NOT NULL,
        tile_width INTEGER NOT NULL,
        tile_height INTEGER NOT NULL,
        pixel_x_size DOUBLE NOT NULL,
        pixel_y_size DOUBLE NOT NULL,
        CONSTRAINT pk_ttm PRIMARY KEY (table_name, zoom_level),
        CONSTRAINT fk_tmm_table_name FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name)
    );
";

const INSERT_TILE_SQL: &str = "INSERT OR REPLACE INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES (?1, ?2, ?3, ?4)";

const MERGE_PART_SQL: &str = "
    INSERT OR REPLACE INTO tiles (zoom_level, tile_column, tile_row, tile_data)
    SELECT zoom_level, tile_column, tile_row, tile_data FROM part.tiles
";

macro_rules! wgs84_geogcs {
    () => {
        "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563,AUTHORITY[\"EPSG\",\"7030\"]],AUTHORITY[\"EPSG\",\"6326\"]],PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],AUTHORITY[\"EPSG\",\"4326\"]]"
    };
}

struct SpatialRef {
    name: &'static str,
    srs_id: i32,
    organization: &'static str,
    organization_id: i32,
    definition: &'static str,
    description: &'static str,
}

const SPATIAL_REFS: [SpatialRef; 6] = [
    SpatialRef {
        name: Srs::WebMercator.name(),
        srs_id: Srs::WebMercator.code(),
        organization: "epsg",
        organization_id: Srs::WebMercator.code(),
        definition: concat!(
            "PROJCS[\"WGS 84 / Pseudo-Mercator\",",
            wgs84_geogcs!(),
            ",PROJECTION[\"Mercator_1SP\"],PARAMETER[\"central_meridian\",0],PARAMETER[\"scale_factor\",1],PARAMETER[\"false_easting\",0],PARAMETER[\"false_northing\",0],UNIT[\"metre\",1,AUTHORITY[\"EPSG\",\"9001\"]],AXIS[\"X\",EAST],AXIS[\"Y\",NORTH],AUTHORITY[\"EPSG\",\"3857\"]]"
        ),
        description: "Spherical Mercator",
    },
    SpatialRef {
        name: Srs::Wgs84.name(),
        srs_id: Srs::Wgs84.code(),
        organization: "epsg",
        organization_id: Srs::Wgs84.code(),
        definition: wgs84_geogcs!(),
        description: "World Geodetic System 1984",
    },
    SpatialRef {
        name: Srs::WorldMercator.name(),
        srs_id: Srs::WorldMercator.code(),
        organization: "epsg",
        organization_id: Srs::WorldMercator.code(),
        definition: concat!(
            "PROJCS[\"WGS 84 / World Mercator\",",
            wgs84_geogcs!(),
            ",PROJECTION[\"Mercator_1SP\"],PARAMETER[\"central_meridian\",0],PARAMETER[\"scale_factor\",1],PARAMETER[\"false_easting\",0],PARAMETER[\"false_northing\",0],UNIT[\"metre\",1,AUTHORITY[\"EPSG\",\"9001\"]],AXIS[\"Easting\",EAST],AXIS[\"Northing\",NORTH],AUTHORITY[\"EPSG\",\"3395\"]]"
        ),
        description: "Ellipsoidal Mercator",
    },
    SpatialRef {
        name: Srs::ScaledWorldMercator.name(),
        srs_id: Srs::ScaledWorldMercator.code(),
        organization: "epsg",
        organization_id: Srs::ScaledWorldMercator.code(),
        definition: concat!(
            "PROJCS[\"WGS 84 / Scaled World Mercator\",",
            wgs84_geogcs!(),
            ",PROJECTION[\"Mercator_1SP\"],PARAMETER[\"central_meridian\",0],PARAMETER[\"scale_factor\",0.803798909747978],PARAMETER[\"false_easting\",0],PARAMETER[\"false_northing\",0],UNIT[\"metre\",1,AUTHORITY[\"EPSG\",\"9001\"]],AXIS[\"Easting\",EAST],AXIS[\"Northing\",NORTH]]"
        ),
        description: "Scaled ellipsoidal Mercator",
    },
    SpatialRef {
        name: "Undefined cartesian SRS",
        srs_id: -1,
        organization: "NONE",
        organization_id: -1,
        definition: "undefined",
        description: "undefined cartesian coordinate reference system",
    },
    SpatialRef {
        name: "Undefined geographic SRS",
        srs_id: 0,
        organization: "NONE",
        organization_id: 0,
        definition: "undefined",
        description: "undefined geographic coordinate reference system",
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub parts: usize,
    pub rows: u64,
}

/// The output GeoPackage. Created once by the orchestrator, then receives
/// every part container and the final tile-matrix metadata.
pub struct GeoPackage {
    path: PathBuf,
    conn: Connection,
    srs: Srs,
}

impl GeoPackage {
    pub fn create(path: &Path, srs: Srs) -> Result<Self> {
        if path.exists() {
            anyhow::bail!("output file already exists: {}", path.display());
        }
        let mut conn = Connection::open(path)
            .with_context(|| format!("failed to create geopackage: {}", path.display()))?;
        conn.execute_batch(&format!(
            "
            PRAGMA page_size = 65536;
            PRAGMA application_id = {GPKG_APPLICATION_ID};
            PRAGMA user_version = {GPKG_USER_VERSION};
            PRAGMA foreign_keys = ON;
            PRAGMA synchronous = OFF;
            PRAGMA temp_store = MEMORY;
            "
        ))
        .context("failed to apply geopackage pragmas")?;

        let tx = conn.transaction().context("begin schema transaction")?;
        tx.execute_batch(SYSTEM_SCHEMA)
            .context("failed to create geopackage system tables")?;
        tx.execute_batch(TILES_SCHEMA)
            .context("failed to create tiles table")?;
        for srs_ref in SPATIAL_REFS.iter() {
            tx.execute(
                "INSERT INTO gpkg_spatial_ref_sys (srs_name, srs_id, organization, organization_coordsys_id, definition, description) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    srs_ref.name,
                    srs_ref.srs_id,
                    srs_ref.organization,
                    srs_ref.organization_id,
                    srs_ref.definition,
                    srs_ref.description
                ],
            )
            .with_context(|| format!("insert spatial reference {}", srs_ref.srs_id))?;
        }
        tx.execute(
            "INSERT INTO gpkg_contents (table_name, data_type, identifier, description, min_x, min_y, max_x, max_y, srs_id) VALUES (?1, 'tiles', ?2, ?3, 0, 0, 0, 0, ?4)",
            params![TILES_TABLE, TILES_TABLE, "Raster Tiles", srs.code()],
        )
        .context("insert contents row")?;
        tx.commit().context("commit geopackage schema")?;

        Ok(Self {
            path: path.to_path_buf(),
            conn,
            srs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn srs(&self) -> Srs {
        self.srs
    }

    /// Copies every tile of a part container into the output, replacing
    /// rows with equal coordinates, then deletes the part file.
    pub fn merge_part(&mut self, part: &Path) -> Result<u64> {
        if !part.is_file() {
            anyhow::bail!("part container does not exist: {}", part.display());
        }
        let part_name = part
            .to_str()
            .with_context(|| format!("part path is not valid UTF-8: {}", part.display()))?;
        self.conn
            .execute("ATTACH DATABASE ?1 AS part", [part_name])
            .with_context(|| format!("failed to attach part: {}", part.display()))?;

        let copied = self.copy_attached_tiles();
        let detached = self
            .conn
            .execute_batch("DETACH DATABASE part;")
            .context("detach part");
        let copied = copied.with_context(|| format!("failed to merge part: {}", part.display()))?;
        detached?;

        fs::remove_file(part)
            .with_context(|| format!("failed to remove merged part: {}", part.display()))?;
        Ok(copied)
    }

    /// Merges every part container in `dir`, in file-name order.
    pub fn merge_parts(&mut self, dir: &Path, progress: &ProgressBar) -> Result<MergeSummary> {
        let parts = discover_parts(dir)?;
        progress.set_length(parts.len() as u64);
        let mut summary = MergeSummary::default();
        for part in &parts {
            let rows = self.merge_part(part)?;
            tracing::debug!(part = %part.display(), rows, "merged part container");
            summary.parts += 1;
            summary.rows += rows;
            progress.inc(1);
        }
        Ok(summary)
    }

    fn copy_attached_tiles(&mut self) -> Result<u64> {
        let tx = self.conn.transaction().context("begin merge transaction")?;
        let rows = tx.execute(MERGE_PART_SQL, []).context("copy part tiles")?;
        tx.commit().context("commit merge")?;
        Ok(rows as u64)
    }

    /// Writes one tile-matrix row per level and the overall bounding box,
    /// taken from the shallowest level.
    pub fn finalize(&mut self, levels: &[ZoomLevelMetadata]) -> Result<()> {
        let top = levels
            .iter()
            .min_by_key(|level| level.zoom)
            .context("cannot finalize a geopackage without zoom levels")?;
        let projection = self.srs.projection();

        let tx = self.conn.transaction().context("begin finalize transaction")?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO gpkg_tile_matrix (table_name, zoom_level, matrix_width, matrix_height, tile_width, tile_height, pixel_x_size, pixel_y_size) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .context("prepare tile matrix insert")?;
            for level in levels {
                let pixel_size = projection.pixel_size(level.zoom);
                stmt.execute(params![
                    TILES_TABLE,
                    level.zoom,
                    level.matrix_width,
                    level.matrix_height,
                    TILE_SIZE,
                    TILE_SIZE,
                    pixel_size,
                    pixel_size
                ])
                .with_context(|| format!("insert tile matrix for zoom {}", level.zoom))?;
            }
        }
        tx.execute(
            "UPDATE gpkg_contents SET min_x = ?1, min_y = ?2, max_x = ?3, max_y = ?4, last_change = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE table_name = ?5",
            params![top.min_x, top.min_y, top.max_x, top.max_y, TILES_TABLE],
        )
        .context("update contents bounds")?;
        tx.execute(
            "INSERT OR REPLACE INTO gpkg_tile_matrix_set (table_name, srs_id, min_x, min_y, max_x, max_y) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                TILES_TABLE,
                self.srs.code(),
                top.min_x,
                top.min_y,
                top.max_x,
                top.max_y
            ],
        )
        .context("insert tile matrix set")?;
        tx.commit().context("commit finalize")?;
        Ok(())
    }

    pub fn tile_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tiles", [], |row| row.get(0))
            .context("count tiles")?;
        Ok(count as u64)
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, err)| err)
            .with_context(|| format!("failed to close geopackage: {}", self.path.display()))
    }
}

/// Part containers in `dir`, sorted by file name.
pub fn discover_parts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut parts = Vec::new();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read part directory: {}", dir.display()))?;
    for entry in entries {
        let path = entry.context("read part directory entry")?.path();
        let is_part = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(PART_SUFFIX));
        if is_part && path.is_file() {
            parts.push(path);
        }
    }
    parts.sort();
    Ok(parts)
}

/// A worker's private tile container. Inserts are committed in batches and
/// the file is left on disk for the orchestrator to merge.
pub struct PartContainer {
    path: PathBuf,
    conn: Connection,
    pending: usize,
}

impl PartContainer {
    pub fn create_in(dir: &Path) -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix("tiles-")
            .suffix(PART_SUFFIX)
            .tempfile_in(dir)
            .with_context(|| format!("failed to create part container in {}", dir.display()))?
            .into_temp_path()
            .keep()
            .context("failed to keep part container")?;
        let conn = Connection::open(&path)
            .with_context(|| format!("failed to open part container: {}", path.display()))?;
        conn.query_row("PRAGMA journal_mode = OFF", [], |row| row.get::<_, String>(0))
            .context("failed to disable part journal")?;
        conn.execute_batch(
            "
            PRAGMA synchronous = OFF;
            PRAGMA temp_store = MEMORY;
            ",
        )
        .context("failed to apply part pragmas")?;
        conn.execute_batch(TILES_SCHEMA)
            .context("failed to create part schema")?;
        conn.execute_batch("BEGIN;").context("begin part batch")?;
        Ok(Self {
            path,
            conn,
            pending: 0,
        })
    }

    pub fn insert_tile(&mut self, tile: &NormalizedTile) -> Result<()> {
        self.conn
            .prepare_cached(INSERT_TILE_SQL)
            .context("prepare part insert")?
            .execute(params![tile.zoom, tile.column, tile.row, tile.data])
            .with_context(|| {
                format!(
                    "insert tile {}/{}/{} into part",
                    tile.zoom, tile.column, tile.row
                )
            })?;
        self.pending += 1;
        if self.pending >= PART_COMMIT_BATCH {
            self.conn
                .execute_batch("COMMIT; BEGIN;")
                .context("commit part batch")?;
            self.pending = 0;
        }
        Ok(())
    }

    /// Commits outstanding inserts and closes the container.
    pub fn finish(self) -> Result<PathBuf> {
        let Self { path, conn, .. } = self;
        conn.execute_batch("COMMIT;").context("commit part container")?;
        conn.close()
            .map_err(|(_, err)| err)
            .with_context(|| format!("failed to close part container: {}", path.display()))?;
        Ok(path)
    }
}
