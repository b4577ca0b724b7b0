use std::path::Path;

use serde::Serialize;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    Png,
    Jpeg,
}

impl TileFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(TileFormat::Png),
            "jpg" | "jpeg" => Some(TileFormat::Jpeg),
            _ => None,
        }
    }

    pub fn from_magic(data: &[u8]) -> Option<Self> {
        if data.starts_with(PNG_MAGIC) {
            Some(TileFormat::Png)
        } else if data.starts_with(JPEG_MAGIC) {
            Some(TileFormat::Jpeg)
        } else {
            None
        }
    }
}

/// How source tiles are stored in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageMode {
    /// JPEG for opaque tiles, PNG for tiles with any transparency.
    Mixed,
    Jpeg,
    Png,
    /// Source bytes, untouched.
    #[default]
    Source,
}

impl ImageMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageMode::Mixed => "mixed",
            ImageMode::Jpeg => "jpeg",
            ImageMode::Png => "png",
            ImageMode::Source => "source",
        }
    }
}
