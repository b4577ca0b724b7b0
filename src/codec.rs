//! Per-tile re-encoding applied by workers before storage.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::format::{ImageMode, TileFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    Opaque,
    Partial,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTile {
    pub data: Vec<u8>,
    pub format: Option<TileFormat>,
    /// `None` when the tile was not decoded.
    pub transparency: Option<Transparency>,
}

pub trait TileEncoder: Send + Sync {
    fn encode(&self, source: &[u8]) -> Result<EncodedTile>;
}

/// Stores source bytes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl TileEncoder for Passthrough {
    fn encode(&self, source: &[u8]) -> Result<EncodedTile> {
        Ok(EncodedTile {
            data: source.to_vec(),
            format: TileFormat::from_magic(source),
            transparency: None,
        })
    }
}

pub fn encoder_for(mode: ImageMode, quality: u8) -> Arc<dyn TileEncoder> {
    match mode {
        ImageMode::Source => Arc::new(Passthrough),
        #[cfg(feature = "codec")]
        _ => Arc::new(ImageCodec::new(mode, quality)),
        #[cfg(not(feature = "codec"))]
        _ => {
            let _ = quality;
            tracing::warn!(
                mode = mode.as_str(),
                "built without image codec support; storing source bytes"
            );
            Arc::new(Passthrough)
        }
    }
}

#[cfg(feature = "codec")]
pub use self::imaging::{ImageCodec, classify_transparency};

#[cfg(feature = "codec")]
mod imaging {
    use std::io::Cursor;

    use anyhow::{Context, Result};
    use image::codecs::jpeg::JpegEncoder;
    use image::{DynamicImage, ImageFormat};

    use super::{EncodedTile, Passthrough, TileEncoder, Transparency};
    use crate::format::{ImageMode, TileFormat};

    /// Decodes each tile and re-encodes it as PNG or JPEG.
    #[derive(Debug, Clone, Copy)]
    pub struct ImageCodec {
        mode: ImageMode,
        quality: u8,
    }

    impl ImageCodec {
        pub fn new(mode: ImageMode, quality: u8) -> Self {
            Self {
                mode,
                quality: quality.clamp(1, 100),
            }
        }
    }

    impl TileEncoder for ImageCodec {
        fn encode(&self, source: &[u8]) -> Result<EncodedTile> {
            let img = match self.mode {
                ImageMode::Source => return Passthrough.encode(source),
                _ => image::load_from_memory(source).context("failed to decode tile image")?,
            };
            let transparency = classify_transparency(&img);
            let format = match (self.mode, transparency) {
                (ImageMode::Jpeg, _) | (ImageMode::Mixed, Transparency::Opaque) => {
                    TileFormat::Jpeg
                }
                _ => TileFormat::Png,
            };
            let data = match format {
                TileFormat::Jpeg => encode_jpeg(&img, self.quality)?,
                TileFormat::Png => encode_png(&img)?,
            };
            Ok(EncodedTile {
                data,
                format: Some(format),
                transparency: Some(transparency),
            })
        }
    }

    /// Counts pixels with zero alpha.
    pub fn classify_transparency(img: &DynamicImage) -> Transparency {
        if !img.color().has_alpha() {
            return Transparency::Opaque;
        }
        let rgba = img.to_rgba8();
        let total = u64::from(rgba.width()) * u64::from(rgba.height());
        let transparent = rgba.pixels().filter(|pixel| pixel.0[3] == 0).count() as u64;
        match transparent {
            0 => Transparency::Opaque,
            n if n >= total => Transparency::Full,
            _ => Transparency::Partial,
        }
    }

    fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut data = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut data, quality))
            .context("failed to encode jpeg tile")?;
        Ok(data)
    }

    fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png)
            .context("failed to encode png tile")?;
        Ok(cursor.into_inner())
    }
}
