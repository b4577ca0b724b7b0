use std::path::Path;

use tiles2gpkg::codec::{Passthrough, TileEncoder, encoder_for};
use tiles2gpkg::format::{ImageMode, TileFormat};

const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n";

#[test]
fn tile_format_from_extension_and_magic() {
    assert_eq!(TileFormat::from_extension(Path::new("1/2/3.png")), Some(TileFormat::Png));
    assert_eq!(TileFormat::from_extension(Path::new("1/2/3.JPG")), Some(TileFormat::Jpeg));
    assert_eq!(TileFormat::from_extension(Path::new("1/2/3.jpeg")), Some(TileFormat::Jpeg));
    assert_eq!(TileFormat::from_extension(Path::new("1/2/3.webp")), None);
    assert_eq!(TileFormat::from_extension(Path::new("1/2/3")), None);

    assert_eq!(TileFormat::from_magic(PNG_HEADER), Some(TileFormat::Png));
    assert_eq!(TileFormat::from_magic(b"\xff\xd8\xff\xe0rest"), Some(TileFormat::Jpeg));
    assert_eq!(TileFormat::from_magic(b"GIF89a"), None);
}

#[test]
fn image_mode_names() {
    assert_eq!(ImageMode::default(), ImageMode::Source);
    assert_eq!(ImageMode::Mixed.as_str(), "mixed");
    assert_eq!(ImageMode::Png.as_str(), "png");
}

#[test]
fn passthrough_keeps_source_bytes() {
    let encoded = Passthrough.encode(b"not an image").expect("encode");
    assert_eq!(encoded.data, b"not an image");
    assert_eq!(encoded.format, None);
    assert_eq!(encoded.transparency, None);

    let encoded = encoder_for(ImageMode::Source, 75)
        .encode(PNG_HEADER)
        .expect("encode");
    assert_eq!(encoded.data, PNG_HEADER);
    assert_eq!(encoded.format, Some(TileFormat::Png));
}

#[cfg(feature = "codec")]
mod imaging {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, RgbImage};
    use tiles2gpkg::codec::{
        ImageCodec, TileEncoder, Transparency, classify_transparency, encoder_for,
    };
    use tiles2gpkg::format::{ImageMode, TileFormat};

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png).expect("png");
        cursor.into_inner()
    }

    fn opaque() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(16, 16, |x, y| {
            image::Rgb([(x * 16) as u8, (y * 16) as u8, 128])
        }))
    }

    fn with_alpha(transparent: impl Fn(u32, u32) -> bool) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(16, 16, |x, y| {
            let alpha = if transparent(x, y) { 0 } else { 255 };
            Rgba([10, 20, 30, alpha])
        }))
    }

    #[test]
    fn classify_transparency_counts_clear_pixels() {
        assert_eq!(classify_transparency(&opaque()), Transparency::Opaque);
        assert_eq!(classify_transparency(&with_alpha(|_, _| false)), Transparency::Opaque);
        assert_eq!(classify_transparency(&with_alpha(|x, _| x < 4)), Transparency::Partial);
        assert_eq!(classify_transparency(&with_alpha(|_, _| true)), Transparency::Full);
    }

    #[test]
    fn mixed_mode_picks_format_by_transparency() {
        let codec = encoder_for(ImageMode::Mixed, 75);

        let encoded = codec.encode(&png_bytes(opaque())).expect("opaque");
        assert_eq!(encoded.format, Some(TileFormat::Jpeg));
        assert_eq!(TileFormat::from_magic(&encoded.data), Some(TileFormat::Jpeg));
        assert_eq!(encoded.transparency, Some(Transparency::Opaque));

        let encoded = codec
            .encode(&png_bytes(with_alpha(|x, _| x < 4)))
            .expect("partial");
        assert_eq!(encoded.format, Some(TileFormat::Png));
        assert_eq!(TileFormat::from_magic(&encoded.data), Some(TileFormat::Png));
        assert_eq!(encoded.transparency, Some(Transparency::Partial));
    }

    #[test]
    fn fully_transparent_tiles_are_still_encoded() {
        let encoded = ImageCodec::new(ImageMode::Png, 75)
            .encode(&png_bytes(with_alpha(|_, _| true)))
            .expect("encode");
        assert_eq!(encoded.transparency, Some(Transparency::Full));
        assert!(!encoded.data.is_empty());
    }

    #[test]
    fn jpeg_mode_flattens_alpha() {
        let encoded = ImageCodec::new(ImageMode::Jpeg, 50)
            .encode(&png_bytes(with_alpha(|x, _| x < 4)))
            .expect("encode");
        assert_eq!(encoded.format, Some(TileFormat::Jpeg));
        let decoded = image::load_from_memory(&encoded.data).expect("decode jpeg");
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn png_mode_round_trips_pixels() {
        let source = with_alpha(|x, y| x == y);
        let encoded = ImageCodec::new(ImageMode::Png, 75)
            .encode(&png_bytes(source.clone()))
            .expect("encode");
        let decoded = image::load_from_memory(&encoded.data).expect("decode png");
        assert_eq!(decoded.to_rgba8(), source.to_rgba8());
    }

    #[test]
    fn undecodable_tiles_are_errors() {
        assert!(ImageCodec::new(ImageMode::Mixed, 75).encode(b"garbage").is_err());
    }
}
