//! Per-format encoders
//!
//! JPEG goes through mozjpeg and lossy WebP through libwebp; PNG, GIF and TIFF use
//! the `image` crate's own encoders.

use anyhow::{anyhow, Result};
use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};

/// zlib-style PNG compression level on a 0-9 scale (higher = smaller, slower)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngCompressionLevel(u8);

impl PngCompressionLevel {
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    /// Level derived from a 1-100 quality: higher quality means less aggressive compression
    pub fn from_quality(quality: u8) -> Self {
        let level = (9.0 - (quality as f64 / 100.0) * 9.0).round();
        Self::new(level.clamp(0.0, 9.0) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// The PNG encoder exposes three compression strategies; levels are bucketed onto them.
    fn compression_type(self) -> CompressionType {
        match self.0 {
            0..=3 => CompressionType::Fast,
            4..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        }
    }
}

/// Drop float channels, which none of the 8-bit encoders accept
fn to_encodable(img: &DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb8(img.to_rgb8()),
        DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba8(img.to_rgba8()),
        other => other.clone(),
    }
}

/// Encode to JPEG using mozjpeg
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    // mozjpeg reports libjpeg errors by unwinding
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new())?;
        comp.write_scanlines(&rgb_img)?;
        comp.finish()
    }));

    match outcome {
        Ok(Ok(jpeg_data)) => Ok(Bytes::from(jpeg_data)),
        Ok(Err(e)) => Err(anyhow!("JPEG encode failed: {}", e)),
        Err(_) => Err(anyhow!("JPEG encode failed: encoder aborted")),
    }
}

/// Encode to PNG at the given compression level
pub fn encode_png(img: &DynamicImage, level: PngCompressionLevel) -> Result<Bytes> {
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut buffer,
        level.compression_type(),
        PngFilterType::Adaptive,
    );
    to_encodable(img)
        .write_with_encoder(encoder)
        .map_err(|e| anyhow!("PNG encode failed: {}", e))?;

    Ok(Bytes::from(buffer))
}

/// Encode to lossy WebP using libwebp
///
/// libwebp rejects sides above 16383 px; that surfaces as an error, not a panic.
pub fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Bytes> {
    let (width, height) = img.dimensions();

    let encoded = if img.color().has_alpha() {
        let rgba_img = img.to_rgba8();
        webp::Encoder::from_rgba(&rgba_img, width, height).encode_simple(false, quality as f32)
    } else {
        let rgb_img = img.to_rgb8();
        webp::Encoder::from_rgb(&rgb_img, width, height).encode_simple(false, quality as f32)
    };
    let webp_data = encoded.map_err(|e| anyhow!("WebP encode failed: {:?}", e))?;

    if webp_data.is_empty() {
        return Err(anyhow!("WebP encode failed: empty output"));
    }

    Ok(Bytes::copy_from_slice(&webp_data))
}

/// Encode to a single-frame GIF with the encoder's default palette quantization
pub fn encode_gif(img: &DynamicImage) -> Result<Bytes> {
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    write_with_format(&rgba, ImageFormat::Gif)
}

/// Encode to TIFF with the encoder's defaults
pub fn encode_tiff(img: &DynamicImage) -> Result<Bytes> {
    write_with_format(&to_encodable(img), ImageFormat::Tiff)
}

fn write_with_format(img: &DynamicImage, format: ImageFormat) -> Result<Bytes> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    img.write_to(&mut cursor, format)
        .map_err(|e| anyhow!("{:?} encode failed: {}", format, e))?;

    Ok(Bytes::from(buffer))
}
