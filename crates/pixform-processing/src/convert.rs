use crate::cleanup::TempFile;
use crate::encode::{
    encode_gif, encode_jpeg, encode_png, encode_tiff, encode_webp, PngCompressionLevel,
};
use crate::error::TransformError;
use crate::format::OutputFormat;
use crate::source::SourceImage;
use crate::types::TransformResult;
use anyhow::Result;
use bytes::Bytes;
use image::DynamicImage;

pub const CONVERT_JPEG_QUALITY: u8 = 90;
pub const CONVERT_WEBP_QUALITY: u8 = 90;
pub const CONVERT_PNG_LEVEL: u8 = 6;

/// Re-encodes uploads into another format with fixed per-format settings
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertService;

impl ConvertService {
    pub fn new() -> Self {
        Self
    }

    pub fn convert_format(
        &self,
        source: TempFile,
        format: &str,
    ) -> Result<TransformResult, TransformError> {
        let requested = OutputFormat::parse(format)?;

        let (info, img) = SourceImage::load(source.path())
            .map_err(|e| TransformError::Conversion(e.to_string()))?;

        let (bytes, written, quality) =
            Self::encode(&img, requested).map_err(|e| TransformError::Conversion(e.to_string()))?;

        tracing::info!(
            from = ?info.format,
            requested = %requested,
            written = %written,
            input_size = info.size_bytes,
            output_size = bytes.len(),
            "Image converted"
        );

        Ok(TransformResult::new(bytes, written, quality))
    }

    /// Encode with the convert defaults, returning the format actually written.
    ///
    /// BMP requests are written as GIF.
    fn encode(
        img: &DynamicImage,
        requested: OutputFormat,
    ) -> Result<(Bytes, OutputFormat, Option<u8>)> {
        let encoded = match requested {
            OutputFormat::Jpeg => (
                encode_jpeg(img, CONVERT_JPEG_QUALITY)?,
                OutputFormat::Jpeg,
                Some(CONVERT_JPEG_QUALITY),
            ),
            OutputFormat::Png => (
                encode_png(img, PngCompressionLevel::new(CONVERT_PNG_LEVEL))?,
                OutputFormat::Png,
                None,
            ),
            OutputFormat::WebP => (
                encode_webp(img, CONVERT_WEBP_QUALITY)?,
                OutputFormat::WebP,
                Some(CONVERT_WEBP_QUALITY),
            ),
            OutputFormat::Gif | OutputFormat::Bmp => (encode_gif(img)?, OutputFormat::Gif, None),
            OutputFormat::Tiff => (encode_tiff(img)?, OutputFormat::Tiff, None),
        };
        Ok(encoded)
    }
}
