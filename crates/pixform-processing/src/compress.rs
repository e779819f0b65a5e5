use crate::cleanup::TempFile;
use crate::encode::{encode_jpeg, encode_png, encode_webp, PngCompressionLevel};
use crate::error::TransformError;
use crate::format::{normalize_format_name, OutputFormat};
use crate::source::SourceImage;
use crate::types::TransformResult;
use bytes::Bytes;
use image::DynamicImage;

/// Default upper bound applied to requested compression quality
pub const DEFAULT_QUALITY_CEILING: u8 = 83;

/// Lossy re-encoding with a capped quality
#[derive(Debug, Clone, Copy)]
pub struct CompressService {
    quality_ceiling: u8,
}

impl Default for CompressService {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY_CEILING)
    }
}

impl CompressService {
    pub fn new(quality_ceiling: u8) -> Self {
        Self {
            quality_ceiling: quality_ceiling.clamp(1, 100),
        }
    }

    pub fn quality_ceiling(&self) -> u8 {
        self.quality_ceiling
    }

    /// Validate `quality` and cap it at the ceiling
    pub fn effective_quality(&self, quality: i32) -> Result<u8, TransformError> {
        if !(1..=100).contains(&quality) {
            return Err(TransformError::InvalidQuality(quality));
        }
        Ok((quality as u8).min(self.quality_ceiling))
    }

    /// Pick the output format: the requested one, else the detected one, else JPEG.
    /// Names the compressor has no encoder for fall back to JPEG.
    pub fn resolve_format(requested: Option<&str>, detected: Option<&str>) -> OutputFormat {
        let name = requested
            .map(normalize_format_name)
            .filter(|name| !name.is_empty())
            .or_else(|| detected.map(normalize_format_name))
            .unwrap_or_else(|| "jpeg".to_string());

        match name.as_str() {
            "png" => OutputFormat::Png,
            "webp" => OutputFormat::WebP,
            _ => OutputFormat::Jpeg,
        }
    }

    pub fn compress_image(
        &self,
        source: TempFile,
        quality: i32,
        format: Option<&str>,
    ) -> Result<TransformResult, TransformError> {
        let effective_quality = self.effective_quality(quality)?;

        let (info, img) = SourceImage::load(source.path())
            .map_err(|e| TransformError::Compression(e.to_string()))?;

        let output = Self::resolve_format(format, info.format.as_deref());

        let bytes = Self::encode(&img, output, effective_quality)
            .map_err(|e| TransformError::Compression(e.to_string()))?;

        tracing::info!(
            requested_quality = quality,
            effective_quality,
            format = %output,
            input_size = info.size_bytes,
            output_size = bytes.len(),
            "Image compressed"
        );

        Ok(TransformResult::new(bytes, output, Some(effective_quality)))
    }

    fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> anyhow::Result<Bytes> {
        match format {
            OutputFormat::Png => encode_png(img, PngCompressionLevel::from_quality(quality)),
            OutputFormat::WebP => encode_webp(img, quality),
            _ => encode_jpeg(img, quality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::path::{Path, PathBuf};

    fn write_image(dir: &Path, name: &str, format: ImageFormat) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 90]))
            .save_with_format(&path, format)
            .unwrap();
        path
    }

    #[test]
    fn test_effective_quality_is_capped() {
        let service = CompressService::default();
        for q in 1..=100 {
            assert_eq!(service.effective_quality(q).unwrap(), (q as u8).min(83));
        }
    }

    #[test]
    fn test_configured_ceiling() {
        let service = CompressService::new(60);
        assert_eq!(service.effective_quality(95).unwrap(), 60);
        assert_eq!(service.effective_quality(40).unwrap(), 40);
    }

    #[test]
    fn test_quality_out_of_range() {
        let service = CompressService::default();
        assert!(matches!(
            service.effective_quality(0),
            Err(TransformError::InvalidQuality(0))
        ));
        assert!(matches!(
            service.effective_quality(101),
            Err(TransformError::InvalidQuality(101))
        ));
        assert!(service.effective_quality(-5).is_err());
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(CompressService::resolve_format(Some("JPG"), Some("png")), OutputFormat::Jpeg);
        assert_eq!(CompressService::resolve_format(None, Some("png")), OutputFormat::Png);
        assert_eq!(CompressService::resolve_format(Some(""), Some("webp")), OutputFormat::WebP);
        assert_eq!(CompressService::resolve_format(None, None), OutputFormat::Jpeg);
        assert_eq!(CompressService::resolve_format(Some("gif"), None), OutputFormat::Jpeg);
        assert_eq!(CompressService::resolve_format(None, Some("tiff")), OutputFormat::Jpeg);
    }

    #[test]
    fn test_compress_jpeg_reports_capped_quality() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "photo.jpg", ImageFormat::Jpeg);
        let decoded_source = image::open(&path).unwrap();

        let result = CompressService::default()
            .compress_image(TempFile::new(&path), 95, Some("jpeg"))
            .unwrap();

        assert_eq!(result.format, OutputFormat::Jpeg);
        assert_eq!(result.quality, Some(83));
        assert_eq!(result.bytes, encode_jpeg(&decoded_source, 83).unwrap());
        assert_ne!(result.bytes, encode_jpeg(&decoded_source, 95).unwrap());
        assert_eq!(image::guess_format(&result.bytes).unwrap(), ImageFormat::Jpeg);
        assert!(!path.exists());
    }

    #[test]
    fn test_compress_keeps_detected_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 40]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let result = CompressService::default()
            .compress_image(TempFile::new(&path), 50, None)
            .unwrap();

        assert_eq!(result.format, OutputFormat::Png);
        assert_eq!(image::guess_format(&result.bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_compress_unknown_source_format_falls_back_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "scan.bmp", ImageFormat::Bmp);

        let result = CompressService::default()
            .compress_image(TempFile::new(&path), 70, None)
            .unwrap();

        assert_eq!(result.format, OutputFormat::Jpeg);
        assert_eq!(image::guess_format(&result.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_compress_to_webp() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "photo.jpg", ImageFormat::Jpeg);

        let result = CompressService::default()
            .compress_image(TempFile::new(&path), 60, Some("webp"))
            .unwrap();

        assert_eq!(result.format, OutputFormat::WebP);
        assert_eq!(result.quality, Some(60));
    }

    #[test]
    fn test_invalid_quality_rejected_before_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-even-an-image.jpg");
        std::fs::write(&path, b"plain text").unwrap();

        let err = CompressService::default()
            .compress_image(TempFile::new(&path), 0, None)
            .unwrap_err();

        assert!(matches!(err, TransformError::InvalidQuality(0)));
        assert!(!path.exists());
    }

    #[test]
    fn test_decode_failure_is_compression_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"plain text").unwrap();

        let err = CompressService::default()
            .compress_image(TempFile::new(&path), 50, None)
            .unwrap_err();

        assert!(matches!(err, TransformError::Compression(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_webp_over_encoder_limit_is_compression_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.png");
        RgbImage::from_pixel(17_000, 1, Rgb([40, 80, 120]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let err = CompressService::default()
            .compress_image(TempFile::new(&path), 60, Some("webp"))
            .unwrap_err();

        match err {
            TransformError::Compression(msg) => assert!(msg.contains("WebP encode failed")),
            other => panic!("Expected Compression error, got {:?}", other),
        }
        assert!(!path.exists());
    }
}
