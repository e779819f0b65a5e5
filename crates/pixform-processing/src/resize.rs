use crate::cleanup::TempFile;
use crate::encode::encode_jpeg;
use crate::error::TransformError;
use crate::format::OutputFormat;
use crate::source::SourceImage;
use crate::types::TransformResult;
use image::{DynamicImage, GenericImageView};

/// JPEG quality of resized output
pub const RESIZE_JPEG_QUALITY: u8 = 90;

/// Largest side a JPEG can carry
pub const MAX_OUTPUT_DIMENSION: u32 = 65_535;

/// Pixel budget for a resize target, about 300 MB as RGB8
pub const MAX_OUTPUT_PIXELS: u64 = 100_000_000;

/// How the source is fitted into the requested box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Scale to fit within the box, preserving aspect ratio
    #[default]
    Inside,
    /// Exactly width x height, distorting as needed
    Fill,
}

impl FitMode {
    pub fn from_maintain_aspect_ratio(maintain: bool) -> Self {
        if maintain {
            FitMode::Inside
        } else {
            FitMode::Fill
        }
    }
}

/// Requested target dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ResizeDimensions {
    /// Zero counts as absent; at least one dimension must remain
    pub fn new(width: Option<u32>, height: Option<u32>) -> Result<Self, TransformError> {
        let width = width.filter(|w| *w > 0);
        let height = height.filter(|h| *h > 0);

        if width.is_none() && height.is_none() {
            return Err(TransformError::InvalidDimensions);
        }

        Ok(ResizeDimensions { width, height })
    }
}

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Calculate target dimensions for the given fit
    pub fn calculate_dimensions(
        orig_width: u32,
        orig_height: u32,
        dimensions: ResizeDimensions,
        fit: FitMode,
    ) -> (u32, u32) {
        match fit {
            FitMode::Fill => Self::fill_dimensions(orig_width, orig_height, dimensions),
            FitMode::Inside => Self::inside_dimensions(orig_width, orig_height, dimensions),
        }
    }

    fn fill_dimensions(orig_width: u32, orig_height: u32, dimensions: ResizeDimensions) -> (u32, u32) {
        match (dimensions.width, dimensions.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => {
                let aspect_ratio = orig_height as f64 / orig_width as f64;
                let h = (w as f64 * aspect_ratio).round() as u32;
                (w, h.max(1))
            }
            (None, Some(h)) => {
                let aspect_ratio = orig_width as f64 / orig_height as f64;
                let w = (h as f64 * aspect_ratio).round() as u32;
                (w.max(1), h)
            }
            (None, None) => (orig_width, orig_height),
        }
    }

    fn inside_dimensions(
        orig_width: u32,
        orig_height: u32,
        dimensions: ResizeDimensions,
    ) -> (u32, u32) {
        let width_scale = dimensions.width.map(|w| w as f64 / orig_width as f64);
        let height_scale = dimensions.height.map(|h| h as f64 / orig_height as f64);

        let scale = match (width_scale, height_scale) {
            (Some(ws), Some(hs)) => ws.min(hs),
            (Some(ws), None) => ws,
            (None, Some(hs)) => hs,
            (None, None) => return (orig_width, orig_height),
        };

        // Rounding must not push a side past its bound
        let new_width = ((orig_width as f64 * scale).round() as u32)
            .clamp(1, dimensions.width.unwrap_or(u32::MAX));
        let new_height = ((orig_height as f64 * scale).round() as u32)
            .clamp(1, dimensions.height.unwrap_or(u32::MAX));

        (new_width, new_height)
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> image::imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            image::imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            image::imageops::FilterType::CatmullRom
        } else {
            image::imageops::FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions
    pub fn resize_exact(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        if (orig_width, orig_height) == (width, height) {
            return img.clone();
        }
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }

    /// Reject targets the output buffer or the JPEG encoder cannot hold.
    ///
    /// Must run before any pixel buffer is allocated: a failed allocation aborts the
    /// process instead of unwinding.
    pub fn check_target(width: u32, height: u32) -> Result<(), TransformError> {
        let pixels = width as u64 * height as u64;
        if width > MAX_OUTPUT_DIMENSION
            || height > MAX_OUTPUT_DIMENSION
            || pixels > MAX_OUTPUT_PIXELS
        {
            return Err(TransformError::Resize(format!(
                "target size {}x{} exceeds the limit of {} px per side and {} pixels",
                width, height, MAX_OUTPUT_DIMENSION, MAX_OUTPUT_PIXELS
            )));
        }
        Ok(())
    }

    pub fn apply(
        img: &DynamicImage,
        dimensions: ResizeDimensions,
        fit: FitMode,
    ) -> Result<DynamicImage, TransformError> {
        let (orig_width, orig_height) = img.dimensions();
        let (target_width, target_height) =
            Self::calculate_dimensions(orig_width, orig_height, dimensions, fit);
        Self::check_target(target_width, target_height)?;
        Ok(Self::resize_exact(img, target_width, target_height))
    }
}

/// Resizes uploads and re-encodes them as JPEG
#[derive(Debug, Clone, Copy, Default)]
pub struct ResizeService;

impl ResizeService {
    pub fn new() -> Self {
        Self
    }

    pub fn resize_image(
        &self,
        source: TempFile,
        width: Option<u32>,
        height: Option<u32>,
        maintain_aspect_ratio: bool,
    ) -> Result<TransformResult, TransformError> {
        let dimensions = ResizeDimensions::new(width, height)?;
        let fit = FitMode::from_maintain_aspect_ratio(maintain_aspect_ratio);

        let (info, img) =
            SourceImage::load(source.path()).map_err(|e| TransformError::Resize(e.to_string()))?;

        let resized = ImageResize::apply(&img, dimensions, fit)?;
        let (new_width, new_height) = resized.dimensions();

        let bytes = encode_jpeg(&resized, RESIZE_JPEG_QUALITY)
            .map_err(|e| TransformError::Resize(e.to_string()))?;

        tracing::info!(
            from_width = info.width,
            from_height = info.height,
            to_width = new_width,
            to_height = new_height,
            fit = ?fit,
            output_size = bytes.len(),
            "Image resized"
        );

        Ok(TransformResult::new(
            bytes,
            OutputFormat::Jpeg,
            Some(RESIZE_JPEG_QUALITY),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::path::{Path, PathBuf};

    fn write_jpeg(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("source.jpg");
        RgbImage::from_pixel(width, height, Rgb([200, 100, 50]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();
        path
    }

    #[test]
    fn test_dimensions_require_one_side() {
        assert!(matches!(
            ResizeDimensions::new(None, None),
            Err(TransformError::InvalidDimensions)
        ));
        assert!(matches!(
            ResizeDimensions::new(Some(0), Some(0)),
            Err(TransformError::InvalidDimensions)
        ));
        let dims = ResizeDimensions::new(Some(0), Some(10)).unwrap();
        assert_eq!(dims.width, None);
        assert_eq!(dims.height, Some(10));
    }

    #[test]
    fn test_inside_width_only() {
        let dims = ResizeDimensions::new(Some(200), None).unwrap();
        assert_eq!(
            ImageResize::calculate_dimensions(400, 800, dims, FitMode::Inside),
            (200, 400)
        );
    }

    #[test]
    fn test_inside_box_limits_both_sides() {
        let dims = ResizeDimensions::new(Some(100), Some(100)).unwrap();
        assert_eq!(
            ImageResize::calculate_dimensions(400, 200, dims, FitMode::Inside),
            (100, 50)
        );
        assert_eq!(
            ImageResize::calculate_dimensions(200, 400, dims, FitMode::Inside),
            (50, 100)
        );
    }

    #[test]
    fn test_inside_never_exceeds_box() {
        for (ow, oh) in [(333, 777), (1000, 3), (3, 1000), (641, 479)] {
            for (bw, bh) in [(100, 100), (7, 50), (300, 11)] {
                let dims = ResizeDimensions::new(Some(bw), Some(bh)).unwrap();
                let (w, h) = ImageResize::calculate_dimensions(ow, oh, dims, FitMode::Inside);
                assert!(w <= bw && h <= bh, "{}x{} into {}x{} gave {}x{}", ow, oh, bw, bh, w, h);
                assert!(w >= 1 && h >= 1);
            }
        }
    }

    #[test]
    fn test_inside_preserves_aspect_ratio() {
        let dims = ResizeDimensions::new(None, Some(300)).unwrap();
        let (w, h) = ImageResize::calculate_dimensions(1600, 900, dims, FitMode::Inside);
        assert_eq!(h, 300);
        assert!((w as i64 - 533).abs() <= 1);
    }

    #[test]
    fn test_fill_exact_box() {
        let dims = ResizeDimensions::new(Some(120), Some(30)).unwrap();
        assert_eq!(
            ImageResize::calculate_dimensions(400, 800, dims, FitMode::Fill),
            (120, 30)
        );
    }

    #[test]
    fn test_fill_single_dimension_derives_other() {
        let dims = ResizeDimensions::new(None, Some(100)).unwrap();
        assert_eq!(
            ImageResize::calculate_dimensions(400, 800, dims, FitMode::Fill),
            (50, 100)
        );
    }

    #[test]
    fn test_select_filter() {
        assert_eq!(
            ImageResize::select_filter(1000, 1000, 100, 100),
            image::imageops::FilterType::Triangle
        );
        assert_eq!(
            ImageResize::select_filter(1000, 1000, 600, 600),
            image::imageops::FilterType::CatmullRom
        );
        assert_eq!(
            ImageResize::select_filter(1000, 1000, 900, 900),
            image::imageops::FilterType::Lanczos3
        );
    }

    #[test]
    fn test_resize_service_outputs_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 400, 800);

        let result = ResizeService::new()
            .resize_image(TempFile::new(&path), Some(200), None, true)
            .unwrap();

        assert_eq!(result.format, OutputFormat::Jpeg);
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (200, 400));
        assert!(!path.exists());
    }

    #[test]
    fn test_resize_service_fill_distorts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 400, 800);

        let result = ResizeService::new()
            .resize_image(TempFile::new(&path), Some(300), Some(100), false)
            .unwrap();

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (300, 100));
    }

    #[test]
    fn test_invalid_dimensions_still_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 10, 10);

        let err = ResizeService::new()
            .resize_image(TempFile::new(&path), None, None, true)
            .unwrap_err();

        assert!(matches!(err, TransformError::InvalidDimensions));
        assert!(!path.exists());
    }

    #[test]
    fn test_undecodable_source_is_resize_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"\xFF\xD8garbage").unwrap();

        let err = ResizeService::new()
            .resize_image(TempFile::new(&path), Some(10), None, true)
            .unwrap_err();

        assert!(matches!(err, TransformError::Resize(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_check_target_limits() {
        assert!(ImageResize::check_target(65_535, 1).is_ok());
        assert!(ImageResize::check_target(10_000, 10_000).is_ok());
        assert!(ImageResize::check_target(65_536, 1).is_err());
        assert!(ImageResize::check_target(1, 65_536).is_err());
        assert!(ImageResize::check_target(20_000, 20_000).is_err());
    }

    #[test]
    fn test_oversized_target_is_resize_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 1, 1);

        let err = ResizeService::new()
            .resize_image(TempFile::new(&path), Some(1_000_000), Some(1_000_000), false)
            .unwrap_err();

        match err {
            TransformError::Resize(msg) => assert!(msg.contains("1000000x1000000")),
            other => panic!("Expected Resize error, got {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_upscale_inside_past_limit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 2, 1);

        let err = ResizeService::new()
            .resize_image(TempFile::new(&path), Some(4_000_000_000), None, true)
            .unwrap_err();

        assert!(matches!(err, TransformError::Resize(_)));
        assert!(!path.exists());
    }
}
