//! Format names, normalization and content types

use crate::error::TransformError;
use image::ImageFormat;

const OCTET_STREAM: &str = "application/octet-stream";

/// Lowercase a format name and canonicalize `jpg` to `jpeg`
pub fn normalize_format_name(format: &str) -> String {
    let lower = format.trim().to_lowercase();
    if lower == "jpg" {
        "jpeg".to_string()
    } else {
        lower
    }
}

/// Map a format name to the MIME type used in response headers.
///
/// Unknown formats map to `application/octet-stream`.
pub fn content_type_for(format: &str) -> &'static str {
    match normalize_format_name(format).as_str() {
        "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tiff" => "image/tiff",
        _ => OCTET_STREAM,
    }
}

/// Output format of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
}

impl OutputFormat {
    /// Parse a format name (case-insensitive, `jpg` accepted)
    pub fn parse(s: &str) -> Result<Self, TransformError> {
        match normalize_format_name(s).as_str() {
            "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            "gif" => Ok(OutputFormat::Gif),
            "bmp" => Ok(OutputFormat::Bmp),
            "tiff" => Ok(OutputFormat::Tiff),
            _ => Err(TransformError::UnsupportedFormat(s.to_string())),
        }
    }

    /// Normalized name, also used as the file extension of downloads
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Gif => "gif",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        content_type_for(self.name())
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::WebP => Some(OutputFormat::WebP),
            ImageFormat::Gif => Some(OutputFormat::Gif),
            ImageFormat::Bmp => Some(OutputFormat::Bmp),
            ImageFormat::Tiff => Some(OutputFormat::Tiff),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalized name of a detected codec format (e.g. `ImageFormat::Jpeg` -> "jpeg")
pub fn image_format_name(format: ImageFormat) -> String {
    match OutputFormat::from_image_format(format) {
        Some(known) => known.name().to_string(),
        None => format!("{:?}", format).to_lowercase(),
    }
}
