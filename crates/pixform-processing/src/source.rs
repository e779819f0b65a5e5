//! Decoding of the uploaded source image

use crate::format::image_format_name;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::path::{Path, PathBuf};

/// Attributes of an uploaded image, read when it is decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    /// Normalized name of the detected format, if the codec recognised one
    pub format: Option<String>,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub size_bytes: u64,
}

impl SourceImage {
    /// Decode the file at `path`, returning its attributes and pixels.
    ///
    /// The format is sniffed from the content, not the file extension.
    pub fn load(path: &Path) -> Result<(Self, DynamicImage), anyhow::Error> {
        let size_bytes = std::fs::metadata(path)?.len();

        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let detected: Option<ImageFormat> = reader.format();
        let img = reader.decode()?;

        let (width, height) = img.dimensions();
        let source = SourceImage {
            path: path.to_path_buf(),
            format: detected.map(image_format_name),
            width,
            height,
            has_alpha: img.color().has_alpha(),
            size_bytes,
        };

        tracing::debug!(
            path = %path.display(),
            format = ?source.format,
            width,
            height,
            has_alpha = source.has_alpha,
            size_bytes,
            "Decoded source image"
        );

        Ok((source, img))
    }
}
