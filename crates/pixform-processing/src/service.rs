use crate::cleanup::TempFile;
use crate::compress::CompressService;
use crate::convert::ConvertService;
use crate::error::TransformError;
use crate::resize::ResizeService;
use crate::types::{TransformRequest, TransformResult};

/// Façade over the three transform services.
///
/// Holds no state besides the services; cloning is cheap.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageService {
    convert: ConvertService,
    resize: ResizeService,
    compress: CompressService,
}

impl ImageService {
    pub fn new(quality_ceiling: u8) -> Self {
        Self {
            convert: ConvertService::new(),
            resize: ResizeService::new(),
            compress: CompressService::new(quality_ceiling),
        }
    }

    /// Dispatch a request to the matching service
    pub fn process(
        &self,
        source: TempFile,
        request: &TransformRequest,
    ) -> Result<TransformResult, TransformError> {
        match request {
            TransformRequest::Convert { target_format } => {
                self.convert_format(source, target_format)
            }
            TransformRequest::Resize {
                width,
                height,
                maintain_aspect_ratio,
            } => self.resize_image(source, *width, *height, *maintain_aspect_ratio),
            TransformRequest::Compress {
                quality,
                target_format,
            } => self.compress_image(source, *quality, target_format.as_deref()),
        }
    }

    pub fn convert_format(
        &self,
        source: TempFile,
        format: &str,
    ) -> Result<TransformResult, TransformError> {
        self.convert.convert_format(source, format)
    }

    pub fn resize_image(
        &self,
        source: TempFile,
        width: Option<u32>,
        height: Option<u32>,
        maintain_aspect_ratio: bool,
    ) -> Result<TransformResult, TransformError> {
        self.resize
            .resize_image(source, width, height, maintain_aspect_ratio)
    }

    pub fn compress_image(
        &self,
        source: TempFile,
        quality: i32,
        format: Option<&str>,
    ) -> Result<TransformResult, TransformError> {
        self.compress.compress_image(source, quality, format)
    }
}
