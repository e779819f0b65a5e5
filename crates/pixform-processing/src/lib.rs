//! Pixform Image Processing Library
//!
//! This crate provides the image-transform pipeline: format conversion, resizing
//! and lossy compression of an uploaded file, plus the cleanup of that file once
//! the transform has finished.

pub mod cleanup;
pub mod compress;
pub mod convert;
pub mod encode;
pub mod error;
pub mod format;
pub mod pool;
pub mod resize;
pub mod service;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use cleanup::{cleanup, TempFile};
pub use compress::CompressService;
pub use convert::ConvertService;
pub use error::TransformError;
pub use format::{content_type_for, normalize_format_name, OutputFormat};
pub use pool::TransformPool;
pub use resize::{FitMode, ResizeDimensions, ResizeService};
pub use service::ImageService;
pub use source::SourceImage;
pub use types::{TransformKind, TransformRequest, TransformResult};
