//! Image transform endpoints

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::Response,
};
use pixform_core::AppError;
use pixform_processing::{TransformKind, TransformResult};

use crate::error::{ErrorResponse, HttpAppError};
use crate::params::{CompressParams, ConvertParams, ResizeParams, TransformParams};
use crate::state::AppState;
use crate::utils::upload::{receive_image_upload, ImageUpload, UploadOptions};

/// Connectivity check
#[utoipa::path(
    get,
    path = "/image",
    tag = "image",
    responses(
        (status = 200, description = "Service is reachable", body = String, content_type = "text/plain")
    )
)]
pub async fn check_connection() -> &'static str {
    tracing::debug!("Connection verified");
    "Hello World"
}

/// Convert an uploaded image to another format
///
/// Form fields: `image` (file), `format` (jpg, jpeg, png, webp, gif, bmp or tiff).
/// A `bmp` request is delivered as GIF.
#[utoipa::path(
    post,
    path = "/image/convert",
    tag = "image",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Converted image", content_type = "image/*"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Conversion failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "convert"))]
pub async fn convert_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, HttpAppError> {
    transform_upload::<ConvertParams>(&state, multipart?).await
}

/// Resize an uploaded image; the result is always JPEG
///
/// Form fields: `image` (file), optional `width` and `height` (positive integers, at
/// least one required), optional `maintainAspectRatio` (`"true"` by default; any
/// other value stretches to the exact box).
#[utoipa::path(
    post,
    path = "/image/resize",
    tag = "image",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resized JPEG image", content_type = "image/jpeg"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Resize failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "resize"))]
pub async fn resize_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, HttpAppError> {
    transform_upload::<ResizeParams>(&state, multipart?).await
}

/// Re-encode an uploaded image at a capped quality
///
/// Form fields: `image` (file), `quality` (1-100), optional `format`. Without a
/// format the source format is kept when it is JPEG, PNG or WebP.
#[utoipa::path(
    post,
    path = "/image/compress",
    tag = "image",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Compressed image", content_type = "image/*"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Compression failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "compress"))]
pub async fn compress_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, HttpAppError> {
    transform_upload::<CompressParams>(&state, multipart?).await
}

/// Receive the upload, validate parameters, run the transform on the pool.
///
/// The uploaded file is owned by a `TempFile` throughout, so it is removed
/// whichever step fails.
async fn transform_upload<P: TransformParams>(
    state: &AppState,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let options = UploadOptions {
        upload_dir: state.config.upload_dir.clone(),
        max_file_size: state.config.max_upload_size_bytes,
    };
    let ImageUpload { image, fields } = receive_image_upload(multipart, &options).await?;

    let request = match P::parse(&fields) {
        Ok(params) => params.into_request(),
        Err(e) => {
            if let Some(image) = image {
                image.file.release().await;
            }
            return Err(e.into());
        }
    };
    let image = image.ok_or_else(|| AppError::InvalidInput("No image file provided".to_string()))?;

    let kind = request.kind();
    tracing::info!(
        kind = %kind,
        original_name = ?image.original_name,
        content_type = %image.content_type,
        size = image.size,
        "Processing uploaded image"
    );

    let images = state.images;
    let source = image.file;
    let result = state
        .pool
        .run(move || images.process(source, &request))
        .await?;

    tracing::info!(
        kind = %kind,
        format = %result.format,
        quality = ?result.quality,
        output_size = result.len(),
        "Transform complete"
    );

    binary_response(kind, result)
}

/// Attachment response carrying the encoded image
fn binary_response(kind: TransformKind, result: TransformResult) -> Result<Response, HttpAppError> {
    if result.is_empty() {
        return Err(AppError::ImageProcessing(format!(
            "Encoder produced no {} output",
            result.format
        ))
        .into());
    }

    let file_name = result.file_name(kind);
    let content_length = result.len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type())
        .header(header::CONTENT_LENGTH, content_length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .body(Body::from(result.bytes))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            AppError::Internal(e.to_string()).into()
        })
}
