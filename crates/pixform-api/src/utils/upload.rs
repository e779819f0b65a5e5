//! Receiving image uploads from multipart forms
//!
//! The file part is streamed straight to the upload directory under a fresh
//! `<uuid><ext>` name; text parts are collected for the parameter parsers.

use crate::error::HttpAppError;
use axum::extract::multipart::Field;
use axum::extract::Multipart;
use pixform_core::AppError;
use pixform_processing::TempFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Name of the multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

const MAX_EXTENSION_LENGTH: usize = 10;

/// The image part of an upload, already on disk
#[derive(Debug)]
pub struct UploadedImage {
    pub file: TempFile,
    pub original_name: Option<String>,
    pub content_type: String,
    pub size: u64,
}

/// Everything received from one multipart form
#[derive(Debug, Default)]
pub struct ImageUpload {
    pub image: Option<UploadedImage>,
    pub fields: HashMap<String, String>,
}

/// Upload limits and destination
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub upload_dir: PathBuf,
    pub max_file_size: usize,
}

/// Read a multipart form, writing the `image` part to disk.
///
/// A missing image is not an error here: parameter validation runs first and the
/// handler decides. On any error the stored file is removed before returning.
pub async fn receive_image_upload(
    mut multipart: Multipart,
    options: &UploadOptions,
) -> Result<ImageUpload, HttpAppError> {
    let mut upload = ImageUpload::default();

    match read_form(&mut multipart, options, &mut upload).await {
        Ok(()) => Ok(upload),
        Err(e) => {
            if let Some(image) = upload.image.take() {
                image.file.release().await;
            }
            Err(e)
        }
    }
}

async fn read_form(
    multipart: &mut Multipart,
    options: &UploadOptions,
    upload: &mut ImageUpload,
) -> Result<(), HttpAppError> {
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == IMAGE_FIELD {
            if upload.image.is_some() {
                return Err(AppError::InvalidInput(
                    "Multiple image fields are not allowed; send exactly one field named 'image'"
                        .to_string(),
                )
                .into());
            }
            upload.image = Some(store_image_field(field, options).await?);
        } else if field.file_name().is_some() {
            return Err(AppError::InvalidInput(format!(
                "Unexpected file field '{}'; the image must be sent as '{}'",
                field_name, IMAGE_FIELD
            ))
            .into());
        } else {
            let value = field.text().await?;
            upload.fields.insert(field_name, value);
        }
    }

    Ok(())
}

async fn store_image_field(
    mut field: Field<'_>,
    options: &UploadOptions,
) -> Result<UploadedImage, HttpAppError> {
    let content_type = field.content_type().map(|s| s.to_string()).unwrap_or_default();
    validate_image_content_type(&content_type)?;

    let original_name = field.file_name().map(|s| s.to_string());
    let file_name = format!(
        "{}{}",
        Uuid::new_v4(),
        original_name.as_deref().map(file_extension).unwrap_or_default()
    );
    let path = options.upload_dir.join(file_name);

    let mut out = tokio::fs::File::create(&path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to create upload file");
        AppError::from(e)
    })?;
    // From here on the file is removed on every exit path
    let file = TempFile::new(&path);

    let size = match write_chunks(&mut field, &mut out, options.max_file_size).await {
        Ok(size) => size,
        Err(e) => {
            drop(out);
            file.release().await;
            return Err(e);
        }
    };

    tracing::debug!(
        path = %file.path().display(),
        original_name = ?original_name,
        content_type = %content_type,
        size,
        "Stored uploaded image"
    );

    Ok(UploadedImage {
        file,
        original_name,
        content_type,
        size,
    })
}

/// Stream the field body into `out`, enforcing the size ceiling per chunk
async fn write_chunks(
    field: &mut Field<'_>,
    out: &mut tokio::fs::File,
    max_file_size: usize,
) -> Result<u64, HttpAppError> {
    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        size += chunk.len() as u64;
        validate_file_size(size, max_file_size)?;
        out.write_all(&chunk).await.map_err(AppError::from)?;
    }
    out.flush().await.map_err(AppError::from)?;
    Ok(size)
}

/// Only `image/*` parts are accepted
pub fn validate_image_content_type(content_type: &str) -> Result<(), AppError> {
    if content_type.trim().to_lowercase().starts_with("image/") {
        Ok(())
    } else {
        Err(AppError::InvalidInput(
            "Only image files are allowed".to_string(),
        ))
    }
}

/// Validate file size
pub fn validate_file_size(file_size: u64, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size as u64 {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Extension of the client's file name, including the dot, reduced to characters
/// that are safe in a path. Empty when there is none.
pub fn file_extension(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    let sanitized: String = extension
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_EXTENSION_LENGTH)
        .collect();

    if sanitized.is_empty() {
        String::new()
    } else {
        format!(".{}", sanitized)
    }
}
