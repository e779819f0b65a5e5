//! Form parameters of the transform endpoints
//!
//! Multipart text fields arrive as strings. Each endpoint has a parameter struct that
//! parses them, rejects fields it does not know, and range-checks values with
//! `validator` before any transform runs.

use pixform_core::AppError;
use pixform_processing::TransformRequest;
use std::collections::HashMap;
use validator::Validate;

/// Text fields of a multipart form, keyed by field name
pub type FormFields = HashMap<String, String>;

pub trait TransformParams: Sized + Validate {
    /// Text fields the endpoint accepts
    const FIELDS: &'static [&'static str];

    fn from_fields(fields: &FormFields) -> Result<Self, AppError>;

    fn into_request(self) -> TransformRequest;

    /// Whitelist, parse and validate
    fn parse(fields: &FormFields) -> Result<Self, AppError> {
        reject_unknown_fields(fields, Self::FIELDS)?;
        let params = Self::from_fields(fields)?;
        params.validate()?;
        Ok(params)
    }
}

fn reject_unknown_fields(fields: &FormFields, allowed: &[&str]) -> Result<(), AppError> {
    let mut unknown: Vec<&str> = fields
        .keys()
        .map(String::as_str)
        .filter(|name| !allowed.contains(name))
        .collect();

    if unknown.is_empty() {
        return Ok(());
    }

    unknown.sort_unstable();
    Err(AppError::InvalidInput(
        unknown
            .iter()
            .map(|name| format!("property {} should not exist", name))
            .collect::<Vec<_>>()
            .join(", "),
    ))
}

fn parse_integer(fields: &FormFields, name: &str) -> Result<Option<i64>, AppError> {
    fields
        .get(name)
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .map_err(|_| AppError::InvalidInput(format!("{} must be an integer", name)))
        })
        .transpose()
}

#[derive(Debug, Clone, Validate)]
pub struct ConvertParams {
    #[validate(length(min = 1, message = "format must not be empty"))]
    pub format: String,
}

impl TransformParams for ConvertParams {
    const FIELDS: &'static [&'static str] = &["format"];

    fn from_fields(fields: &FormFields) -> Result<Self, AppError> {
        let format = fields
            .get("format")
            .cloned()
            .ok_or_else(|| AppError::InvalidInput("format is required".to_string()))?;
        Ok(Self { format })
    }

    fn into_request(self) -> TransformRequest {
        TransformRequest::Convert {
            target_format: self.format,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct ResizeParams {
    #[validate(range(min = 1i64, max = 4294967295i64, message = "width must be a positive integer"))]
    pub width: Option<i64>,
    #[validate(range(min = 1i64, max = 4294967295i64, message = "height must be a positive integer"))]
    pub height: Option<i64>,
    pub maintain_aspect_ratio: bool,
}

impl TransformParams for ResizeParams {
    const FIELDS: &'static [&'static str] = &["width", "height", "maintainAspectRatio"];

    fn from_fields(fields: &FormFields) -> Result<Self, AppError> {
        Ok(Self {
            width: parse_integer(fields, "width")?,
            height: parse_integer(fields, "height")?,
            // Only the literal "true" enables it once the field is sent
            maintain_aspect_ratio: fields
                .get("maintainAspectRatio")
                .map(|value| value == "true")
                .unwrap_or(true),
        })
    }

    fn into_request(self) -> TransformRequest {
        TransformRequest::Resize {
            width: self.width.map(|w| w as u32),
            height: self.height.map(|h| h as u32),
            maintain_aspect_ratio: self.maintain_aspect_ratio,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct CompressParams {
    #[validate(range(min = 1, max = 100, message = "quality must be between 1 and 100"))]
    pub quality: i64,
    pub format: Option<String>,
}

impl TransformParams for CompressParams {
    const FIELDS: &'static [&'static str] = &["quality", "format"];

    fn from_fields(fields: &FormFields) -> Result<Self, AppError> {
        let quality = parse_integer(fields, "quality")?
            .ok_or_else(|| AppError::InvalidInput("quality is required".to_string()))?;
        Ok(Self {
            quality,
            format: fields.get("format").cloned(),
        })
    }

    fn into_request(self) -> TransformRequest {
        TransformRequest::Compress {
            quality: self.quality as i32,
            target_format: self.format,
        }
    }
}
