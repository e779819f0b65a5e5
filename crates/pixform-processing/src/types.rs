use crate::format::OutputFormat;
use bytes::Bytes;

/// A transform to apply to an uploaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformRequest {
    Convert {
        target_format: String,
    },
    Resize {
        width: Option<u32>,
        height: Option<u32>,
        maintain_aspect_ratio: bool,
    },
    Compress {
        quality: i32,
        target_format: Option<String>,
    },
}

impl TransformRequest {
    pub fn kind(&self) -> TransformKind {
        match self {
            TransformRequest::Convert { .. } => TransformKind::Convert,
            TransformRequest::Resize { .. } => TransformKind::Resize,
            TransformRequest::Compress { .. } => TransformKind::Compress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Convert,
    Resize,
    Compress,
}

impl TransformKind {
    /// Past-tense verb used as the download file stem (`converted.png`)
    pub fn verb(self) -> &'static str {
        match self {
            TransformKind::Convert => "converted",
            TransformKind::Resize => "resized",
            TransformKind::Compress => "compressed",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransformKind::Convert => "convert",
            TransformKind::Resize => "resize",
            TransformKind::Compress => "compress",
        }
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded output of a transform
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub bytes: Bytes,
    /// Format actually written, which may differ from the one requested
    pub format: OutputFormat,
    /// Lossy quality the encoder was driven with, when one applies
    pub quality: Option<u8>,
}

impl TransformResult {
    pub fn new(bytes: Bytes, format: OutputFormat, quality: Option<u8>) -> Self {
        Self {
            bytes,
            format,
            quality,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// `<verb>.<ext>` download name for this result
    pub fn file_name(&self, kind: TransformKind) -> String {
        format!("{}.{}", kind.verb(), self.format.name())
    }
}
