// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the docmask pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{DocmaskError, Result};
use crate::labels::EntityType;

/// Input document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    PlainText,
    /// Word-processor document (Office Open XML).
    Docx,
    Pdf,
    Png,
    Jpeg,
    Bmp,
}

impl DocumentFormat {
    /// MIME type string for the format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Bmp => "image/bmp",
        }
    }

    /// Infer the format from a bare file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::PlainText),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Whether the format is a raster image.
    pub fn is_raster(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Bmp)
    }
}

/// Lower-cased extension of a filename, or an empty string when there is none.
pub fn file_extension(filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    match lower.rsplit_once('.') {
        Some((_, ext)) => ext.to_string(),
        None => String::new(),
    }
}

/// The four operations the pipeline exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Document-type classification from a visual rendering.
    Classification,
    /// Blackout of detected regions in a raster image.
    RegionMask,
    /// Placeholder substitution of sensitive entities in plain text.
    TextMask,
    /// Abstractive summarisation of the extracted text.
    Summarization,
}

impl Operation {
    /// Task name as reported by the health endpoint.
    pub fn task_name(&self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::RegionMask => "image-masking",
            Self::TextMask => "pii",
            Self::Summarization => "summarization",
        }
    }

    /// Every operation, in the order the service advertises them.
    pub fn all() -> [Operation; 4] {
        [
            Self::Classification,
            Self::RegionMask,
            Self::TextMask,
            Self::Summarization,
        ]
    }

    /// File extensions accepted for uploads to this operation.
    ///
    /// Text masking takes its input as a JSON text field, never as a file.
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Classification => &["jpg", "jpeg", "png", "bmp", "txt", "docx", "pdf"],
            Self::RegionMask => &["jpg", "jpeg", "png", "bmp"],
            Self::TextMask => &[],
            Self::Summarization => &["pdf", "docx", "txt", "jpeg", "jpg", "png"],
        }
    }

    /// Resolve the format of an uploaded file, rejecting extensions outside
    /// this operation's allowed set.
    pub fn check_upload(&self, filename: &str) -> Result<DocumentFormat> {
        let extension = file_extension(filename);
        let allowed = self.allowed_extensions();
        if !allowed.contains(&extension.as_str()) {
            return Err(DocmaskError::UnsupportedFormat {
                extension,
                allowed: allowed.join(", "),
            });
        }
        DocumentFormat::from_extension(&extension).ok_or_else(|| {
            DocmaskError::UnsupportedFormat {
                extension,
                allowed: allowed.join(", "),
            }
        })
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.task_name())
    }
}

/// An uploaded file: its declared name plus raw bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Axis-aligned box in image pixel coordinates.
///
/// Serialises as `[xmin, ymin, xmax, ymax]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl BoundingBox {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([xmin, ymin, xmax, ymax]: [f32; 4]) -> Self {
        Self::new(xmin, ymin, xmax, ymax)
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.xmin, b.ymin, b.xmax, b.ymax]
    }
}

/// One detected entity occurrence reconstructed from tagged tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub entity_type: EntityType,
    /// Token slices concatenated with no separator.
    pub text: String,
    /// Byte offset of the first token in the source text.
    pub start: usize,
    /// Exclusive byte offset of the last token in the source text.
    pub end: usize,
}
