// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docmask.

use thiserror::Error;

/// Top-level error type for all docmask operations.
#[derive(Debug, Error)]
pub enum DocmaskError {
    // -- Request errors --
    #[error("{0}")]
    MissingInput(String),

    #[error("Unsupported file type '{extension}'. Allowed: {allowed}")]
    UnsupportedFormat { extension: String, allowed: String },

    #[error("failed to decode {format} content: {detail}")]
    Decode { format: String, detail: String },

    #[error("No readable text found in the input.")]
    EmptyContent,

    // -- Model collaborator errors --
    #[error("{model} inference failed: {detail}")]
    ModelInvocation { model: String, detail: String },

    #[error("no {0} model is configured")]
    ModelUnavailable(String),

    #[error("{model} inference timed out after {seconds}s")]
    ModelTimeout { model: String, seconds: u64 },

    #[error("token offsets do not align with the input text: {0}")]
    TokenAlignment(String),

    // -- Document errors --
    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("image processing failed: {0}")]
    Image(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocmaskError {
    /// Shorthand for a [`DocmaskError::Decode`] with a format name.
    pub fn decode(format: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Decode {
            format: format.into(),
            detail: detail.to_string(),
        }
    }

    /// Shorthand for a [`DocmaskError::ModelInvocation`].
    pub fn model(model: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::ModelInvocation {
            model: model.into(),
            detail: detail.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocmaskError>;
