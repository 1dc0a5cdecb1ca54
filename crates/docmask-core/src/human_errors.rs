// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages and response classes.
//
// Every technical error is mapped to a plain-English message, a suggestion,
// and the HTTP-style status a service front end should answer with.

use crate::error::DocmaskError;

/// Who has to act for the request to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The caller sent something we cannot process (400).
    BadInput,
    /// A model or internal step failed (500).
    Internal,
    /// A collaborator is missing or saturated (503 / 504).
    Unavailable,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the caller should try.
    pub suggestion: String,
    /// HTTP-style status code for the error response.
    pub status: u16,
    pub severity: Severity,
}

impl HumanError {
    fn bad_input(message: &str, suggestion: String) -> Self {
        Self {
            message: message.into(),
            suggestion,
            status: 400,
            severity: Severity::BadInput,
        }
    }

    fn internal(message: &str, suggestion: String) -> Self {
        Self {
            message: message.into(),
            suggestion,
            status: 500,
            severity: Severity::Internal,
        }
    }
}

/// Convert a `DocmaskError` into a `HumanError`.
pub fn humanize_error(err: &DocmaskError) -> HumanError {
    match err {
        DocmaskError::MissingInput(detail) => HumanError::bad_input(
            "Nothing was provided to process.",
            format!("Attach a file or text field and try again. ({detail})"),
        ),

        DocmaskError::UnsupportedFormat { extension, allowed } => HumanError::bad_input(
            "This type of document isn't supported.",
            format!("Convert the '{extension}' file to one of: {allowed}."),
        ),

        DocmaskError::Decode { format, .. } => HumanError::bad_input(
            "The file couldn't be read.",
            format!("The {format} content may be damaged or mislabelled. Check the file opens locally."),
        ),

        DocmaskError::EmptyContent => HumanError::bad_input(
            "No readable text was found.",
            "Make sure the document contains text, or upload a clearer scan.".into(),
        ),

        DocmaskError::TokenAlignment(_) | DocmaskError::ModelInvocation { .. } => {
            HumanError::internal(
                "The model couldn't process this document.",
                "Try again later; if the problem persists, report the document that failed.".into(),
            )
        }

        DocmaskError::ModelUnavailable(model) => HumanError {
            message: "This operation isn't available right now.".into(),
            suggestion: format!("The {model} model is not loaded on this server."),
            status: 503,
            severity: Severity::Unavailable,
        },

        DocmaskError::ModelTimeout { seconds, .. } => HumanError {
            message: "Processing took too long.".into(),
            suggestion: format!("The model did not answer within {seconds}s. Try a smaller document."),
            status: 504,
            severity: Severity::Unavailable,
        },

        DocmaskError::Ocr(_) => HumanError::internal(
            "Text recognition didn't work on this image.",
            "Try a sharper scan with good lighting, or upload a text-based document.".into(),
        ),

        DocmaskError::Image(_) => HumanError::internal(
            "There's a problem with this image.",
            "Try saving it as a PNG or JPEG first.".into(),
        ),

        DocmaskError::Config(detail) => HumanError::internal(
            "The server is misconfigured.",
            format!("Check the pipeline configuration: {detail}"),
        ),

        DocmaskError::Io(_) | DocmaskError::Serialization(_) => HumanError::internal(
            "Something went wrong while handling the document.",
            "Try again.".into(),
        ),
    }
}
