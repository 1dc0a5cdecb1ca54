// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Response envelope — the uniform JSON shape every dispatch produces.

use docmask_core::error::DocmaskError;
use docmask_core::human_errors::humanize_error;
use docmask_core::types::{BoundingBox, Operation};
use serde::Serialize;

/// Operation-specific result body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskOutput {
    Classification {
        prediction: String,
        confidence: f64,
    },
    RegionMask {
        boxes: Vec<BoundingBox>,
        labels: Vec<String>,
        scores: Vec<f32>,
        /// `data:image/png;base64,...`
        masked_image: String,
    },
    TextMask {
        masked_text: String,
    },
    Summary {
        summary: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
}

/// `{status, payload}` on success, `{error}` on failure. Never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success {
        status: ResponseStatus,
        payload: TaskOutput,
    },
    Failure {
        error: String,
        #[serde(skip_serializing)]
        http_status: u16,
    },
}

impl Envelope {
    pub fn success(payload: TaskOutput) -> Self {
        Self::Success {
            status: ResponseStatus::Ok,
            payload,
        }
    }

    pub fn failure(err: &DocmaskError) -> Self {
        Self::Failure {
            error: err.to_string(),
            http_status: humanize_error(err).status,
        }
    }

    /// Status code a service front end should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Success { .. } => 200,
            Self::Failure { http_status, .. } => *http_status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn payload(&self) -> Option<&TaskOutput> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

/// Body of the service root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub message: String,
}

/// Body of the health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: ResponseStatus,
    pub tasks: Vec<&'static str>,
}

impl Health {
    pub fn ok() -> Self {
        Self {
            status: ResponseStatus::Ok,
            tasks: Operation::all().iter().map(Operation::task_name).collect(),
        }
    }
}
