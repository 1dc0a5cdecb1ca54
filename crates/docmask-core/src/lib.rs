// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docmask — Core types, error definitions, entity vocabulary, and pipeline
// configuration shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod labels;
pub mod types;

pub use config::PipelineConfig;
pub use error::DocmaskError;
pub use labels::{EntityType, MaskTable, Tag, TagVocabulary};
pub use types::*;
