// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration. Every fixed operational parameter of the pipeline
// lives here; the defaults reproduce the behaviour of the deployed service.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DocmaskError, Result};

/// Largest accepted classifier input side, in pixels.
pub const MAX_CLASSIFIER_INPUT_SIZE: u32 = 4096;

/// How detected spans are written back into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionStrategy {
    /// Replace the first remaining literal occurrence of each span's text,
    /// rightmost spans first. Compatible with existing consumers.
    #[default]
    FirstOccurrence,
    /// Replace exactly the recorded `[start, end)` byte range of each span.
    ByOffset,
}

/// Decoding parameters handed to the sequence generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub num_beams: usize,
    pub early_stopping: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 100,
            num_beams: 5,
            early_stopping: true,
        }
    }
}

/// Geometry of the blank canvas used to render text as a visual surrogate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    /// Left and top margin in pixels.
    pub margin: u32,
    pub line_height: u32,
    /// Characters per rendered line before wrapping.
    pub chars_per_line: usize,
    pub glyph_width: u32,
    pub glyph_height: u32,
    /// Rendering stops once the next line would start within this many
    /// pixels of the bottom edge.
    pub bottom_reserve: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 1000,
            margin: 10,
            line_height: 25,
            chars_per_line: 120,
            glyph_width: 6,
            glyph_height: 14,
            bottom_reserve: 30,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Label set of the document classifier, indexed by class id.
    pub class_labels: Vec<String>,
    /// Side length of the square classifier input.
    pub classifier_input_size: u32,
    /// Minimum detector score for a region to be masked.
    pub detection_threshold: f32,
    /// Token budget of the token classifier.
    pub max_tokens: usize,
    pub generation: GenerationParams,
    pub canvas: CanvasConfig,
    /// RGB fill used when masking regions.
    pub fill_color: [u8; 3],
    pub substitution: SubstitutionStrategy,
    /// Per-invocation timeout. `None` waits indefinitely.
    pub model_timeout_secs: Option<u64>,
    /// Upper bound on model invocations running at once.
    pub max_concurrent_invocations: usize,
    /// Directory holding the OCR detection/recognition models.
    pub ocr_model_dir: Option<PathBuf>,
    /// Entity label → placeholder, applied over the standard mask table.
    pub placeholder_overrides: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            class_labels: vec!["budget".into(), "form".into(), "invoice".into()],
            classifier_input_size: 224,
            detection_threshold: 0.9,
            max_tokens: 512,
            generation: GenerationParams::default(),
            canvas: CanvasConfig::default(),
            fill_color: [0, 0, 0],
            substitution: SubstitutionStrategy::FirstOccurrence,
            model_timeout_secs: Some(120),
            max_concurrent_invocations: 2,
            ocr_model_dir: None,
            placeholder_overrides: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with `DOCMASK_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment-style lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup("DOCMASK_MODEL_TIMEOUT_SECS") {
            let secs: u64 = parse_env("DOCMASK_MODEL_TIMEOUT_SECS", &raw)?;
            self.model_timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(raw) = lookup("DOCMASK_MAX_CONCURRENT") {
            self.max_concurrent_invocations = parse_env("DOCMASK_MAX_CONCURRENT", &raw)?;
        }
        if let Some(raw) = lookup("DOCMASK_DETECTION_THRESHOLD") {
            self.detection_threshold = parse_env("DOCMASK_DETECTION_THRESHOLD", &raw)?;
        }
        if let Some(raw) = lookup("DOCMASK_OCR_MODEL_DIR") {
            self.ocr_model_dir = Some(PathBuf::from(raw));
        }
        self.validate()
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.class_labels.is_empty() {
            return Err(DocmaskError::Config("class_labels must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.detection_threshold) {
            return Err(DocmaskError::Config(format!(
                "detection_threshold must be within [0, 1], got {}",
                self.detection_threshold
            )));
        }
        if self.max_concurrent_invocations == 0 {
            return Err(DocmaskError::Config(
                "max_concurrent_invocations must be at least 1".into(),
            ));
        }
        if self.classifier_input_size > MAX_CLASSIFIER_INPUT_SIZE {
            return Err(DocmaskError::Config(format!(
                "classifier_input_size must be at most {MAX_CLASSIFIER_INPUT_SIZE}, got {}",
                self.classifier_input_size
            )));
        }
        if self.classifier_input_size == 0 || self.max_tokens == 0 {
            return Err(DocmaskError::Config(
                "classifier_input_size and max_tokens must be positive".into(),
            ));
        }
        let canvas = &self.canvas;
        if canvas.width == 0
            || canvas.height == 0
            || canvas.line_height == 0
            || canvas.chars_per_line == 0
        {
            return Err(DocmaskError::Config(
                "canvas dimensions, line height and chars_per_line must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn model_timeout(&self) -> Option<Duration> {
        self.model_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| DocmaskError::Config(format!("{key}: cannot parse '{raw}'")))
}
