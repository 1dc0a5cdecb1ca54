// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR backend built on the `ocrs` crate, a pure-Rust OCR engine backed by
// neural network models executed via `rten`.
//
// # Feature Gate
//
// Only available when the `ocr` feature is enabled:
//
// ```toml
// docmask-document = { path = "crates/docmask-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files in one directory:
//
// - `text-detection.rten` — locates text regions in the image.
// - `text-recognition.rten` — decodes characters from detected regions.
//
// Running `ocrs-cli` once downloads both into `~/.cache/ocrs`, which is the
// default directory when none is configured.

use std::path::{Path, PathBuf};

use docmask_core::error::DocmaskError;
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use super::OcrBackend;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two OCR model files.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<(), DocmaskError> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(DocmaskError::Ocr(format!(
                    "model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Extracts text from scanned document images.
///
/// Model loading is the expensive step; build the engine once and share it.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Load both models named in `config`.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self, DocmaskError> {
        config.validate()?;

        info!("Loading OCR models");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            DocmaskError::Ocr(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                DocmaskError::Ocr(format!(
                    "failed to load recognition model from {}: {}",
                    config.recognition_model_path.display(),
                    err
                ))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| DocmaskError::Ocr(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Load models from a specific directory.
    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self, DocmaskError> {
        Self::new(OcrConfig::from_dir(dir))
    }

    /// Load models from the default cache directory.
    pub fn with_defaults() -> Result<Self, DocmaskError> {
        Self::new(OcrConfig::default())
    }
}

impl OcrBackend for OcrEngine {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize_text(&self, image: &DynamicImage) -> Result<String, DocmaskError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            DocmaskError::Ocr(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| DocmaskError::Ocr(format!("OCR preprocessing failed: {err}")))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| DocmaskError::Ocr(format!("OCR text recognition failed: {err}")))?;

        debug!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "OCR recognition complete"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_dir() {
        let config = OcrConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn missing_models_fail_validation() {
        let config = OcrConfig::from_dir("/nonexistent/path/ocr-models");
        assert!(matches!(config.validate(), Err(DocmaskError::Ocr(_))));
    }
}
