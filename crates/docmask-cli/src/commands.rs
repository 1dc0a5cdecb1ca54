// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Each works on local files only; no model is
// loaded by the CLI.

use std::fs;
use std::path::Path;

use docmask_core::config::{PipelineConfig, SubstitutionStrategy};
use docmask_core::error::{DocmaskError, Result};
use docmask_core::labels::{MaskTable, Tag};
use docmask_core::types::{BoundingBox, DocumentFormat, file_extension};
use docmask_document::{Extracted, ExtractionMode, FormatExtractor, ImageProcessor, RegionMaskRenderer};
use docmask_pipeline::{MaskSubstitution, TaggedToken, decode_spans};
use serde::Deserialize;
use tracing::{debug, info};

const KNOWN_EXTENSIONS: &str = "txt, docx, pdf, png, jpg, jpeg, bmp";

/// Defaults, then the config file if given, then `DOCMASK_*` overrides.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Extract `file`. Returns the text, or `None` after writing the visual
/// form to `visual`.
pub fn extract(config: &PipelineConfig, file: &Path, visual: Option<&Path>) -> Result<Option<String>> {
    let format = detect_format(file)?;
    let data = fs::read(file)?;
    let extractor = build_extractor(config)?;

    match visual {
        None => {
            let extracted = extractor.extract(format, &data, ExtractionMode::Text)?;
            Ok(extracted.into_text())
        }
        Some(out) => {
            let image = match extractor.extract(format, &data, ExtractionMode::Visual)? {
                Extracted::Image(image) => image,
                Extracted::Text(_) => {
                    return Err(DocmaskError::Image("no visual form was produced".into()));
                }
            };
            fs::write(out, ImageProcessor::from_rgb(image).to_png_bytes()?)?;
            info!(output = %out.display(), "Visual form written");
            Ok(None)
        }
    }
}

/// Black out `boxes_file` regions of `image_path` and write PNG to `output`.
/// Returns the number of boxes applied.
pub fn mask_regions(
    config: &PipelineConfig,
    image_path: &Path,
    boxes_file: &Path,
    output: &Path,
) -> Result<usize> {
    let image = ImageProcessor::from_bytes(&fs::read(image_path)?)?.into_rgb8();
    let boxes: Vec<BoundingBox> = serde_json::from_slice(&fs::read(boxes_file)?)?;

    let masked = RegionMaskRenderer::new(config.fill_color).render(&image, &boxes);
    fs::write(output, ImageProcessor::from_rgb(masked).to_png_bytes()?)?;
    info!(boxes = boxes.len(), output = %output.display(), "Regions masked");
    Ok(boxes.len())
}

/// One tagged token as stored in a tags file.
#[derive(Debug, Deserialize)]
struct TagRecord {
    start: usize,
    end: usize,
    tag: String,
}

/// Mask the entities described by `tags_file` in `text_file`.
pub fn redact_text(
    config: &PipelineConfig,
    text_file: &Path,
    tags_file: &Path,
    by_offset: bool,
) -> Result<String> {
    let text = String::from_utf8(fs::read(text_file)?)
        .map_err(|err| DocmaskError::decode("text", err))?;
    let records: Vec<TagRecord> = serde_json::from_slice(&fs::read(tags_file)?)?;

    let tokens = records
        .into_iter()
        .map(|r| {
            let tag = Tag::parse(&r.tag)
                .ok_or_else(|| DocmaskError::Config(format!("unknown tag '{}'", r.tag)))?;
            Ok(TaggedToken::new(r.start, r.end, tag))
        })
        .collect::<Result<Vec<_>>>()?;

    let groups = decode_spans(&text, &tokens)?;
    let table = MaskTable::with_overrides(&config.placeholder_overrides)?;
    let strategy = if by_offset {
        SubstitutionStrategy::ByOffset
    } else {
        config.substitution
    };
    Ok(MaskSubstitution::new(&table, strategy).apply(&text, &groups))
}

fn detect_format(file: &Path) -> Result<DocumentFormat> {
    let name = file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let extension = file_extension(&name);
    DocumentFormat::from_extension(&extension).ok_or_else(|| DocmaskError::UnsupportedFormat {
        extension,
        allowed: KNOWN_EXTENSIONS.into(),
    })
}

#[cfg(feature = "ocr")]
fn build_extractor(config: &PipelineConfig) -> Result<FormatExtractor> {
    let extractor = FormatExtractor::new(config.canvas);
    match &config.ocr_model_dir {
        Some(dir) => {
            debug!(dir = %dir.display(), "Loading OCR models");
            let engine = docmask_document::OcrEngine::from_model_dir(dir)?;
            Ok(extractor.with_ocr(std::sync::Arc::new(engine)))
        }
        None => Ok(extractor),
    }
}

#[cfg(not(feature = "ocr"))]
fn build_extractor(config: &PipelineConfig) -> Result<FormatExtractor> {
    if config.ocr_model_dir.is_some() {
        debug!("OCR model directory set but the ocr feature is disabled");
    }
    Ok(FormatExtractor::new(config.canvas))
}
