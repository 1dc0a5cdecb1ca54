// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format extraction — turns an uploaded document of any supported format
// into either plain text or an RGB image, whichever the requesting operation
// needs.

pub mod docx;

use std::sync::Arc;

use docmask_core::config::CanvasConfig;
use docmask_core::error::DocmaskError;
use docmask_core::types::DocumentFormat;
use image::RgbImage;
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;
use crate::image::surrogate::TextCanvas;
use crate::pdf::reader::PdfReader;
use crate::scan::OcrBackend;

/// Which representation the downstream model needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Plain text (OCR for raster inputs).
    Text,
    /// RGB image (text surrogate for textual inputs).
    Visual,
}

/// Normalised form of an uploaded document.
#[derive(Debug, Clone)]
pub enum Extracted {
    Text(String),
    Image(RgbImage),
}

impl Extracted {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Image(_) => None,
        }
    }

    pub fn into_image(self) -> Option<RgbImage> {
        match self {
            Self::Image(image) => Some(image),
            Self::Text(_) => None,
        }
    }
}

/// Converts uploads into text or images.
///
/// Cheap to clone; the OCR backend is shared.
#[derive(Clone)]
pub struct FormatExtractor {
    canvas: TextCanvas,
    ocr: Option<Arc<dyn OcrBackend>>,
}

impl Default for FormatExtractor {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl FormatExtractor {
    pub fn new(canvas: CanvasConfig) -> Self {
        Self {
            canvas: TextCanvas::new(canvas),
            ocr: None,
        }
    }

    /// Attach an OCR backend for recovering text from raster uploads.
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrBackend>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract `data` (declared as `format`) in the requested mode.
    #[instrument(skip(self, data), fields(bytes_len = data.len()))]
    pub fn extract(
        &self,
        format: DocumentFormat,
        data: &[u8],
        mode: ExtractionMode,
    ) -> Result<Extracted, DocmaskError> {
        match mode {
            ExtractionMode::Text => self.extract_text(format, data).map(Extracted::Text),
            ExtractionMode::Visual => self.extract_image(format, data).map(Extracted::Image),
        }
    }

    /// Recover text. Raster images go through OCR.
    pub fn extract_text(
        &self,
        format: DocumentFormat,
        data: &[u8],
    ) -> Result<String, DocmaskError> {
        let text = match format {
            DocumentFormat::PlainText => decode_utf8(data)?,
            DocumentFormat::Docx => docx::extract_text(data)?,
            DocumentFormat::Pdf => PdfReader::from_bytes(data)?.extract_text(),
            DocumentFormat::Png | DocumentFormat::Jpeg | DocumentFormat::Bmp => {
                let ocr = self.ocr.as_ref().ok_or_else(|| {
                    DocmaskError::Ocr("no OCR backend is configured".into())
                })?;
                let image = ImageProcessor::from_bytes(data)?;
                info!("Running OCR on raster upload");
                ocr.recognize_text(image.as_dynamic())?
            }
        };
        debug!(?format, chars = text.chars().count(), "Text extracted");
        Ok(text)
    }

    /// Produce an RGB image. Textual formats are rendered onto the surrogate
    /// canvas.
    pub fn extract_image(
        &self,
        format: DocumentFormat,
        data: &[u8],
    ) -> Result<RgbImage, DocmaskError> {
        if format.is_raster() {
            return Ok(ImageProcessor::from_bytes(data)?.into_rgb8());
        }
        let text = self.extract_text(format, data)?;
        debug!(?format, "Rendering text surrogate");
        Ok(self.canvas.render(&text))
    }
}

/// Strict UTF-8 decoding; invalid sequences are an error, never replaced.
fn decode_utf8(data: &[u8]) -> Result<String, DocmaskError> {
    String::from_utf8(data.to_vec()).map_err(|err| DocmaskError::decode("text", err))
}
