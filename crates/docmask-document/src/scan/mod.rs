// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optical character recognition for raster uploads.
//
// The extractor depends only on the `OcrBackend` trait; the `ocrs`-backed
// engine is compiled in with the `ocr` feature.

use docmask_core::error::DocmaskError;
use image::DynamicImage;

#[cfg(feature = "ocr")]
pub mod ocr;

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;

/// Recovers an approximate text rendering of a raster image.
///
/// Output quality is not guaranteed and no post-correction is applied.
pub trait OcrBackend: Send + Sync {
    fn recognize_text(&self, image: &DynamicImage) -> Result<String, DocmaskError>;
}
