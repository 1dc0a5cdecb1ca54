// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docmask-document — Document ingestion and image handling for docmask.
//
// Normalises uploads of plain text, DOCX, PDF, and raster images into either
// text or an RGB image (extract), renders text onto a blank canvas when a
// visual form is needed (image::surrogate), prepares classifier input
// tensors, and blacks out detected regions (image::redact).

pub mod extract;
pub mod image;
pub mod pdf;
pub mod scan;

// Re-export the primary structs so callers can use `docmask_document::FormatExtractor` etc.
pub use extract::{Extracted, ExtractionMode, FormatExtractor};
pub use image::processor::{ImageProcessor, ImageTensor};
pub use image::redact::RegionMaskRenderer;
pub use image::surrogate::TextCanvas;
pub use pdf::reader::PdfReader;
pub use scan::OcrBackend;

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrEngine;
