// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding, classifier tensors, PNG/data-URI encoding, region
// masking, and the text-to-canvas surrogate.

pub mod processor;
pub mod redact;
pub mod surrogate;

pub use processor::{ImageProcessor, ImageTensor};
pub use redact::RegionMaskRenderer;
pub use surrogate::TextCanvas;
