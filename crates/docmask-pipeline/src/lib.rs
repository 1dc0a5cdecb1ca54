// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docmask-pipeline — Entity span decoding, placeholder masking, model
// collaborator traits, and the task dispatcher.

pub mod dispatcher;
pub mod envelope;
pub mod models;
pub mod ner;

pub use dispatcher::{ModelSuite, Payload, TaskDispatcher, TaskRequest};
pub use envelope::{Banner, Envelope, Health, TaskOutput};
pub use models::{
    ClassScores, Detections, DocumentClassifier, RegionDetector, SummaryGenerator, TokenTagger,
    TokenTags,
};
pub use ner::{MaskSubstitution, SpanGroup, SpanGroups, TaggedToken, decode_spans};
