// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Model seams — the four inference capabilities the dispatcher consumes.
//
// Implementations wrap whatever runtime hosts the weights; the dispatcher
// only sees these traits, so tests substitute deterministic fakes. Every
// method is synchronous and may block; the dispatcher runs calls on the
// blocking pool.

use docmask_core::config::GenerationParams;
use docmask_core::error::{DocmaskError, Result};
use docmask_core::labels::TagVocabulary;
use docmask_core::types::BoundingBox;
use docmask_document::ImageTensor;
use image::RgbImage;

use crate::ner::TaggedToken;

/// Raw classifier output for a single image.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassScores {
    /// Already a probability distribution.
    Probabilities(Vec<f32>),
    /// Unnormalised scores; softmax is applied before use.
    Logits(Vec<f32>),
}

impl ClassScores {
    /// Probability per class.
    pub fn probabilities(&self) -> Vec<f32> {
        match self {
            Self::Probabilities(p) => p.clone(),
            Self::Logits(logits) => softmax(logits),
        }
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Image-level document classifier.
pub trait DocumentClassifier: Send + Sync {
    /// Score one normalised `[1, 3, H, W]` tensor.
    fn classify(&self, tensor: &ImageTensor) -> Result<ClassScores>;
}

/// Object detections for one image; the three vectors are parallel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detections {
    pub boxes: Vec<BoundingBox>,
    pub labels: Vec<i64>,
    pub scores: Vec<f32>,
}

impl Detections {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Reject outputs whose vectors disagree in length.
    pub fn validate(&self) -> Result<()> {
        if self.labels.len() != self.boxes.len() || self.scores.len() != self.boxes.len() {
            return Err(DocmaskError::model(
                "detector",
                format!(
                    "mismatched output lengths: {} boxes, {} labels, {} scores",
                    self.boxes.len(),
                    self.labels.len(),
                    self.scores.len()
                ),
            ));
        }
        Ok(())
    }

    /// Keep detections whose score is strictly above `threshold`.
    pub fn retain_confident(&mut self, threshold: f32) {
        let keep: Vec<bool> = self.scores.iter().map(|s| *s > threshold).collect();
        let mut flags = keep.iter();
        self.boxes.retain(|_| *flags.next().unwrap_or(&false));
        let mut flags = keep.iter();
        self.labels.retain(|_| *flags.next().unwrap_or(&false));
        self.scores.retain(|s| *s > threshold);
    }
}

/// Region detector (boxes in pixel coordinates of the input image).
pub trait RegionDetector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Detections>;

    /// Human-readable name for a label id, when the model carries one.
    fn label_name(&self, _id: i64) -> Option<String> {
        None
    }
}

/// Per-token classifier output: byte offsets into the input text and one
/// vocabulary index per token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTags {
    pub offsets: Vec<(usize, usize)>,
    pub tag_ids: Vec<usize>,
}

impl TokenTags {
    /// Resolve tag ids against `vocabulary`.
    pub fn into_tagged(self, vocabulary: &TagVocabulary) -> Result<Vec<TaggedToken>> {
        if self.offsets.len() != self.tag_ids.len() {
            return Err(DocmaskError::model(
                "token tagger",
                format!(
                    "{} offsets but {} tag ids",
                    self.offsets.len(),
                    self.tag_ids.len()
                ),
            ));
        }
        self.offsets
            .into_iter()
            .zip(self.tag_ids)
            .map(|((start, end), id)| {
                let tag = vocabulary.tag(id).ok_or_else(|| {
                    DocmaskError::model(
                        "token tagger",
                        format!("tag id {id} outside a {}-entry vocabulary", vocabulary.len()),
                    )
                })?;
                Ok(TaggedToken::new(start, end, tag))
            })
            .collect()
    }
}

/// Token classifier; truncates its input to `max_tokens`.
pub trait TokenTagger: Send + Sync {
    fn tag(&self, text: &str, max_tokens: usize) -> Result<TokenTags>;
}

/// Abstractive summariser.
pub trait SummaryGenerator: Send + Sync {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmask_core::labels::{EntityType, Tag};

    #[test]
    fn softmax_normalises_logits() {
        let probs = ClassScores::Logits(vec![1.0, 2.0, 3.0]).probabilities();
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
        assert!((probs[2] - 0.665).abs() < 0.01);
    }

    #[test]
    fn probabilities_pass_through() {
        let probs = ClassScores::Probabilities(vec![0.2, 0.8]).probabilities();
        assert_eq!(probs, vec![0.2, 0.8]);
    }

    #[test]
    fn detections_length_mismatch_is_an_error() {
        let det = Detections {
            boxes: vec![BoundingBox::new(0.0, 0.0, 1.0, 1.0)],
            labels: vec![],
            scores: vec![0.9],
        };
        assert!(matches!(det.validate(), Err(DocmaskError::ModelInvocation { .. })));
    }

    #[test]
    fn retain_confident_drops_scores_at_threshold() {
        let mut det = Detections {
            boxes: vec![
                BoundingBox::new(0.0, 0.0, 1.0, 1.0),
                BoundingBox::new(2.0, 2.0, 3.0, 3.0),
                BoundingBox::new(4.0, 4.0, 5.0, 5.0),
            ],
            labels: vec![1, 2, 3],
            scores: vec![0.95, 0.9, 0.91],
        };
        det.retain_confident(0.9);
        assert_eq!(det.labels, vec![1, 3]);
        assert_eq!(det.scores, vec![0.95, 0.91]);
        assert_eq!(det.boxes[1], BoundingBox::new(4.0, 4.0, 5.0, 5.0));
    }

    #[test]
    fn token_tags_resolve_against_vocabulary() {
        let vocab = TagVocabulary::standard();
        let tags = TokenTags {
            offsets: vec![(0, 3), (3, 5)],
            tag_ids: vec![25, 128],
        };
        let tokens = tags.into_tagged(vocab).unwrap();
        assert_eq!(tokens[0].tag, Tag::Begin(EntityType::Email));
        assert_eq!(tokens[1].tag, Tag::Outside);
        assert_eq!((tokens[1].start, tokens[1].end), (3, 5));
    }

    #[test]
    fn token_tags_reject_unknown_ids() {
        let tags = TokenTags {
            offsets: vec![(0, 1)],
            tag_ids: vec![999],
        };
        assert!(tags.into_tagged(TagVocabulary::standard()).is_err());

        let short = TokenTags {
            offsets: vec![(0, 1), (1, 2)],
            tag_ids: vec![0],
        };
        assert!(short.into_tagged(TagVocabulary::standard()).is_err());
    }
}
