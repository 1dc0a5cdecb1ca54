// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// BIO span decoder — folds a per-token tag sequence into entity spans in a
// single left-to-right pass.
//
// Rules:
//   - zero-width tokens (padding, separators) are skipped;
//   - `B-T` closes any open span and opens a new `T` span, even when the open
//     span is also `T`;
//   - `I-T` extends the open span only when it is a `T` span, appending the
//     token's slice with no separator;
//   - `O`, and any `I-T` without an open `T` span, closes the open span. A
//     dangling `I-` never starts a span.

use docmask_core::error::{DocmaskError, Result};
use docmask_core::labels::{EntityType, Tag};
use docmask_core::types::EntitySpan;
use tracing::debug;

/// One token of the classified input: its byte range in the source text and
/// its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedToken {
    pub start: usize,
    pub end: usize,
    pub tag: Tag,
}

impl TaggedToken {
    pub fn new(start: usize, end: usize, tag: Tag) -> Self {
        Self { start, end, tag }
    }

    fn is_structural(&self) -> bool {
        self.start == self.end
    }
}

/// All spans of one entity type, in detection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanGroup {
    pub entity_type: EntityType,
    pub spans: Vec<EntitySpan>,
}

/// Decoded spans grouped by entity type. Groups keep the order in which
/// their type was first detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanGroups {
    groups: Vec<SpanGroup>,
}

impl SpanGroups {
    pub(crate) fn push(&mut self, span: EntitySpan) {
        match self
            .groups
            .iter_mut()
            .find(|g| g.entity_type == span.entity_type)
        {
            Some(group) => group.spans.push(span),
            None => self.groups.push(SpanGroup {
                entity_type: span.entity_type,
                spans: vec![span],
            }),
        }
    }

    pub fn groups(&self) -> &[SpanGroup] {
        &self.groups
    }

    /// Spans of one type, or an empty slice.
    pub fn get(&self, entity_type: EntityType) -> &[EntitySpan] {
        self.groups
            .iter()
            .find(|g| g.entity_type == entity_type)
            .map(|g| g.spans.as_slice())
            .unwrap_or(&[])
    }

    /// Every span, group by group.
    pub fn spans(&self) -> impl Iterator<Item = &EntitySpan> {
        self.groups.iter().flat_map(|g| g.spans.iter())
    }

    pub fn span_count(&self) -> usize {
        self.groups.iter().map(|g| g.spans.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Decode `tokens` (tagged over `text`) into spans.
///
/// Fails with [`DocmaskError::TokenAlignment`] when a non-structural token's
/// range is out of bounds or does not fall on character boundaries.
pub fn decode_spans(text: &str, tokens: &[TaggedToken]) -> Result<SpanGroups> {
    let mut groups = SpanGroups::default();
    let mut open: Option<EntitySpan> = None;

    for token in tokens {
        if token.is_structural() {
            continue;
        }
        let slice = text.get(token.start..token.end).ok_or_else(|| {
            DocmaskError::TokenAlignment(format!(
                "token range {}..{} is not a valid slice of a {}-byte text",
                token.start,
                token.end,
                text.len()
            ))
        })?;

        match token.tag {
            Tag::Begin(entity_type) => {
                if let Some(span) = open.take() {
                    groups.push(span);
                }
                open = Some(EntitySpan {
                    entity_type,
                    text: slice.to_string(),
                    start: token.start,
                    end: token.end,
                });
            }
            Tag::Inside(entity_type)
                if open.as_ref().is_some_and(|s| s.entity_type == entity_type) =>
            {
                if let Some(span) = open.as_mut() {
                    span.text.push_str(slice);
                    span.end = token.end;
                }
            }
            Tag::Inside(_) | Tag::Outside => {
                if let Some(span) = open.take() {
                    groups.push(span);
                }
            }
        }
    }
    if let Some(span) = open.take() {
        groups.push(span);
    }

    debug!(
        tokens = tokens.len(),
        spans = groups.span_count(),
        types = groups.groups().len(),
        "Spans decoded"
    );
    Ok(groups)
}
