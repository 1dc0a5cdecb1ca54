// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mask substitution — replaces decoded entity spans with their placeholders.
//
// Two strategies:
//   - FirstOccurrence: for each span, replace the first textual occurrence of
//     the span's string in the current working text. Types are visited in the
//     order they were detected, spans of one type from the highest start
//     offset down. A span whose string repeats elsewhere may mask the
//     earlier occurrence rather than its own position.
//   - ByOffset: replace each span's own [start, end) byte range, right to
//     left, so earlier offsets stay valid.

use docmask_core::config::SubstitutionStrategy;
use docmask_core::labels::MaskTable;
use docmask_core::types::EntitySpan;
use tracing::{debug, info, warn};

use super::decode::SpanGroups;
use super::fingerprint;

/// Applies a [`MaskTable`] to text using a chosen strategy.
#[derive(Debug, Clone, Copy)]
pub struct MaskSubstitution<'a> {
    table: &'a MaskTable,
    strategy: SubstitutionStrategy,
}

impl<'a> MaskSubstitution<'a> {
    pub fn new(table: &'a MaskTable, strategy: SubstitutionStrategy) -> Self {
        Self { table, strategy }
    }

    /// Produce the masked text. Text outside replaced spans is left
    /// byte-for-byte unchanged; no spans means the input comes back as-is.
    pub fn apply(&self, text: &str, groups: &SpanGroups) -> String {
        if groups.is_empty() {
            return text.to_string();
        }
        let (masked, replaced) = match self.strategy {
            SubstitutionStrategy::FirstOccurrence => self.first_occurrence(text, groups),
            SubstitutionStrategy::ByOffset => self.by_offset(text, groups),
        };
        info!(
            strategy = ?self.strategy,
            spans = groups.span_count(),
            replaced,
            "Text masked"
        );
        masked
    }

    fn first_occurrence(&self, text: &str, groups: &SpanGroups) -> (String, usize) {
        let mut working = text.to_string();
        let mut replaced = 0;

        for group in groups.groups() {
            let placeholder = self.table.placeholder(group.entity_type);
            let mut spans: Vec<&EntitySpan> = group.spans.iter().collect();
            spans.sort_by(|a, b| b.start.cmp(&a.start));

            for span in spans {
                if span.text.is_empty() {
                    continue;
                }
                match working.find(&span.text) {
                    Some(_) => {
                        working = working.replacen(&span.text, placeholder, 1);
                        replaced += 1;
                        debug!(
                            entity = %group.entity_type,
                            value = %fingerprint(&span.text),
                            "Span replaced"
                        );
                    }
                    None => debug!(
                        entity = %group.entity_type,
                        value = %fingerprint(&span.text),
                        "Span text no longer present"
                    ),
                }
            }
        }
        (working, replaced)
    }

    fn by_offset(&self, text: &str, groups: &SpanGroups) -> (String, usize) {
        let mut spans: Vec<&EntitySpan> = groups.spans().collect();
        spans.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

        let mut working = text.to_string();
        let mut replaced = 0;
        // Lowest start replaced so far; later spans must end at or before it.
        let mut boundary = text.len();

        for span in spans {
            if span.start >= span.end {
                continue;
            }
            if span.end > boundary {
                warn!(
                    entity = %span.entity_type,
                    start = span.start,
                    end = span.end,
                    "Overlapping span skipped"
                );
                continue;
            }
            if !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
                warn!(
                    entity = %span.entity_type,
                    start = span.start,
                    end = span.end,
                    "Span range not on a character boundary, skipped"
                );
                continue;
            }
            working.replace_range(span.start..span.end, self.table.placeholder(span.entity_type));
            boundary = span.start;
            replaced += 1;
            debug!(
                entity = %span.entity_type,
                value = %fingerprint(&span.text),
                "Span replaced"
            );
        }
        (working, replaced)
    }
}
