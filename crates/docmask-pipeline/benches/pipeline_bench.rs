// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the docmask-pipeline crate: BIO decoding and both
// substitution strategies over a 512-token sequence.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use docmask_core::config::SubstitutionStrategy;
use docmask_core::labels::{EntityType, MaskTable, Tag};
use docmask_pipeline::{MaskSubstitution, TaggedToken, decode_spans};

/// A 512-word text where every eighth word is an email address.
fn fixture() -> (String, Vec<TaggedToken>) {
    let mut text = String::new();
    let mut tokens = Vec::new();
    for i in 0..512 {
        if !text.is_empty() {
            text.push(' ');
        }
        let start = text.len();
        let (word, tag) = if i % 8 == 0 {
            (format!("user{i}@example.org"), Tag::Begin(EntityType::Email))
        } else {
            (format!("word{i}"), Tag::Outside)
        };
        text.push_str(&word);
        tokens.push(TaggedToken::new(start, text.len(), tag));
    }
    (text, tokens)
}

fn bench_decode(c: &mut Criterion) {
    let (text, tokens) = fixture();
    c.bench_function("decode_spans (512 tokens)", |b| {
        b.iter(|| black_box(decode_spans(black_box(&text), black_box(&tokens))));
    });
}

fn bench_substitute(c: &mut Criterion) {
    let (text, tokens) = fixture();
    let Ok(groups) = decode_spans(&text, &tokens) else {
        return;
    };
    let table = MaskTable::standard();

    for strategy in [SubstitutionStrategy::FirstOccurrence, SubstitutionStrategy::ByOffset] {
        let engine = MaskSubstitution::new(table, strategy);
        c.bench_function(&format!("substitute {strategy:?} (64 spans)"), |b| {
            b.iter(|| black_box(engine.apply(black_box(&text), black_box(&groups))));
        });
    }
}

criterion_group!(benches, bench_decode, bench_substitute);
criterion_main!(benches);
