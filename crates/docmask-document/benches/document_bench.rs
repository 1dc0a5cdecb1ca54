// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the docmask-document crate: region masking on a
// page-sized image and text surrogate rendering of a dense page.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use docmask_core::types::BoundingBox;
use docmask_document::{RegionMaskRenderer, TextCanvas};
use image::{Rgb, RgbImage};

/// Mask 50 overlapping boxes on an 800x1000 white page.
fn bench_region_mask(c: &mut Criterion) {
    let page = RgbImage::from_pixel(800, 1000, Rgb([255, 255, 255]));
    let boxes: Vec<BoundingBox> = (0..50)
        .map(|i| {
            let offset = (i * 15) as f32;
            BoundingBox::new(offset, offset, offset + 120.0, offset + 40.0)
        })
        .collect();
    let renderer = RegionMaskRenderer::default();

    c.bench_function("region_mask (800x1000, 50 boxes)", |b| {
        b.iter(|| black_box(renderer.render(black_box(&page), black_box(&boxes))));
    });
}

/// Render 60 full-width lines onto the default canvas.
fn bench_text_surrogate(c: &mut Criterion) {
    let text = vec!["Invoice 0042  Qty 3  Unit 19.99  Total 59.97  Due 2026-11-01"; 60].join("\n");
    let canvas = TextCanvas::default();

    c.bench_function("text_surrogate (60 lines)", |b| {
        b.iter(|| black_box(canvas.render(black_box(&text))));
    });
}

criterion_group!(benches, bench_region_mask, bench_text_surrogate);
criterion_main!(benches);
