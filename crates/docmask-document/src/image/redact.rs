// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region masking — paints every detected box solid so the region's content is
// unrecoverable from the output image.

use docmask_core::types::BoundingBox;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, instrument, warn};

/// Overwrites every pixel inside each box with a uniform fill colour.
///
/// Boxes are trusted as given: score filtering happens before the renderer is
/// called. Box corners are inclusive, and boxes that extend past the image
/// are clipped to the canvas.
#[derive(Debug, Clone, Copy)]
pub struct RegionMaskRenderer {
    fill: Rgb<u8>,
}

impl Default for RegionMaskRenderer {
    /// Opaque black.
    fn default() -> Self {
        Self::new([0, 0, 0])
    }
}

impl RegionMaskRenderer {
    pub fn new(fill: [u8; 3]) -> Self {
        Self { fill: Rgb(fill) }
    }

    /// Return a masked copy of `image`; the input is left untouched.
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), boxes = boxes.len()))]
    pub fn render(&self, image: &RgbImage, boxes: &[BoundingBox]) -> RgbImage {
        let mut masked = image.clone();
        let mut drawn = 0usize;
        for bbox in boxes {
            match pixel_rect(bbox, image.width(), image.height()) {
                Some(rect) => {
                    draw_filled_rect_mut(&mut masked, rect, self.fill);
                    drawn += 1;
                }
                None => warn!(?bbox, "Skipping degenerate region box"),
            }
        }
        debug!(drawn, "Regions masked");
        masked
    }
}

/// Convert a float box to an inclusive pixel rectangle. Coordinates are
/// pinned one pixel beyond the canvas so off-canvas boxes still clip to
/// nothing instead of overflowing.
fn pixel_rect(bbox: &BoundingBox, width: u32, height: u32) -> Option<Rect> {
    let coords = [bbox.xmin, bbox.ymin, bbox.xmax, bbox.ymax];
    if coords.iter().any(|c| !c.is_finite()) {
        return None;
    }
    let pin = |v: f32, limit: u32| (v.round() as i64).clamp(-1, limit as i64);
    let (x0, x1) = (pin(bbox.xmin, width), pin(bbox.xmax, width));
    let (y0, y1) = (pin(bbox.ymin, height), pin(bbox.ymax, height));
    if x1 < x0 || y1 < y0 {
        return None;
    }
    let rect_width = (x1 - x0 + 1) as u32;
    let rect_height = (y1 - y0 + 1) as u32;
    Some(Rect::at(x0 as i32, y0 as i32).of_size(rect_width, rect_height))
}
