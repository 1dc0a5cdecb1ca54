// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-to-canvas surrogate. Produces a visual stand-in for a text document so
// an image classifier can look at its layout.
//
// This is deliberately lossy: each non-whitespace character becomes a solid
// glyph block on a fixed grid, lines wrap at a fixed character budget, and
// anything past the bottom of the canvas is dropped. Layout fidelity is not
// a goal.

use docmask_core::config::CanvasConfig;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, instrument};

const PAPER: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Renders text onto a fixed-size blank canvas.
#[derive(Debug, Clone, Copy)]
pub struct TextCanvas {
    config: CanvasConfig,
}

impl Default for TextCanvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl TextCanvas {
    pub fn new(config: CanvasConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn render(&self, text: &str) -> RgbImage {
        let cfg = &self.config;
        let mut canvas = RgbImage::from_pixel(cfg.width, cfg.height, PAPER);
        let last_line_y = cfg.height.saturating_sub(cfg.bottom_reserve);
        let glyph_w = cfg.glyph_width.saturating_sub(1).max(1);
        let glyph_h = cfg.glyph_height.max(1);

        let mut y = cfg.margin;
        let mut rendered = 0usize;
        'lines: for line in text.split('\n') {
            for chunk in wrap(line.trim_end_matches('\r'), cfg.chars_per_line) {
                if y > last_line_y {
                    break 'lines;
                }
                for (col, ch) in chunk.iter().enumerate() {
                    if ch.is_whitespace() {
                        continue;
                    }
                    let x = cfg.margin as i64 + col as i64 * cfg.glyph_width as i64;
                    if x >= cfg.width as i64 {
                        break;
                    }
                    let rect = Rect::at(x as i32, y as i32).of_size(glyph_w, glyph_h);
                    draw_filled_rect_mut(&mut canvas, rect, INK);
                }
                rendered += 1;
                y += cfg.line_height;
            }
        }

        debug!(rendered_lines = rendered, "Text surrogate rendered");
        canvas
    }
}

/// Split a line into chunks of at most `width` characters. An empty line
/// yields a single empty chunk so it still advances the cursor.
fn wrap(line: &str, width: usize) -> Vec<Vec<char>> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![Vec::new()];
    }
    chars.chunks(width.max(1)).map(<[char]>::to_vec).collect()
}
