// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "docmask",
    version,
    about = "Extract, mask, and redact documents locally",
    arg_required_else_help = true
)]
pub struct Cli {
    /// JSON pipeline configuration; DOCMASK_* environment variables still apply on top.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the text of a document, or render it to an image with --visual.
    Extract {
        /// Input file (txt, docx, pdf, png, jpg, jpeg, bmp).
        file: PathBuf,

        /// Write the visual form as PNG instead of printing text.
        #[arg(long, value_name = "OUT.png")]
        visual: Option<PathBuf>,
    },

    /// Black out rectangular regions of an image.
    MaskRegions {
        image: PathBuf,

        /// JSON array of [xmin, ymin, xmax, ymax] boxes in pixels.
        #[arg(long, value_name = "FILE")]
        boxes: PathBuf,

        #[arg(long, short = 'o', value_name = "OUT.png")]
        output: PathBuf,
    },

    /// Replace tagged entities in a text file with placeholders.
    RedactText {
        text_file: PathBuf,

        /// JSON array of {"start", "end", "tag"} token records with byte offsets.
        #[arg(long, value_name = "FILE")]
        tags: PathBuf,

        /// Replace each span's own byte range instead of the first matching text.
        #[arg(long)]
        by_offset: bool,

        /// Write the result here instead of stdout.
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },
}
