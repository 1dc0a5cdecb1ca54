// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docmask — local document extraction and masking.
//
// Entry point. Initialises logging, loads configuration, and runs one
// subcommand. Logs go to stderr; results go to stdout or the named file.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use docmask_core::error::Result;
use docmask_core::human_errors::humanize_error;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            tracing::error!(error = %err, status = human.status, "docmask failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { file, visual } => {
            if let Some(text) = commands::extract(&config, &file, visual.as_deref())? {
                println!("{text}");
            }
        }
        Commands::MaskRegions {
            image,
            boxes,
            output,
        } => {
            commands::mask_regions(&config, &image, &boxes, &output)?;
        }
        Commands::RedactText {
            text_file,
            tags,
            by_offset,
            output,
        } => {
            let masked = commands::redact_text(&config, &text_file, &tags, by_offset)?;
            match output {
                Some(path) => std::fs::write(path, masked)?,
                None => println!("{masked}"),
            }
        }
    }
    Ok(())
}
