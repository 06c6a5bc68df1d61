// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for la64asm.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;

use la64asm::assembler::cli::{validate_cli, Cli, DiagFormat};
use la64asm::assembler::{assemble_files, Options};
use la64asm::core::report::Diagnostic;

fn format_diagnostic_line(diag: &Diagnostic, format: DiagFormat, use_color: bool) -> String {
    match format {
        DiagFormat::Json => json!({
            "severity": diag.severity().as_str(),
            "message": diag.message(),
            "file": diag.pos().file,
            "line": diag.pos().line,
            "column": diag.pos().column,
            "source": diag.source(),
            "notes": diag.notes(),
        })
        .to_string(),
        DiagFormat::Text => diag.format_with_context(use_color),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = validate_cli(&cli) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let use_color = !cli.no_color && std::env::var("NO_COLOR").is_err();
    let options = Options {
        capacity: cli.max_image_size,
    };

    match assemble_files(&cli.infiles, &options) {
        Ok(output) => {
            if let Err(err) = fs::write(&cli.outfile, &output.image) {
                eprintln!("failed to write {}: {err}", cli.outfile);
                return ExitCode::FAILURE;
            }
            if !cli.quiet {
                println!(
                    "{}: {} bytes, entry at {:#x}, {} labels, {} relocations",
                    cli.outfile,
                    output.image.len(),
                    output.entry,
                    output.label_count,
                    output.reloc_count
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            for diag in err.diagnostics() {
                eprintln!("{}", format_diagnostic_line(diag, cli.format, use_color));
            }
            if cli.format != DiagFormat::Json {
                eprintln!("{err}");
            }
            ExitCode::FAILURE
        }
    }
}
