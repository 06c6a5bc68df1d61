// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command line interface for the la64asm binary.

use clap::{Parser, ValueEnum};

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::image::DEFAULT_CAPACITY;

/// Diagnostic output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiagFormat {
    /// Human-readable text with source context.
    Text,
    /// One JSON object per diagnostic, for tooling.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "la64asm",
    version,
    about = "Assembler for the LA64 virtual machine",
    long_about = "Assembles LA64 assembly sources into a flat binary image.\n\
                  Multiple input files are treated as one concatenated program,\n\
                  in argument order. The image starts with the 64-bit address\n\
                  of the _start label, followed by data sections, then code."
)]
pub struct Cli {
    /// Input assembly files, assembled in order as one program.
    #[arg(required = true, value_name = "FILE")]
    pub infiles: Vec<String>,

    /// Output file for the binary image.
    #[arg(short, long, default_value = "a.out", value_name = "FILE")]
    pub outfile: String,

    /// Diagnostic output format.
    #[arg(
        long,
        value_enum,
        default_value_t = DiagFormat::Text,
        long_help = "Diagnostic output format.\n\
                     'text' renders each diagnostic with its source line and a\n\
                     highlighted column; 'json' emits one JSON object per\n\
                     diagnostic on stdout for consumption by editors and CI."
    )]
    pub format: DiagFormat,

    /// Suppress the success summary.
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum image size in bytes.
    #[arg(
        long,
        default_value_t = DEFAULT_CAPACITY,
        value_name = "BYTES",
        long_help = "Maximum image size in bytes. Assembly fails cleanly when\n\
                     emitted data and code would exceed this ceiling."
    )]
    pub max_image_size: u64,

    /// Disable ANSI colors in text diagnostics.
    #[arg(long)]
    pub no_color: bool,
}

/// Validate argument combinations clap cannot express.
pub fn validate_cli(cli: &Cli) -> Result<(), AsmError> {
    if cli.max_image_size < 9 {
        return Err(AsmError::new(
            AsmErrorKind::Cli,
            "max image size must leave room for the entry header",
            Some(&cli.max_image_size.to_string()),
        ));
    }
    for infile in &cli.infiles {
        if infile == &cli.outfile {
            return Err(AsmError::new(
                AsmErrorKind::Cli,
                "output file would overwrite an input file",
                Some(infile),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_cli, Cli, DiagFormat};
    use clap::Parser;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["la64asm", "boot.s"]);
        assert_eq!(cli.infiles, vec!["boot.s"]);
        assert_eq!(cli.outfile, "a.out");
        assert_eq!(cli.format, DiagFormat::Text);
        assert!(!cli.quiet);
        assert!(!cli.no_color);
        assert!(validate_cli(&cli).is_ok());
    }

    #[test]
    fn multiple_inputs_keep_order() {
        let cli = Cli::parse_from(["la64asm", "a.s", "b.s", "-o", "rom.bin"]);
        assert_eq!(cli.infiles, vec!["a.s", "b.s"]);
        assert_eq!(cli.outfile, "rom.bin");
    }

    #[test]
    fn no_input_is_a_parse_error() {
        assert!(Cli::try_parse_from(["la64asm"]).is_err());
    }

    #[test]
    fn output_clobbering_input_is_rejected() {
        let cli = Cli::parse_from(["la64asm", "boot.s", "-o", "boot.s"]);
        assert!(validate_cli(&cli).is_err());
    }

    #[test]
    fn tiny_image_ceiling_is_rejected() {
        let cli = Cli::parse_from(["la64asm", "boot.s", "--max-image-size", "8"]);
        assert!(validate_cli(&cli).is_err());
    }
}
