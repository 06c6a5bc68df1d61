// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The LA64 assembly pipeline: loading, classification, label and
//! relocation management, section layout, instruction encoding and the
//! driving engine.

pub mod cli;
pub mod encoder;
pub mod engine;
pub mod labels;
pub mod line;
pub mod loader;
pub mod macros;
pub mod sections;

#[cfg(test)]
mod tests;

pub use engine::{assemble_files, assemble_sources, AsmOutput, Options};
pub use line::{Line, LineKind};
pub use loader::SourceFile;

use crate::core::error::{AsmError, AsmErrorKind};

/// A component error tied to the sub-token that caused it, so the engine
/// can point the diagnostic at the right column.
#[derive(Debug)]
pub(crate) struct LineError {
    pub error: AsmError,
    pub token: Option<usize>,
}

impl LineError {
    pub(crate) fn new(kind: AsmErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            error: AsmError::new(kind, msg, param),
            token: None,
        }
    }

    pub(crate) fn at_token(
        kind: AsmErrorKind,
        msg: &str,
        param: Option<&str>,
        token: usize,
    ) -> Self {
        Self {
            error: AsmError::new(kind, msg, param),
            token: Some(token),
        }
    }
}

impl From<AsmError> for LineError {
    fn from(error: AsmError) -> Self {
        Self { error, token: None }
    }
}
