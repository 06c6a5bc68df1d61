// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Diagnostics with source positions, severities and text rendering.

use std::fmt;
use std::sync::Arc;

use crate::core::error::AsmError;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A position in the concatenated source: file path, 1-based line, 1-based column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePos {
    pub file: Option<String>,
    pub line: u32,
    pub column: Option<usize>,
}

impl SourcePos {
    pub fn new(file: Option<String>, line: u32) -> Self {
        Self {
            file,
            line,
            column: None,
        }
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.column) {
            (Some(file), Some(col)) => write!(f, "{file}:{}:{col}", self.line),
            (Some(file), None) => write!(f, "{file}:{}", self.line),
            (None, Some(col)) => write!(f, "{}:{col}", self.line),
            (None, None) => write!(f, "{}", self.line),
        }
    }
}

/// A diagnostic message with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pos: SourcePos,
    severity: Severity,
    error: AsmError,
    source: Option<String>,
    notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(pos: SourcePos, severity: Severity, error: AsmError) -> Self {
        Self {
            pos,
            severity,
            error,
            source: None,
            notes: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn pos(&self) -> &SourcePos {
        &self.pos
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn format(&self) -> String {
        format!("{}: {}: {}", self.pos, self.severity.as_str(), self.message())
    }

    /// Render the diagnostic with a source-context line and caret column.
    pub fn format_with_context(&self, use_color: bool) -> String {
        let sev = if use_color {
            match self.severity {
                Severity::Note => "\x1b[35mnote:\x1b[0m",
                Severity::Warning => "\x1b[33mwarning:\x1b[0m",
                Severity::Error => "\x1b[31merror:\x1b[0m",
            }
            .to_string()
        } else {
            format!("{}:", self.severity.as_str())
        };

        let mut out = format!("{}: {sev} {}", self.pos, self.message());
        if let Some(source) = &self.source {
            out.push('\n');
            out.push_str(&format!("{:>5} | {source}", self.pos.line));
            if let Some(caret) = caret_line(source, self.pos.column, use_color) {
                out.push('\n');
                out.push_str(&format!("{:>5} | {caret}", ""));
            }
        }
        for note in &self.notes {
            out.push('\n');
            out.push_str("note: ");
            out.push_str(note);
        }
        out
    }
}

/// Error from a failed assembly run, carrying everything reported so far.
#[derive(Debug)]
pub struct AsmRunError {
    error: AsmError,
    diagnostics: Arc<Vec<Diagnostic>>,
}

impl AsmRunError {
    pub fn new(error: AsmError, diagnostics: impl Into<Arc<Vec<Diagnostic>>>) -> Self {
        Self {
            error,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for AsmRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for AsmRunError {}

/// Caret marker line pointing at `column` (a 1-based byte offset into
/// `line`), padded by display characters so the caret sits under the
/// offending token even after non-ASCII text.
pub fn caret_line(line: &str, column: Option<usize>, use_color: bool) -> Option<String> {
    let col = column.filter(|&c| c > 0)?;
    let idx = (col - 1).min(line.len());
    let pad = line
        .get(..idx)
        .map(|prefix| prefix.chars().count())
        .unwrap_or(idx);
    let caret = if use_color { "\x1b[31m^\x1b[0m" } else { "^" };
    Some(format!("{}{caret}", " ".repeat(pad)))
}
