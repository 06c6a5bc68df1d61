// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Source acquisition and text normalization.
//!
//! Hands the pipeline per-file text with normalized line endings, tabs
//! replaced by spaces, comments stripped and a guaranteed trailing
//! newline, so every later stage can treat `\n` as the only separator.

use std::fs;
use std::path::Path;

use crate::core::error::{AsmError, AsmErrorKind};

/// One input file after normalization.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

impl SourceFile {
    /// Build a source file from raw text (used directly by tests).
    pub fn from_text(path: &str, raw: &str) -> Self {
        Self {
            path: path.to_string(),
            text: normalize(raw),
        }
    }
}

/// Read and normalize all input files, in argument order.
pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<SourceFile>, AsmError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            AsmError::new(
                AsmErrorKind::Io,
                &err.to_string(),
                Some(&path.display().to_string()),
            )
        })?;
        files.push(SourceFile {
            path: path.display().to_string(),
            text: normalize(&raw),
        });
    }
    Ok(files)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum NormState {
    Normal,
    Str,
    Char,
    LineComment,
    BlockComment,
}

/// Normalize raw source text.
///
/// CR/LF and bare CR collapse to `\n`, tabs become spaces, `;` comments
/// and `/* … */` block comments are removed (newlines inside block
/// comments are kept so line numbers stay stable), and the result always
/// ends with a newline. Comment stripping is quote-aware: `;` and `/*`
/// inside string or char literals are data, and an unterminated literal
/// ends at its line.
pub fn normalize(raw: &str) -> String {
    let text = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', " ");
    let chars: Vec<char> = text.chars().collect();

    let mut out = String::with_capacity(text.len());
    let mut state = NormState::Normal;
    let mut escaped = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match state {
            NormState::Normal => match c {
                '"' => {
                    state = NormState::Str;
                    out.push('"');
                }
                '\'' => {
                    state = NormState::Char;
                    out.push('\'');
                }
                ';' => state = NormState::LineComment,
                '/' if chars.get(i + 1) == Some(&'*') => {
                    state = NormState::BlockComment;
                    i += 1;
                }
                _ => out.push(c),
            },
            NormState::Str | NormState::Char => {
                let quote = if state == NormState::Str { '"' } else { '\'' };
                if c == '\n' {
                    // Unterminated literal; the scanner reports it later.
                    state = NormState::Normal;
                    escaped = false;
                    out.push('\n');
                } else {
                    out.push(c);
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == quote {
                        state = NormState::Normal;
                    }
                }
            }
            NormState::LineComment => {
                if c == '\n' {
                    state = NormState::Normal;
                    out.push('\n');
                }
            }
            NormState::BlockComment => {
                if c == '\n' {
                    out.push('\n');
                } else if c == '*' && chars.get(i + 1) == Some(&'/') {
                    state = NormState::Normal;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn line_endings_collapse_and_final_newline_is_guaranteed() {
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc\n");
        assert_eq!(normalize("a\n"), "a\n");
    }

    #[test]
    fn tabs_become_spaces() {
        assert_eq!(normalize("mov\tr0,\t1"), "mov r0, 1\n");
    }

    #[test]
    fn semicolon_comment_is_stripped_to_end_of_line() {
        assert_eq!(normalize("mov r0, 1 ; set it\nhlt"), "mov r0, 1 \nhlt\n");
    }

    #[test]
    fn block_comment_keeps_line_structure() {
        assert_eq!(normalize("a /* x\ny */ b\n"), "a \n b\n");
    }

    #[test]
    fn comment_markers_inside_quotes_are_data() {
        assert_eq!(normalize("db \";/*\" ; real\n"), "db \";/*\" \n");
        assert_eq!(normalize("db '\\';' ; c\n"), "db '\\';' \n");
    }

    #[test]
    fn non_ascii_text_survives_untouched() {
        assert_eq!(normalize("msg: db \"héllo\" ; c\n"), "msg: db \"héllo\" \n");
    }

    #[test]
    fn unterminated_literal_ends_at_its_line() {
        assert_eq!(normalize("db \"open\nhlt ; x\n"), "db \"open\nhlt \n");
    }
}
