// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Classified source lines and the line classifier.

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::report::SourcePos;
use crate::core::scanner::SubToken;

/// Marker introducing a macro definition line.
pub const MACRO_MARKER: &str = "%define%";

/// The six line classifications plus skip for blank lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Skip,
    Asm,
    GlobalLabel,
    LocalLabel,
    Section,
    SectionData,
    MacroDef,
}

/// Classifier state carried from line to line: outside or inside a data
/// section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyMode {
    Code,
    InSection,
}

/// A classified unit of source.
#[derive(Debug, Clone)]
pub struct Line {
    pub text: String,
    pub kind: LineKind,
    /// Index into the invocation's file list.
    pub file_idx: usize,
    /// 1-based line number within its file.
    pub line_num: u32,
    pub tokens: Vec<SubToken>,
}

impl Line {
    /// Position of the line itself (no column).
    pub fn pos(&self, files: &[super::SourceFile]) -> SourcePos {
        SourcePos::new(
            files.get(self.file_idx).map(|f| f.path.clone()),
            self.line_num,
        )
    }

    /// Position of one of the line's sub-tokens.
    pub fn token_pos(&self, files: &[super::SourceFile], token: usize) -> SourcePos {
        let pos = self.pos(files);
        match self.tokens.get(token) {
            Some(tok) => pos.with_column(tok.column),
            None => pos,
        }
    }
}

/// Assign a kind to one line's sub-tokens and advance the section mode.
///
/// Rules in priority order: blank lines are skipped; a single token
/// ending in `:` is a label (and leaves any data section); two tokens
/// starting with `section` open a data section; a `%define%` marker is a
/// macro definition (and leaves any data section); anything else is
/// section data while a section is open, assembly otherwise.
pub fn classify(
    tokens: &[SubToken],
    mode: ClassifyMode,
) -> Result<(LineKind, ClassifyMode), AsmError> {
    let Some(first) = tokens.first() else {
        return Ok((LineKind::Skip, mode));
    };

    if tokens.len() == 1 && first.text.ends_with(':') {
        let kind = match first.text.as_bytes().first() {
            Some(b'_') => LineKind::GlobalLabel,
            Some(b'.') => LineKind::LocalLabel,
            _ => {
                return Err(AsmError::new(
                    AsmErrorKind::Classifier,
                    "illegal label definition",
                    Some(&first.text),
                ))
            }
        };
        return Ok((kind, ClassifyMode::Code));
    }

    if tokens.len() == 2 && first.text == "section" {
        return Ok((LineKind::Section, ClassifyMode::InSection));
    }

    if first.text == MACRO_MARKER {
        return Ok((LineKind::MacroDef, ClassifyMode::Code));
    }

    match mode {
        ClassifyMode::InSection => Ok((LineKind::SectionData, mode)),
        ClassifyMode::Code => Ok((LineKind::Asm, mode)),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, ClassifyMode, LineKind};
    use crate::core::scanner::Scanner;

    fn kinds(lines: &[&str]) -> Vec<LineKind> {
        let mut mode = ClassifyMode::Code;
        lines
            .iter()
            .map(|line| {
                let tokens = Scanner::tokens(line);
                let (kind, next) = classify(&tokens, mode).expect("classification should succeed");
                mode = next;
                kind
            })
            .collect()
    }

    #[test]
    fn labels_sections_and_code() {
        assert_eq!(
            kinds(&["_start:", ".loop:", "mov r0, 1"]),
            vec![LineKind::GlobalLabel, LineKind::LocalLabel, LineKind::Asm]
        );
    }

    #[test]
    fn section_mode_persists_until_label() {
        assert_eq!(
            kinds(&["section .data", "x: db 1", "y: db 2", "_start:", "hlt"]),
            vec![
                LineKind::Section,
                LineKind::SectionData,
                LineKind::SectionData,
                LineKind::GlobalLabel,
                LineKind::Asm
            ]
        );
    }

    #[test]
    fn macro_definition_resets_section_mode() {
        assert_eq!(
            kinds(&["section .bss", "%define% N 4", "mov r0, N"]),
            vec![LineKind::Section, LineKind::MacroDef, LineKind::Asm]
        );
    }

    #[test]
    fn blank_lines_are_skipped_without_mode_change() {
        assert_eq!(
            kinds(&["section .data", "; comment only", "x: db 1"]),
            vec![LineKind::Section, LineKind::Skip, LineKind::SectionData]
        );
    }

    #[test]
    fn plain_label_name_is_illegal() {
        let tokens = Scanner::tokens("foo:");
        let err = classify(&tokens, ClassifyMode::Code).unwrap_err();
        assert!(err.message().contains("illegal label definition"));
    }
}
