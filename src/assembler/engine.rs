// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The assembly engine: drives the pipeline from normalized sources to
//! the flat output image.
//!
//! Single pass over the lines in source order, with data sections laid
//! out first so labels at low addresses exist before code references
//! them. Forward code references go through the relocation table and
//! are backpatched once every label is known. Errors are fatal: the
//! first one stops the run and is returned with its diagnostics.

use log::{debug, info};

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::image::Image;
use crate::core::report::{AsmRunError, Diagnostic, Severity, SourcePos};
use crate::core::scanner::Scanner;

use super::encoder::encode_line;
use super::labels::{DeclareError, LabelTable, RelocTable};
use super::line::{classify, ClassifyMode, Line, LineKind};
use super::loader::{load_files, SourceFile};
use super::macros::apply_macros;
use super::sections::layout_sections;
use super::LineError;

/// Name of the required entry-point label.
pub const ENTRY_LABEL: &str = "_start";

/// Synthetic label marking the first address past the image.
pub const IMG_END_LABEL: &str = "__la64_exec_img_end";

/// Engine options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Image capacity ceiling in bytes.
    pub capacity: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            capacity: crate::core::image::DEFAULT_CAPACITY,
        }
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct AsmOutput {
    /// The flat binary, entry header included.
    pub image: Vec<u8>,
    /// Resolved address of `_start`.
    pub entry: u64,
    /// Number of labels registered, for reporting.
    pub label_count: usize,
    /// Number of relocations resolved, for reporting.
    pub reloc_count: usize,
}

/// Assemble a list of source files into one image.
pub fn assemble_files<P: AsRef<std::path::Path>>(
    paths: &[P],
    options: &Options,
) -> Result<AsmOutput, AsmRunError> {
    let files = load_files(paths).map_err(|err| AsmRunError::new(err, Vec::new()))?;
    assemble_sources(&files, options)
}

/// Assemble already-normalized sources into one image.
pub fn assemble_sources(
    files: &[SourceFile],
    options: &Options,
) -> Result<AsmOutput, AsmRunError> {
    let mut run = Invocation::new(files);

    let mut lines = run.classify_all()?;
    debug!("classified {} lines across {} files", lines.len(), files.len());

    run.expand_macros(&mut lines)?;

    let mut image = Image::new(options.capacity);
    let mut labels = LabelTable::new();
    run.layout(&lines, &mut labels, &mut image)?;
    debug!("section layout done, image at {} bytes", image.len_bytes());

    let mut relocs = RelocTable::new();
    run.encode(&lines, &mut labels, &mut relocs, &mut image)?;
    debug!(
        "encode pass done, {} labels, {} relocations pending",
        labels.len(),
        relocs.len()
    );

    run.finish(lines, labels, relocs, image)
}

/// State of one assembly run.
struct Invocation<'a> {
    files: &'a [SourceFile],
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Invocation<'a> {
    fn new(files: &'a [SourceFile]) -> Self {
        Self {
            files,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize and classify every line, carrying the section mode
    /// across file boundaries.
    fn classify_all(&mut self) -> Result<Vec<Line>, AsmRunError> {
        let mut lines = Vec::new();
        let mut mode = ClassifyMode::Code;
        let files = self.files;
        for (file_idx, file) in files.iter().enumerate() {
            for (line_idx, text) in file.text.lines().enumerate() {
                let tokens = Scanner::tokens(text);
                let line_num = line_idx as u32 + 1;
                let (kind, next) = match classify(&tokens, mode) {
                    Ok(result) => result,
                    Err(error) => {
                        let column = tokens.first().map(|t| t.column);
                        let mut pos = SourcePos::new(Some(file.path.clone()), line_num);
                        if let Some(col) = column {
                            pos = pos.with_column(col);
                        }
                        return Err(self.fatal_at(pos, Some(text.to_string()), error, Vec::new()));
                    }
                };
                mode = next;
                lines.push(Line {
                    text: text.to_string(),
                    kind,
                    file_idx,
                    line_num,
                    tokens,
                });
            }
        }
        Ok(lines)
    }

    fn expand_macros(&mut self, lines: &mut [Line]) -> Result<(), AsmRunError> {
        apply_macros(lines).map_err(|(idx, err)| self.fatal_on_line(&lines[idx], err))
    }

    fn layout(
        &mut self,
        lines: &[Line],
        labels: &mut LabelTable,
        image: &mut Image,
    ) -> Result<(), AsmRunError> {
        layout_sections(lines, self.files, labels, image)
            .map_err(|(idx, err)| self.fatal_on_line(&lines[idx], err))
    }

    /// The main pass: declare code labels and encode instructions, in
    /// source order.
    fn encode(
        &mut self,
        lines: &[Line],
        labels: &mut LabelTable,
        relocs: &mut RelocTable,
        image: &mut Image,
    ) -> Result<(), AsmRunError> {
        for line in lines {
            match line.kind {
                LineKind::GlobalLabel | LineKind::LocalLabel => {
                    let is_local = line.kind == LineKind::LocalLabel;
                    let name = line.tokens[0].text.trim_end_matches(':');
                    match labels.declare(name, is_local, image.addr(), line.pos(self.files)) {
                        Ok(_) => {}
                        Err(DeclareError::Duplicate { name, prior }) => {
                            let error = AsmError::new(
                                AsmErrorKind::Symbol,
                                "duplicated label",
                                Some(&name),
                            );
                            let note = format!("label \"{name}\" already defined at {prior}");
                            return Err(self.fatal_at(
                                line.token_pos(self.files, 0),
                                Some(line.text.clone()),
                                error,
                                vec![note],
                            ));
                        }
                        Err(DeclareError::NoScope { name }) => {
                            let error = AsmError::new(
                                AsmErrorKind::Symbol,
                                "local label definition outside any scope",
                                Some(&name),
                            );
                            return Err(self.fatal_at(
                                line.token_pos(self.files, 0),
                                Some(line.text.clone()),
                                error,
                                Vec::new(),
                            ));
                        }
                    }
                }
                LineKind::Asm => {
                    encode_line(line, self.files, labels, relocs, image)
                        .map_err(|err| self.fatal_on_line(line, err))?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Resolve relocations, patch the entry header and produce the
    /// final binary.
    fn finish(
        mut self,
        lines: Vec<Line>,
        mut labels: LabelTable,
        relocs: RelocTable,
        mut image: Image,
    ) -> Result<AsmOutput, AsmRunError> {
        // One past the last emitted byte, for programs that want their
        // own extent.
        let end_pos = SourcePos::new(None, 0);
        if let Err(DeclareError::Duplicate { name, .. }) =
            labels.declare_entry(IMG_END_LABEL, image.len_bytes(), end_pos)
        {
            let error = AsmError::new(AsmErrorKind::Symbol, "duplicated label", Some(&name));
            return Err(self.fatal_at(SourcePos::new(None, 0), None, error, Vec::new()));
        }

        if let Err(reloc) = relocs.resolve_all(&labels, &mut image) {
            let error = AsmError::new(
                AsmErrorKind::Symbol,
                "unresolved symbol",
                Some(&reloc.name),
            );
            let source = lines
                .iter()
                .find(|l| {
                    l.line_num == reloc.pos.line
                        && self.files.get(l.file_idx).map(|f| f.path.as_str())
                            == reloc.pos.file.as_deref()
                })
                .map(|l| l.text.clone());
            return Err(self.fatal_at(reloc.pos, source, error, Vec::new()));
        }

        let Some(entry) = labels.resolve(ENTRY_LABEL) else {
            let error = AsmError::new(
                AsmErrorKind::Symbol,
                "entry point not defined",
                Some(ENTRY_LABEL),
            );
            return Err(self.fatal_at(SourcePos::new(None, 0), None, error, Vec::new()));
        };
        if image.patch_bits(0, entry, 64).is_err() {
            let error = AsmError::new(AsmErrorKind::Image, "image capacity exceeded", None);
            return Err(self.fatal_at(SourcePos::new(None, 0), None, error, Vec::new()));
        }

        let label_count = labels.len();
        let reloc_count = relocs.len();
        let image = image.into_bytes();
        info!(
            "assembled {} bytes, entry at {:#x}, {} labels, {} relocations",
            image.len(),
            entry,
            label_count,
            reloc_count
        );
        Ok(AsmOutput {
            image,
            entry,
            label_count,
            reloc_count,
        })
    }

    fn fatal_on_line(&mut self, line: &Line, err: LineError) -> AsmRunError {
        let pos = match err.token {
            Some(token) => line.token_pos(self.files, token),
            None => line.pos(self.files),
        };
        self.fatal_at(pos, Some(line.text.clone()), err.error, Vec::new())
    }

    fn fatal_at(
        &mut self,
        pos: SourcePos,
        source: Option<String>,
        error: AsmError,
        notes: Vec<String>,
    ) -> AsmRunError {
        let mut diag = Diagnostic::new(pos, Severity::Error, error.clone()).with_source(source);
        for note in notes {
            diag = diag.with_note(note);
        }
        self.diagnostics.push(diag);
        AsmRunError::new(error, std::mem::take(&mut self.diagnostics))
    }
}
