// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Layout of `.data` and `.bss` section entries at the front of the
//! image, ahead of any code.

use crate::core::error::AsmErrorKind;
use crate::core::image::Image;
use crate::core::value::{parse_value, ParsedValue};

use super::labels::{DeclareError, LabelTable};
use super::line::{Line, LineKind};
use super::{LineError, SourceFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Data,
    Bss,
}

/// Walk all classified lines and emit every section entry, registering
/// its label. Runs before the encode pass, so data always lands at low
/// addresses and every data label exists before code references it.
///
/// On failure the index of the offending line is returned with the
/// error, so the engine can attach the source context.
pub(crate) fn layout_sections(
    lines: &[Line],
    files: &[SourceFile],
    labels: &mut LabelTable,
    image: &mut Image,
) -> Result<(), (usize, LineError)> {
    let mut current = None;
    for (idx, line) in lines.iter().enumerate() {
        match line.kind {
            LineKind::Section => {
                current = Some(section_kind(line).map_err(|err| (idx, err))?);
            }
            LineKind::SectionData => {
                // The classifier only emits SectionData after a Section
                // line, so `current` is always set here.
                if let Some(kind) = current {
                    layout_entry(kind, line, files, labels, image).map_err(|err| (idx, err))?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn section_kind(line: &Line) -> Result<SectionKind, LineError> {
    let name = &line.tokens[1].text;
    match name.as_str() {
        ".data" => Ok(SectionKind::Data),
        ".bss" => Ok(SectionKind::Bss),
        _ => Err(LineError::at_token(
            AsmErrorKind::Section,
            "unknown section",
            Some(name),
            1,
        )),
    }
}

fn layout_entry(
    kind: SectionKind,
    line: &Line,
    files: &[SourceFile],
    labels: &mut LabelTable,
    image: &mut Image,
) -> Result<(), LineError> {
    match kind {
        SectionKind::Data => layout_data_entry(line, files, labels, image),
        SectionKind::Bss => layout_bss_entry(line, files, labels, image),
    }
}

/// A `.data` entry: `label[:] width value [value ...]` where width is
/// one of `db`, `dw`, `dd`, `dq`.
fn layout_data_entry(
    line: &Line,
    files: &[SourceFile],
    labels: &mut LabelTable,
    image: &mut Image,
) -> Result<(), LineError> {
    if line.tokens.len() < 3 {
        return Err(LineError::new(
            AsmErrorKind::Section,
            "data entry needs a label, a width and at least one value",
            None,
        ));
    }

    let name = line.tokens[0].text.trim_end_matches(':');
    declare(labels, name, image.addr(), line, files)?;

    let width_bits = match line.tokens[1].text.as_str() {
        "db" => 8,
        "dw" => 16,
        "dd" => 32,
        "dq" => 64,
        other => {
            return Err(LineError::at_token(
                AsmErrorKind::Section,
                "unknown data width",
                Some(other),
                1,
            ))
        }
    };

    for (idx, token) in line.tokens.iter().enumerate().skip(2) {
        match parse_value(&token.text).map_err(|error| LineError {
            error,
            token: Some(idx),
        })? {
            // Strings lay out as their raw bytes whatever the width.
            ParsedValue::Bytes(bytes) => image.write_bytes(&bytes)?,
            // Numbers are truncated to the entry width, so negative
            // values keep their two's-complement low bytes.
            ParsedValue::Number(value) => image.write_bits(value, width_bits)?,
            ParsedValue::Symbol => {
                return Err(LineError::at_token(
                    AsmErrorKind::Section,
                    "data values must be literals",
                    Some(&token.text),
                    idx,
                ))
            }
        }
    }
    Ok(())
}

/// A `.bss` entry: `label[:] size`. The space is reserved, never
/// materialized.
fn layout_bss_entry(
    line: &Line,
    files: &[SourceFile],
    labels: &mut LabelTable,
    image: &mut Image,
) -> Result<(), LineError> {
    if line.tokens.len() != 2 {
        return Err(LineError::new(
            AsmErrorKind::Section,
            "bss entry needs exactly a label and a size",
            None,
        ));
    }

    let name = line.tokens[0].text.trim_end_matches(':');
    declare(labels, name, image.addr(), line, files)?;

    match parse_value(&line.tokens[1].text).map_err(|error| LineError {
        error,
        token: Some(1),
    })? {
        ParsedValue::Number(size) => image.reserve_bytes(size)?,
        _ => {
            return Err(LineError::at_token(
                AsmErrorKind::Section,
                "bss size must be a numeric literal",
                Some(&line.tokens[1].text),
                1,
            ))
        }
    }
    Ok(())
}

fn declare(
    labels: &mut LabelTable,
    name: &str,
    addr: u64,
    line: &Line,
    files: &[SourceFile],
) -> Result<(), LineError> {
    match labels.declare_entry(name, addr, line.token_pos(files, 0)) {
        Ok(_) => Ok(()),
        Err(DeclareError::Duplicate { name, .. }) => Err(LineError::at_token(
            AsmErrorKind::Symbol,
            "duplicate label definition",
            Some(&name),
            0,
        )),
        Err(DeclareError::NoScope { name }) => Err(LineError::at_token(
            AsmErrorKind::Symbol,
            "local label definition outside any scope",
            Some(&name),
            0,
        )),
    }
}
