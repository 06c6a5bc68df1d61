// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! End-to-end pipeline tests: source text in, flat binary out.

use crate::assembler::engine::{assemble_sources, AsmOutput, Options, IMG_END_LABEL};
use crate::assembler::loader::SourceFile;
use crate::core::bitwriter::read_bits;
use crate::core::report::AsmRunError;

fn assemble(sources: &[(&str, &str)]) -> Result<AsmOutput, AsmRunError> {
    let files: Vec<SourceFile> = sources
        .iter()
        .map(|(path, text)| SourceFile::from_text(path, text))
        .collect();
    assemble_sources(&files, &Options::default())
}

fn entry_header(image: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&image[..8]);
    u64::from_le_bytes(bytes)
}

#[test]
fn full_program_with_data_bss_and_forward_reference() {
    let output = assemble(&[(
        "boot.s",
        r#"
section .data
msg: db "hi", 0
section .bss
buf: 16

_start:
    jmp .end
.end:
    hlt
"#,
    )])
    .expect("program should assemble");

    // Layout: header 8, msg 3 bytes at 8, buf 16 bytes at 11, code at 27.
    assert_eq!(&output.image[8..11], b"hi\0");
    assert!(output.image[11..27].iter().all(|&b| b == 0));
    assert_eq!(output.entry, 27);
    assert_eq!(entry_header(&output.image), 27);

    // jmp: opcode, imm64 tag, backpatched target, end tag, then padding
    // to the byte boundary; hlt follows at 37.
    assert_eq!(output.image[27], 0x21);
    let target = read_bits(&output.image, 27 * 8 + 8 + 3, 64);
    assert_eq!(target, 37);
    assert_eq!(output.image[37], 0x00);
    assert_eq!(output.image.len(), 38);
}

#[test]
fn image_end_label_is_resolvable() {
    let output = assemble(&[(
        "boot.s",
        &format!("_start:\n    mov r0, {IMG_END_LABEL}\n    hlt\n"),
    )])
    .expect("program should assemble");

    // mov at 8: opcode, reg tag + index, then the imm64 tag and the
    // backpatched address.
    let end = read_bits(&output.image, 8 * 8 + 8 + 3 + 5 + 3, 64);
    assert_eq!(end, output.image.len() as u64);
}

#[test]
fn sources_concatenate_and_scope_spans_files() {
    let output = assemble(&[
        ("a.s", "_start:\n    jmp .done\n"),
        ("b.s", ".done:\n    hlt\n"),
    ])
    .expect("program should assemble");

    assert_eq!(output.entry, 8);
    let target = read_bits(&output.image, 8 * 8 + 8 + 3, 64);
    // jmp occupies 10 bytes, so .done lands at 18.
    assert_eq!(target, 18);
    assert_eq!(output.image[18], 0x00);
}

#[test]
fn macros_substitute_before_encoding() {
    let output = assemble(&[(
        "boot.s",
        "%define% ANSWER 42\n_start:\n    mov r0, ANSWER\n    hlt\n",
    )])
    .expect("program should assemble");

    // mov r0, 42: opcode, reg tag + index, imm8 tag, value.
    let value = read_bits(&output.image, 8 * 8 + 8 + 3 + 5 + 3, 8);
    assert_eq!(value, 42);
}

#[test]
fn macro_use_may_precede_its_definition() {
    let output = assemble(&[(
        "boot.s",
        "_start:\n    mov r0, ANSWER\n    hlt\n%define% ANSWER 42\n",
    )])
    .expect("program should assemble");

    let value = read_bits(&output.image, 8 * 8 + 8 + 3 + 5 + 3, 8);
    assert_eq!(value, 42);
}

#[test]
fn unresolved_symbol_fails_with_its_name() {
    let err = assemble(&[("boot.s", "_start:\n    jmp _missing\n")]).unwrap_err();
    assert!(err.to_string().contains("unresolved symbol: _missing"));
    assert_eq!(err.diagnostics().len(), 1);
    let diag = err.diagnostics()[0].clone();
    assert_eq!(diag.pos().line, 2);
    assert_eq!(diag.pos().file.as_deref(), Some("boot.s"));
}

#[test]
fn duplicate_label_reports_prior_definition_site() {
    let err = assemble(&[("boot.s", "_start:\n    hlt\n_start:\n    hlt\n")]).unwrap_err();
    assert!(err.to_string().contains("duplicated label: _start"));
    let diag = &err.diagnostics()[0];
    assert_eq!(diag.pos().line, 3);
    assert!(diag.notes()[0].contains("already defined at boot.s:1"));
}

#[test]
fn local_label_before_any_global_is_rejected() {
    let err = assemble(&[("boot.s", ".loop:\n    hlt\n")]).unwrap_err();
    assert!(err
        .to_string()
        .contains("local label definition outside any scope"));
}

#[test]
fn local_reference_before_any_global_is_rejected() {
    let err = assemble(&[("boot.s", "jmp .loop\n")]).unwrap_err();
    assert!(err
        .to_string()
        .contains("local label reference outside any scope"));
}

#[test]
fn missing_entry_point_is_fatal() {
    let err = assemble(&[("boot.s", "_main:\n    hlt\n")]).unwrap_err();
    assert!(err.to_string().contains("entry point not defined: _start"));
}

#[test]
fn operand_cap_is_fatal_end_to_end() {
    let source = format!("_start:\n    mov{}\n", " 1".repeat(32));
    let err = assemble(&[("boot.s", &source)]).unwrap_err();
    assert!(err.to_string().contains("too many parameters"));
    assert_eq!(err.diagnostics()[0].pos().line, 2);
}

#[test]
fn capacity_ceiling_fails_cleanly() {
    let files = vec![SourceFile::from_text(
        "boot.s",
        "section .bss\nbuf: 1024\n_start:\n    hlt\n",
    )];
    let err = assemble_sources(&files, &Options { capacity: 64 }).unwrap_err();
    assert!(err.to_string().contains("image capacity exceeded"));
}

#[test]
fn huge_bss_size_fails_cleanly() {
    let err = assemble(&[(
        "boot.s",
        "section .bss\nbuf: 0x4000000000000000\n_start:\n    hlt\n",
    )])
    .unwrap_err();
    assert!(err.to_string().contains("image capacity exceeded"));
    assert_eq!(err.diagnostics()[0].pos().line, 2);
}

#[test]
fn comments_and_blank_lines_do_not_shift_positions() {
    let err = assemble(&[(
        "boot.s",
        "; banner\n/* block\n   comment */\n_start:\n    frob r0\n",
    )])
    .unwrap_err();
    assert!(err.to_string().contains("illegal opcode: frob"));
    let diag = &err.diagnostics()[0];
    assert_eq!(diag.pos().line, 5);
    assert_eq!(diag.pos().column, Some(5));
}

#[test]
fn illegal_label_spelling_is_a_classifier_error() {
    let err = assemble(&[("boot.s", "start:\n    hlt\n")]).unwrap_err();
    assert!(err.to_string().contains("illegal label definition: start:"));
}
