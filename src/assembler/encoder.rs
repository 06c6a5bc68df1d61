// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! LA64 instruction encoding: opcode and register tables plus the
//! bit-packed operand emitter.

use crate::core::error::AsmErrorKind;
use crate::core::image::Image;
use crate::core::value::{parse_value, ParsedValue};

use super::labels::{LabelTable, RelocTable};
use super::line::Line;
use super::{LineError, SourceFile};

/// Maximum sub-tokens per assembly line: opcode plus 31 operands.
pub const MAX_LINE_TOKENS: usize = 32;

/// 3-bit operand coding tags.
pub mod tag {
    pub const INSTR_END: u64 = 0b000;
    pub const IMM8: u64 = 0b001;
    pub const IMM16: u64 = 0b010;
    pub const IMM32: u64 = 0b011;
    pub const IMM64: u64 = 0b100;
    pub const REG: u64 = 0b101;
}

/// Width of an operand coding tag in bits.
pub const TAG_BITS: u32 = 3;
/// Width of a register index in bits.
pub const REG_BITS: u32 = 5;

/// The fixed opcode table, mnemonic to opcode byte.
pub const OPCODE_TABLE: &[(&str, u8)] = &[
    // core operations
    ("hlt", 0x00),
    ("nop", 0x01),
    // data operations
    ("mov", 0x02),
    ("swp", 0x03),
    ("swpz", 0x04),
    ("push", 0x05),
    ("pop", 0x06),
    ("ldb", 0x07),
    ("ldw", 0x08),
    ("ldd", 0x09),
    ("ldq", 0x0A),
    ("stb", 0x0B),
    ("stw", 0x0C),
    ("std", 0x0D),
    ("stq", 0x0E),
    // io operations
    ("in", 0x0F),
    ("out", 0x10),
    // alu operations
    ("add", 0x11),
    ("sub", 0x12),
    ("mul", 0x13),
    ("div", 0x14),
    ("idiv", 0x15),
    ("mod", 0x16),
    ("inc", 0x17),
    ("dec", 0x18),
    ("not", 0x19),
    ("and", 0x1A),
    ("or", 0x1B),
    ("xor", 0x1C),
    ("shr", 0x1D),
    ("shl", 0x1E),
    ("ror", 0x1F),
    ("rol", 0x20),
    // control flow operations
    ("jmp", 0x21),
    ("cmp", 0x22),
    ("je", 0x23),
    ("jne", 0x24),
    ("jlt", 0x25),
    ("jgt", 0x26),
    ("jle", 0x27),
    ("jge", 0x28),
    ("jz", 0x29),
    ("jnz", 0x2A),
    ("bl", 0x2B),
    ("ret", 0x2C),
];

/// Look up an opcode by mnemonic.
pub fn opcode_from_mnemonic(name: &str) -> Option<u8> {
    OPCODE_TABLE
        .iter()
        .find(|(mnemonic, _)| *mnemonic == name)
        .map(|&(_, opcode)| opcode)
}

/// Whether the opcode encodes without operands or an end tag.
pub fn is_zero_operand(opcode: u8) -> bool {
    matches!(opcode, 0x00 | 0x01 | 0x2C) // hlt, nop, ret
}

/// Resolve a register name to its 5-bit index: `r0`..`r31`, with `sp`
/// as an alias for `r31`.
pub fn register_index(name: &str) -> Option<u8> {
    if name == "sp" {
        return Some(31);
    }
    let digits = name.strip_prefix('r')?;
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Reject zero-padded forms so every register has one spelling.
    if digits.len() == 2 && digits.starts_with('0') {
        return None;
    }
    let index: u8 = digits.parse().ok()?;
    (index < 32).then_some(index)
}

/// Encode one assembly line at the image cursor, registering a
/// relocation for every operand that is neither a literal nor a
/// register.
pub(crate) fn encode_line(
    line: &Line,
    files: &[SourceFile],
    labels: &LabelTable,
    relocs: &mut RelocTable,
    image: &mut Image,
) -> Result<(), LineError> {
    if line.tokens.is_empty() {
        return Err(LineError::new(
            AsmErrorKind::Encoding,
            "insufficient parameters",
            None,
        ));
    }
    if line.tokens.len() > MAX_LINE_TOKENS {
        return Err(LineError::new(
            AsmErrorKind::Encoding,
            "too many parameters (32 maximum)",
            Some(&line.tokens.len().to_string()),
        ));
    }

    let mnemonic = &line.tokens[0].text;
    let Some(opcode) = opcode_from_mnemonic(mnemonic) else {
        return Err(LineError::at_token(
            AsmErrorKind::Encoding,
            "illegal opcode",
            Some(mnemonic),
            0,
        ));
    };

    image.write_bits(u64::from(opcode), 8)?;
    if is_zero_operand(opcode) {
        return Ok(());
    }

    for (idx, token) in line.tokens.iter().enumerate().skip(1) {
        match parse_value(&token.text).map_err(|error| LineError {
            error,
            token: Some(idx),
        })? {
            ParsedValue::Number(value) => encode_immediate(image, value)?,
            ParsedValue::Bytes(bytes) => {
                // Only single-byte literals make sense as an operand.
                if bytes.len() != 1 {
                    return Err(LineError::at_token(
                        AsmErrorKind::Encoding,
                        "string literal is not a valid instruction operand",
                        Some(&token.text),
                        idx,
                    ));
                }
                encode_immediate(image, u64::from(bytes[0]))?;
            }
            ParsedValue::Symbol => {
                if let Some(reg) = register_index(&token.text) {
                    image.write_bits(tag::REG, TAG_BITS)?;
                    image.write_bits(u64::from(reg), REG_BITS)?;
                    continue;
                }

                // A label reference: defer the address to the
                // relocation pass and skip its 64 bits.
                let qualified = labels.qualify(&token.text).map_err(|error| LineError {
                    error,
                    token: Some(idx),
                })?;
                image.write_bits(tag::IMM64, TAG_BITS)?;
                relocs.add(qualified, image.bit_pos(), line.token_pos(files, idx));
                image.skip_bits(64)?;
            }
        }
    }

    image.write_bits(tag::INSTR_END, TAG_BITS)?;
    // Every instruction starts on a byte boundary.
    image.align_to_byte();
    Ok(())
}

/// Emit a numeric operand at the smallest unsigned width that fits.
fn encode_immediate(image: &mut Image, value: u64) -> Result<(), LineError> {
    let (coding, width) = if value <= 0xFF {
        (tag::IMM8, 8)
    } else if value <= 0xFFFF {
        (tag::IMM16, 16)
    } else if value <= 0xFFFF_FFFF {
        (tag::IMM32, 32)
    } else {
        (tag::IMM64, 64)
    };
    image.write_bits(coding, TAG_BITS)?;
    image.write_bits(value, width)?;
    Ok(())
}
