// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Value parser: classifies a sub-token as numeric, raw bytes or symbolic.

use crate::core::error::{AsmError, AsmErrorKind};

/// Classification of one sub-token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedValue {
    /// An unsigned numeric value. Negative literals arrive as their
    /// 64-bit two's-complement.
    Number(u64),
    /// Decoded bytes of a quoted string or char literal.
    Bytes(Vec<u8>),
    /// Not a literal; caller should try registers, then labels.
    Symbol,
}

/// Parse one sub-token.
///
/// Numbers accept decimal, `0x` hex, `0b` binary and `0o` octal, with an
/// optional leading `-`. Quoted literals are decoded with their escapes.
/// Everything else is `Symbol`.
pub fn parse_value(token: &str) -> Result<ParsedValue, AsmError> {
    let bytes = token.as_bytes();
    let Some(&first) = bytes.first() else {
        return Ok(ParsedValue::Symbol);
    };

    if first == b'"' || first == b'\'' {
        return decode_quoted(token).map(ParsedValue::Bytes);
    }

    let negative = first == b'-';
    let digits = if negative { &token[1..] } else { token };
    if !digits.as_bytes().first().is_some_and(|c| c.is_ascii_digit()) {
        return Ok(ParsedValue::Symbol);
    }

    let (radix, digits) = match digits.as_bytes() {
        [b'0', b'x' | b'X', ..] => (16, &digits[2..]),
        [b'0', b'b' | b'B', ..] => (2, &digits[2..]),
        [b'0', b'o' | b'O', ..] => (8, &digits[2..]),
        _ => (10, digits),
    };

    let magnitude = u64::from_str_radix(digits, radix)
        .map_err(|_| AsmError::new(AsmErrorKind::Scanner, "illegal numeric constant", Some(token)))?;
    if negative {
        Ok(ParsedValue::Number(magnitude.wrapping_neg()))
    } else {
        Ok(ParsedValue::Number(magnitude))
    }
}

fn decode_quoted(token: &str) -> Result<Vec<u8>, AsmError> {
    let bytes = token.as_bytes();
    let quote = bytes[0];
    if bytes.len() < 2 || bytes[bytes.len() - 1] != quote {
        return Err(AsmError::new(
            AsmErrorKind::Scanner,
            "unterminated quoted literal",
            Some(token),
        ));
    }

    let mut out = Vec::new();
    let inner = &bytes[1..bytes.len() - 1];
    let mut i = 0;
    while i < inner.len() {
        let c = inner[i];
        if c != b'\\' {
            out.push(c);
            i += 1;
            continue;
        }
        i += 1;
        let Some(&esc) = inner.get(i) else {
            return Err(AsmError::new(
                AsmErrorKind::Scanner,
                "dangling escape in quoted literal",
                Some(token),
            ));
        };
        let decoded = match esc {
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'0' => b'\0',
            b'x' => {
                let hi = inner.get(i + 1).copied();
                let lo = inner.get(i + 2).copied();
                match (hi.and_then(hex_digit), lo.and_then(hex_digit)) {
                    (Some(hi), Some(lo)) => {
                        i += 2;
                        (hi << 4) | lo
                    }
                    _ => {
                        return Err(AsmError::new(
                            AsmErrorKind::Scanner,
                            "bad hex escape in quoted literal",
                            Some(token),
                        ))
                    }
                }
            }
            other => other,
        };
        out.push(decoded);
        i += 1;
    }
    Ok(out)
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
