// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Text macro pass: `%define% NAME VALUE` definitions and exact-match
//! substitution into later assembly lines.

use std::collections::HashMap;

use crate::core::error::AsmErrorKind;

use super::line::{Line, LineKind};
use super::LineError;

/// Collect every definition, then substitute into every assembly line.
///
/// Collection runs over the whole program first, so a use may precede
/// its definition; a later definition of the same name wins everywhere.
/// Substitution replaces whole sub-tokens; partial matches and quoted
/// text are untouched because tokens carry their quotes.
pub(crate) fn apply_macros(lines: &mut [Line]) -> Result<(), (usize, LineError)> {
    let mut defs: HashMap<String, String> = HashMap::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.kind == LineKind::MacroDef {
            if line.tokens.len() < 3 {
                return Err((
                    idx,
                    LineError::new(
                        AsmErrorKind::Macro,
                        "macro definition needs a name and a value",
                        None,
                    ),
                ));
            }
            defs.insert(line.tokens[1].text.clone(), line.tokens[2].text.clone());
        }
    }

    for line in lines.iter_mut() {
        if line.kind != LineKind::Asm {
            continue;
        }
        for token in &mut line.tokens {
            if let Some(value) = defs.get(&token.text) {
                token.text = value.clone();
            }
        }
    }
    Ok(())
}
