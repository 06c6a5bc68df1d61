// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Label table and relocation engine.
//!
//! The table owns every registered name; the current scope is the index
//! of the most recent global label, never a separate allocation. Local
//! names are qualified at registration and at reference time with the
//! same concatenation, so resolution is a plain exact-string lookup.

use std::collections::HashMap;

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::image::Image;
use crate::core::report::SourcePos;

/// A named, resolved byte address within the image.
#[derive(Debug, Clone)]
pub struct Label {
    pub name: String,
    pub addr: u64,
    /// Definition site, kept for duplicate-definition diagnostics.
    pub pos: SourcePos,
}

/// Why a declaration was rejected.
#[derive(Debug)]
pub enum DeclareError {
    /// A local label was declared before any global label.
    NoScope { name: String },
    /// The qualified name already exists; carries the prior site.
    Duplicate { name: String, prior: SourcePos },
}

#[derive(Debug, Default)]
pub struct LabelTable {
    labels: Vec<Label>,
    index: HashMap<String, usize>,
    scope: Option<usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a code label and update the scope. `name` arrives without
    /// its trailing colon. Local names are qualified with the current
    /// scope; global names become the new scope.
    pub fn declare(
        &mut self,
        name: &str,
        is_local: bool,
        addr: u64,
        pos: SourcePos,
    ) -> Result<usize, DeclareError> {
        let qualified = if is_local {
            match self.scope_name() {
                Some(scope) => format!("{scope}{name}"),
                None => {
                    return Err(DeclareError::NoScope {
                        name: name.to_string(),
                    })
                }
            }
        } else {
            name.to_string()
        };

        let id = self.insert(qualified, addr, pos)?;
        if !is_local {
            self.scope = Some(id);
        }
        Ok(id)
    }

    /// Register a section-data or synthetic label. The scope is not
    /// touched and the name is taken as-is.
    pub fn declare_entry(
        &mut self,
        name: &str,
        addr: u64,
        pos: SourcePos,
    ) -> Result<usize, DeclareError> {
        self.insert(name.to_string(), addr, pos)
    }

    /// Qualify an operand reference the same way declarations are
    /// qualified: `.`-prefixed names get the current scope prepended.
    pub fn qualify(&self, name: &str) -> Result<String, AsmError> {
        if !name.starts_with('.') {
            return Ok(name.to_string());
        }
        match self.scope_name() {
            Some(scope) => Ok(format!("{scope}{name}")),
            None => Err(AsmError::new(
                AsmErrorKind::Symbol,
                "local label reference outside any scope",
                Some(name),
            )),
        }
    }

    /// Exact-string lookup.
    pub fn resolve(&self, name: &str) -> Option<u64> {
        self.index.get(name).map(|&id| self.labels[id].addr)
    }

    pub fn get(&self, id: usize) -> &Label {
        &self.labels[id]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn scope_name(&self) -> Option<&str> {
        self.scope.map(|id| self.labels[id].name.as_str())
    }

    fn insert(&mut self, name: String, addr: u64, pos: SourcePos) -> Result<usize, DeclareError> {
        if let Some(&prior) = self.index.get(&name) {
            return Err(DeclareError::Duplicate {
                name,
                prior: self.labels[prior].pos.clone(),
            });
        }
        let id = self.labels.len();
        self.index.insert(name.clone(), id);
        self.labels.push(Label { name, addr, pos });
        Ok(id)
    }
}

/// A pending 64-bit patch waiting on a symbolic name.
#[derive(Debug, Clone)]
pub struct Relocation {
    pub name: String,
    /// Absolute bit position of the 64 bits to patch.
    pub bit_pos: u64,
    /// Referencing token, for diagnostics.
    pub pos: SourcePos,
}

#[derive(Debug, Default)]
pub struct RelocTable {
    entries: Vec<Relocation>,
}

impl RelocTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: String, bit_pos: u64, pos: SourcePos) {
        self.entries.push(Relocation { name, bit_pos, pos });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Backpatch every pending entry. All declarations must already be
    /// in the table; an unknown name fails the run, returning the
    /// offending entry. Entries patch disjoint locations, so order does
    /// not matter.
    pub fn resolve_all(&self, labels: &LabelTable, image: &mut Image) -> Result<(), Relocation> {
        for entry in &self.entries {
            let Some(addr) = labels.resolve(&entry.name) else {
                return Err(entry.clone());
            };
            if image.patch_bits(entry.bit_pos, addr, 64).is_err() {
                // Patch points always lie inside already-emitted image
                // space, so this only trips on a corrupted table.
                return Err(entry.clone());
            }
        }
        Ok(())
    }
}
