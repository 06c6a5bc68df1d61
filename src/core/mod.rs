// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Reusable leaves shared across the assembler pipeline.

pub mod bitwriter;
pub mod error;
pub mod image;
pub mod report;
pub mod scanner;
pub mod value;
