// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The output image: one growable byte buffer addressed from 0.
//!
//! The first 8 bytes are reserved for the resolved entry-point address
//! and are written last. The write cursor only moves forward during
//! emission; relocation backpatching is the one exception and writes
//! through saved bit positions. `.bss` space is tracked logically and
//! reads back as zero without being materialized until something behind
//! it is written.

use crate::core::bitwriter::{bytes_used, read_bits, write_bits};
use crate::core::error::{AsmError, AsmErrorKind};

/// Reserved space for the entry-point address at the start of the image.
pub const HEADER_BYTES: u64 = 8;

/// Default capacity, matching the original tool's fixed image array.
pub const DEFAULT_CAPACITY: u64 = 0xFF_FFFF;

#[derive(Debug)]
pub struct Image {
    buf: Vec<u8>,
    /// Absolute bit cursor; starts just past the entry header.
    bit_cursor: u64,
    /// Logical image size in bytes, including unmaterialized bss space.
    logical_bytes: u64,
    capacity: u64,
}

impl Image {
    pub fn new(capacity: u64) -> Self {
        Self {
            buf: Vec::new(),
            bit_cursor: HEADER_BYTES * 8,
            logical_bytes: HEADER_BYTES,
            capacity,
        }
    }

    /// Current byte address of the cursor. Only meaningful between
    /// instructions and data entries, when the cursor is byte-aligned.
    pub fn addr(&self) -> u64 {
        debug_assert!(self.bit_cursor % 8 == 0);
        self.bit_cursor / 8
    }

    /// Current absolute bit position of the cursor.
    pub fn bit_pos(&self) -> u64 {
        self.bit_cursor
    }

    pub fn len_bytes(&self) -> u64 {
        self.logical_bytes
    }

    /// Append the low `nbits` of `value` at the cursor.
    pub fn write_bits(&mut self, value: u64, nbits: u32) -> Result<(), AsmError> {
        let end = self.checked_end_bits(u64::from(nbits))?;
        write_bits(&mut self.buf, self.bit_cursor, value, nbits);
        self.advance_to(end);
        Ok(())
    }

    /// Advance the cursor over `nbits` zero bits without writing them.
    pub fn skip_bits(&mut self, nbits: u32) -> Result<(), AsmError> {
        let end = self.checked_end_bits(u64::from(nbits))?;
        self.advance_to(end);
        Ok(())
    }

    /// Round the cursor up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        self.bit_cursor = bytes_used(self.bit_cursor) * 8;
        self.logical_bytes = self.logical_bytes.max(self.bit_cursor / 8);
    }

    /// Append raw bytes at the (byte-aligned) cursor.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), AsmError> {
        debug_assert!(self.bit_cursor % 8 == 0);
        let start = self.bit_cursor / 8;
        let end_bits = self.checked_end_bytes(bytes.len() as u64)?;
        let end = end_bits / 8;
        if (self.buf.len() as u64) < end {
            self.buf.resize(end as usize, 0);
        }
        self.buf[start as usize..end as usize].copy_from_slice(bytes);
        self.bit_cursor = end_bits;
        self.logical_bytes = self.logical_bytes.max(end);
        Ok(())
    }

    /// Advance the (byte-aligned) cursor over `count` zero bytes without
    /// materializing them.
    pub fn reserve_bytes(&mut self, count: u64) -> Result<(), AsmError> {
        debug_assert!(self.bit_cursor % 8 == 0);
        let end_bits = self.checked_end_bytes(count)?;
        self.bit_cursor = end_bits;
        self.logical_bytes = self.logical_bytes.max(end_bits / 8);
        Ok(())
    }

    /// Backpatch `nbits` at an earlier bit position. The cursor does not
    /// move.
    pub fn patch_bits(&mut self, bit_pos: u64, value: u64, nbits: u32) -> Result<(), AsmError> {
        let end = bit_pos
            .checked_add(u64::from(nbits))
            .ok_or_else(|| self.capacity_error())?;
        if bytes_used(end) > self.capacity {
            return Err(self.capacity_error());
        }
        write_bits(&mut self.buf, bit_pos, value, nbits);
        Ok(())
    }

    /// Read back bits; unmaterialized space reads as zero.
    pub fn read_bits(&self, bit_pos: u64, nbits: u32) -> u64 {
        read_bits(&self.buf, bit_pos, nbits)
    }

    /// Finalize into the flat binary, zero-padded to the logical size.
    pub fn into_bytes(mut self) -> Vec<u8> {
        if (self.buf.len() as u64) < self.logical_bytes {
            self.buf.resize(self.logical_bytes as usize, 0);
        }
        self.buf
    }

    fn advance_to(&mut self, end_bits: u64) {
        self.bit_cursor = end_bits;
        self.logical_bytes = self.logical_bytes.max(bytes_used(end_bits));
    }

    /// Bit position after appending `nbits`, or the capacity error if it
    /// would overflow or pass the ceiling. Nothing is mutated on failure.
    fn checked_end_bits(&self, nbits: u64) -> Result<u64, AsmError> {
        let end = self
            .bit_cursor
            .checked_add(nbits)
            .ok_or_else(|| self.capacity_error())?;
        if bytes_used(end) > self.capacity {
            return Err(self.capacity_error());
        }
        Ok(end)
    }

    /// Bit position after appending `count` whole bytes at the aligned
    /// cursor, with the same guarantees as `checked_end_bits`.
    fn checked_end_bytes(&self, count: u64) -> Result<u64, AsmError> {
        let end = (self.bit_cursor / 8)
            .checked_add(count)
            .ok_or_else(|| self.capacity_error())?;
        if end > self.capacity {
            return Err(self.capacity_error());
        }
        end.checked_mul(8).ok_or_else(|| self.capacity_error())
    }

    fn capacity_error(&self) -> AsmError {
        AsmError::new(
            AsmErrorKind::Image,
            "image capacity exceeded",
            Some(&format!("{} bytes", self.capacity)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Image, HEADER_BYTES};

    #[test]
    fn cursor_starts_past_entry_header() {
        let image = Image::new(1024);
        assert_eq!(image.addr(), HEADER_BYTES);
        assert_eq!(image.len_bytes(), HEADER_BYTES);
    }

    #[test]
    fn reserved_space_reads_as_zero_in_output() {
        let mut image = Image::new(1024);
        image.reserve_bytes(16).unwrap();
        image.write_bytes(&[0xAA]).unwrap();
        let bytes = image.into_bytes();
        assert_eq!(bytes.len(), 25);
        assert!(bytes[8..24].iter().all(|&b| b == 0));
        assert_eq!(bytes[24], 0xAA);
    }

    #[test]
    fn trailing_reserved_space_is_padded_out() {
        let mut image = Image::new(1024);
        image.reserve_bytes(4).unwrap();
        let bytes = image.into_bytes();
        assert_eq!(bytes.len(), 12);
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn capacity_overflow_fails_cleanly() {
        let mut image = Image::new(16);
        image.write_bytes(&[0u8; 8]).unwrap();
        assert!(image.write_bytes(&[0u8; 1]).is_err());
        assert!(image.reserve_bytes(1).is_err());
        // The failed write must not have moved the cursor.
        assert_eq!(image.addr(), 16);
    }

    #[test]
    fn oversized_reservation_fails_without_moving_the_cursor() {
        let mut image = Image::new(1024);
        assert!(image.reserve_bytes(0x4000_0000_0000_0000).is_err());
        assert!(image.reserve_bytes(u64::MAX).is_err());
        assert_eq!(image.addr(), HEADER_BYTES);
        assert_eq!(image.len_bytes(), HEADER_BYTES);
    }

    #[test]
    fn patch_rewrites_earlier_bits() {
        let mut image = Image::new(1024);
        image.write_bits(0, 64).unwrap();
        image.patch_bits(HEADER_BYTES * 8, 0xDEAD_BEEF, 64).unwrap();
        assert_eq!(image.read_bits(HEADER_BYTES * 8, 64), 0xDEAD_BEEF);
    }

    #[test]
    fn align_rounds_partial_bytes_up() {
        let mut image = Image::new(1024);
        image.write_bits(0b101, 3).unwrap();
        image.align_to_byte();
        assert_eq!(image.addr(), HEADER_BYTES + 1);
    }
}
