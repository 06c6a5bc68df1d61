// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Bit-level writes into a growable byte buffer.
//!
//! Operand tags are 3 bits wide, so instruction encoding cannot use a
//! plain byte index. Bits are packed LSB-first within each byte and
//! multi-bit values are written low bit first, which makes whole-byte
//! writes at byte-aligned positions come out little-endian.

/// Write the low `nbits` of `value` at absolute bit position `bit_pos`,
/// growing the buffer with zero bytes as needed.
pub fn write_bits(buf: &mut Vec<u8>, bit_pos: u64, value: u64, nbits: u32) {
    debug_assert!(nbits <= 64);
    let end_byte = ((bit_pos + u64::from(nbits) + 7) / 8) as usize;
    if buf.len() < end_byte {
        buf.resize(end_byte, 0);
    }
    for i in 0..u64::from(nbits) {
        let pos = bit_pos + i;
        let byte = (pos / 8) as usize;
        let bit = (pos % 8) as u32;
        let mask = 1u8 << bit;
        if (value >> i) & 1 == 1 {
            buf[byte] |= mask;
        } else {
            buf[byte] &= !mask;
        }
    }
}

/// Read `nbits` starting at absolute bit position `bit_pos`. Bits past
/// the end of the buffer read as zero.
pub fn read_bits(buf: &[u8], bit_pos: u64, nbits: u32) -> u64 {
    debug_assert!(nbits <= 64);
    let mut value = 0u64;
    for i in 0..u64::from(nbits) {
        let pos = bit_pos + i;
        let byte = (pos / 8) as usize;
        let bit = (pos % 8) as u32;
        let set = buf.get(byte).is_some_and(|b| (b >> bit) & 1 == 1);
        if set {
            value |= 1 << i;
        }
    }
    value
}

/// Number of whole bytes covered by `bits` bits. Safe across the full
/// `u64` range.
pub fn bytes_used(bits: u64) -> u64 {
    bits / 8 + u64::from(bits % 8 != 0)
}

#[cfg(test)]
mod tests {
    use super::{bytes_used, read_bits, write_bits};

    #[test]
    fn aligned_writes_are_little_endian() {
        let mut buf = Vec::new();
        write_bits(&mut buf, 0, 0x1234, 16);
        assert_eq!(buf, vec![0x34, 0x12]);
    }

    #[test]
    fn unaligned_write_round_trips() {
        let mut buf = Vec::new();
        write_bits(&mut buf, 0, 0b101, 3);
        write_bits(&mut buf, 3, 0xAB, 8);
        assert_eq!(read_bits(&buf, 0, 3), 0b101);
        assert_eq!(read_bits(&buf, 3, 8), 0xAB);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn backpatch_overwrites_previous_bits() {
        let mut buf = Vec::new();
        write_bits(&mut buf, 5, u64::MAX, 64);
        write_bits(&mut buf, 5, 0x1122_3344_5566_7788, 64);
        assert_eq!(read_bits(&buf, 5, 64), 0x1122_3344_5566_7788);
    }

    #[test]
    fn reads_past_end_are_zero() {
        assert_eq!(read_bits(&[0xFF], 4, 8), 0x0F);
    }

    #[test]
    fn bytes_used_rounds_up() {
        assert_eq!(bytes_used(0), 0);
        assert_eq!(bytes_used(1), 1);
        assert_eq!(bytes_used(8), 1);
        assert_eq!(bytes_used(9), 2);
    }
}
