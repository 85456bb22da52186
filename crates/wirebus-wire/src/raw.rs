//! Pure, allocation-free reads over an entry byte range. Shared by the
//! mutable [`crate::entries::Entries`] view and the read-only
//! [`crate::view::EntriesView`] so the two don't duplicate header parsing.

use crate::entry_type::{EntryType, unpack_header};
use crate::float16::f16_bits_to_f32;

/// Decoded type + name for the entry header at `buf[at..at+2]`.
#[must_use]
pub fn header_at(buf: &[u8], at: usize) -> (EntryType, [u8; 2]) {
    let (tag, name) = unpack_header([buf[at], buf[at + 1]]);
    (EntryType::from_tag(tag), name)
}

/// Offset of the first payload byte for the entry at `at`.
#[must_use]
pub const fn payload_start(at: usize) -> usize {
    at + 2
}

/// Number of payload bytes, reading the length prefix from `buf` when the
/// type carries one.
#[must_use]
pub fn payload_len_at(buf: &[u8], at: usize) -> usize {
    let (etype, _) = header_at(buf, at);
    let prefix = if etype.has_length_prefix() {
        buf[payload_start(at)]
    } else {
        0
    };
    etype.payload_len(prefix)
}

/// `2 + payload_len`: the number of bytes this entry occupies, header
/// included.
#[must_use]
pub fn entry_total_len(buf: &[u8], at: usize) -> usize {
    2 + payload_len_at(buf, at)
}

fn read_le(bytes: &[u8]) -> u64 {
    let mut out = 0u64;
    for (i, b) in bytes.iter().enumerate() {
        out |= u64::from(*b) << (8 * i);
    }
    out
}

/// Read the entry at `at` as a signed integer, coercing floats and
/// defaulting non-numeric types to `0` (spec §4.2 "Typed accessors").
#[must_use]
pub fn get_int(buf: &[u8], at: usize) -> i64 {
    let (etype, _) = header_at(buf, at);
    let p = payload_start(at);
    match etype {
        EntryType::ShortInt(v) => i64::from(v),
        EntryType::PositiveInt(n) => read_le(&buf[p..p + n as usize + 1]) as i64,
        EntryType::NegativeInt(n) => -(read_le(&buf[p..p + n as usize + 1]) as i64),
        EntryType::FloatZero => 0,
        EntryType::Float16 => f16_bits_to_f32(u16::from_le_bytes([buf[p], buf[p + 1]])) as i64,
        EntryType::Float32 => {
            f32::from_le_bytes([buf[p], buf[p + 1], buf[p + 2], buf[p + 3]]) as i64
        }
        EntryType::Float64 => {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[p..p + 8]);
            f64::from_le_bytes(b) as i64
        }
        EntryType::Null | EntryType::Struct | EntryType::SubPacket | EntryType::LongBytes => 0,
        EntryType::ShortBytes(_) => 0,
    }
}

/// Read the entry at `at` as a floating point value, coercing integers.
#[must_use]
pub fn get_float(buf: &[u8], at: usize) -> f64 {
    let (etype, _) = header_at(buf, at);
    let p = payload_start(at);
    match etype {
        EntryType::FloatZero => 0.0,
        EntryType::Float16 => f64::from(f16_bits_to_f32(u16::from_le_bytes([buf[p], buf[p + 1]]))),
        EntryType::Float32 => {
            f64::from(f32::from_le_bytes([buf[p], buf[p + 1], buf[p + 2], buf[p + 3]]))
        }
        EntryType::Float64 => {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[p..p + 8]);
            f64::from_le_bytes(b)
        }
        _ => get_int(buf, at) as f64,
    }
}

/// Read the entry at `at` as a raw byte slice. Non-bytes types read as
/// empty.
#[must_use]
pub fn get_bytes(buf: &[u8], at: usize) -> &[u8] {
    let (etype, _) = header_at(buf, at);
    let p = payload_start(at);
    match etype {
        EntryType::ShortBytes(n) => &buf[p..p + n as usize],
        EntryType::LongBytes => {
            let n = buf[p] as usize;
            &buf[p + 1..p + 1 + n]
        }
        _ => &[],
    }
}

/// Read the entry at `at` as a raw 32-bit bit pattern, preserving float bit
/// patterns exactly and bit-reinterpreting integers (spec §3
/// `SharedVariable.value`, "u32 raw bits, reinterpretable as
/// `{u32,i32,f32}`"). Lossy for `Float64` (truncated to `f32`); mismatched
/// types default to `0`.
#[must_use]
pub fn get_u32_bits(buf: &[u8], at: usize) -> u32 {
    let (etype, _) = header_at(buf, at);
    let p = payload_start(at);
    match etype {
        EntryType::FloatZero => 0,
        EntryType::Float16 => f16_bits_to_f32(u16::from_le_bytes([buf[p], buf[p + 1]])).to_bits(),
        EntryType::Float32 => u32::from_le_bytes([buf[p], buf[p + 1], buf[p + 2], buf[p + 3]]),
        EntryType::Float64 => {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[p..p + 8]);
            (f64::from_le_bytes(b) as f32).to_bits()
        }
        EntryType::ShortInt(_) | EntryType::PositiveInt(_) | EntryType::NegativeInt(_) => {
            get_int(buf, at) as i32 as u32
        }
        EntryType::Null | EntryType::Struct | EntryType::SubPacket | EntryType::LongBytes => 0,
        EntryType::ShortBytes(_) => 0,
    }
}

/// Read the entry at `at` as a sub-packet's raw (already sealed) wire
/// bytes, or `None` if it isn't a [`EntryType::SubPacket`].
#[must_use]
pub fn get_subpacket_bytes(buf: &[u8], at: usize) -> Option<&[u8]> {
    let (etype, _) = header_at(buf, at);
    if etype != EntryType::SubPacket {
        return None;
    }
    let p = payload_start(at);
    let n = buf[p] as usize;
    Some(&buf[p + 1..p + 1 + n])
}
