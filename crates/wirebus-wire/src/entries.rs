//! The mutable entry-container view (spec §4.2, §9 "tagged container view
//! instead of a class hierarchy").
//!
//! A [`Packet`]'s top-level entries and every nested struct's entries all
//! live in the *same* flat buffer. Rather than the original design's
//! `Entries` / `SubEntries` inheritance pair (each holding a back-reference
//! to its parent), one [`Entries`] type serves both: `scope` records the
//! chain of ancestor struct length-byte offsets, empty for the top level.
//! Every mutation bottoms out in [`Packet::apply_resize`], which shifts the
//! buffer tail and bumps every ancestor's length byte in one place instead
//! of a virtual `resize()` dispatched up a C++ object graph.

use crate::entry_type::{EntryType, pack_header};
use crate::error::WireError;
use crate::packet::Packet;
use crate::raw;
use crate::view::EntriesView;

/// Struct nesting is bounded so the ancestor chain fits in a fixed array —
/// no heap, no recursion limit surprises.
pub const MAX_NESTING: usize = 4;

/// The chain of ancestor struct length-byte offsets leading to a container.
/// Empty (`depth == 0`) for the packet's top-level entries.
#[derive(Clone, Copy, Debug)]
pub struct Scope {
    chain: [usize; MAX_NESTING],
    depth: usize,
}

impl Scope {
    pub(crate) const fn root() -> Self {
        Self { chain: [0; MAX_NESTING], depth: 0 }
    }

    fn ancestors(&self) -> &[usize] {
        &self.chain[..self.depth]
    }

    fn enter(&self, len_byte_offset: usize) -> Result<Self, WireError> {
        if self.depth >= MAX_NESTING {
            return Err(WireError::NestingTooDeep);
        }
        let mut chain = self.chain;
        chain[self.depth] = len_byte_offset;
        Ok(Self { chain, depth: self.depth + 1 })
    }
}

/// A mutable view over one container's worth of entries: either a packet's
/// top level or the inside of a [`EntryType::Struct`] entry.
pub struct Entries<'p, 'a> {
    pub(crate) packet: &'p mut Packet<'a>,
    pub(crate) base: usize,
    pub(crate) scope: Scope,
}

impl<'p, 'a> Entries<'p, 'a> {
    pub(crate) fn top(packet: &'p mut Packet<'a>) -> Self {
        let base = packet.header_len();
        Self { packet, base, scope: Scope::root() }
    }

    fn container_len(&self) -> usize {
        match self.scope.depth {
            0 => self.packet.entries_region_end() - self.base,
            d => self.packet.buf[self.scope.chain[d - 1]] as usize,
        }
    }

    /// Offset one past the container's last entry byte.
    fn end(&self) -> usize {
        self.base + self.container_len()
    }

    fn resize(&mut self, ptr: usize, old_len: usize, new_len: usize) -> Result<(), WireError> {
        self.packet.apply_resize(ptr, old_len, new_len, self.scope.ancestors())
    }

    /// Iterate this container's entry offsets in order.
    pub fn iter(&self) -> EntryIter<'_, 'p, 'a> {
        EntryIter { entries: self, pos: self.base }
    }

    /// Find the `index`-th (0-based) entry named `name`.
    #[must_use]
    pub fn find(&self, name: [u8; 2], index: usize) -> Option<usize> {
        self.iter().filter(|&at| self.entry_name(at) == name).nth(index)
    }

    #[must_use]
    pub fn entry_type(&self, at: usize) -> EntryType {
        raw::header_at(self.packet.buf, at).0
    }

    #[must_use]
    pub fn entry_name(&self, at: usize) -> [u8; 2] {
        raw::header_at(self.packet.buf, at).1
    }

    #[must_use]
    pub fn get_int(&self, at: usize) -> i64 {
        raw::get_int(self.packet.buf, at)
    }

    #[must_use]
    pub fn get_float(&self, at: usize) -> f64 {
        raw::get_float(self.packet.buf, at)
    }

    #[must_use]
    pub fn get_bytes(&self, at: usize) -> &[u8] {
        raw::get_bytes(self.packet.buf, at)
    }

    #[must_use]
    pub fn get_str(&self, at: usize) -> &str {
        core::str::from_utf8(self.get_bytes(at)).unwrap_or("")
    }

    /// Append a new `Null`-typed entry named `name` at the end of this
    /// container and return its offset.
    pub fn append(&mut self, name: [u8; 2]) -> Result<usize, WireError> {
        let at = self.end();
        self.resize(at, 0, 2)?;
        let hdr = pack_header(EntryType::Null.tag(), name);
        self.packet.buf[at] = hdr[0];
        self.packet.buf[at + 1] = hdr[1];
        Ok(at)
    }

    /// Remove the entry at `at` entirely, shifting everything after it
    /// left and shrinking every ancestor's length byte.
    pub fn remove(&mut self, at: usize) -> Result<(), WireError> {
        let len = raw::entry_total_len(self.packet.buf, at);
        self.resize(at, len, 0)
    }

    fn rewrite_payload(
        &mut self,
        at: usize,
        new_type: EntryType,
        payload: &[u8],
    ) -> Result<(), WireError> {
        let name = self.entry_name(at);
        let old_len = raw::payload_len_at(self.packet.buf, at);
        let p = raw::payload_start(at);
        self.resize(p, old_len, payload.len())?;
        let hdr = pack_header(new_type.tag(), name);
        self.packet.buf[at] = hdr[0];
        self.packet.buf[at + 1] = hdr[1];
        self.packet.buf[p..p + payload.len()].copy_from_slice(payload);
        Ok(())
    }

    /// Reset the entry at `at` to `Null` (no payload), preserving its name.
    pub fn set_null(&mut self, at: usize) -> Result<(), WireError> {
        self.rewrite_payload(at, EntryType::Null, &[])
    }

    /// Encode `value` in its narrowest representation (spec §4.2 "Integer
    /// narrowing"): `0` and `1..=31` collapse to the inline `ShortInt` form;
    /// anything else uses the minimal number of little-endian magnitude
    /// bytes.
    pub fn set_int(&mut self, at: usize, value: i64) -> Result<(), WireError> {
        let (etype, bytes, len) = encode_int(value);
        self.rewrite_payload(at, etype, &bytes[..len])
    }

    /// Encode `value` as a float of the requested width, except that exact
    /// `0.0` always collapses to the 0-byte `FloatZero` form regardless of
    /// the width requested.
    pub fn set_float(&mut self, at: usize, value: f64, width: FloatWidth) -> Result<(), WireError> {
        if value == 0.0 {
            return self.rewrite_payload(at, EntryType::FloatZero, &[]);
        }
        match width {
            FloatWidth::F16 => {
                let bits = crate::float16::f32_to_f16_bits(value as f32);
                self.rewrite_payload(at, EntryType::Float16, &bits.to_le_bytes())
            }
            FloatWidth::F32 => {
                let bits = (value as f32).to_le_bytes();
                self.rewrite_payload(at, EntryType::Float32, &bits)
            }
            FloatWidth::F64 => {
                let bits = value.to_le_bytes();
                self.rewrite_payload(at, EntryType::Float64, &bits)
            }
        }
    }

    /// Encode `data` as bytes, picking `ShortBytes` (0..=7 bytes, no length
    /// byte) or `LongBytes` (1-byte length prefix, up to 255 bytes) to
    /// match spec §3's encoding table. Input longer than 255 bytes is
    /// truncated.
    pub fn set_bytes(&mut self, at: usize, data: &[u8]) -> Result<(), WireError> {
        if data.len() <= 7 {
            self.rewrite_payload(at, EntryType::ShortBytes(data.len() as u8), data)
        } else {
            let n = data.len().min(255);
            let mut payload = [0u8; 256];
            payload[0] = n as u8;
            payload[1..1 + n].copy_from_slice(&data[..n]);
            self.rewrite_payload(at, EntryType::LongBytes, &payload[..1 + n])
        }
    }

    /// Encode `s` the same way as [`Self::set_bytes`].
    pub fn set_str(&mut self, at: usize, s: &str) -> Result<(), WireError> {
        self.set_bytes(at, s.as_bytes())
    }

    /// Copy `inner`'s complete, already-finalized wire bytes in as a
    /// [`EntryType::SubPacket`] payload.
    pub fn set_subpacket(&mut self, at: usize, inner: &[u8]) -> Result<(), WireError> {
        let n = inner.len().min(255);
        let mut payload = [0u8; 256];
        payload[0] = n as u8;
        payload[1..1 + n].copy_from_slice(&inner[..n]);
        self.rewrite_payload(at, EntryType::SubPacket, &payload[..1 + n])
    }

    /// Convert the entry at `at` into a `Struct` (payload `N = 0`, i.e. no
    /// nested entries yet) and return a view over its (empty) contents.
    pub fn set_struct(&mut self, at: usize) -> Result<Entries<'_, 'a>, WireError> {
        self.rewrite_payload(at, EntryType::Struct, &[0])?;
        let len_off = raw::payload_start(at);
        let new_scope = self.scope.enter(len_off)?;
        Ok(Entries { packet: self.packet, base: len_off + 1, scope: new_scope })
    }

    /// Re-enter a [`EntryType::Struct`] entry's contents for further
    /// mutation.
    pub fn enter_struct(&mut self, at: usize) -> Result<Entries<'_, 'a>, WireError> {
        if self.entry_type(at) != EntryType::Struct {
            return self.set_struct(at);
        }
        let len_off = raw::payload_start(at);
        let new_scope = self.scope.enter(len_off)?;
        Ok(Entries { packet: self.packet, base: len_off + 1, scope: new_scope })
    }

    /// A read-only snapshot of this container, for callers that only need
    /// to inspect (no `Packet` borrow conflict with simultaneous reads
    /// elsewhere).
    #[must_use]
    pub fn as_view(&self) -> EntriesView<'_> {
        EntriesView::new(self.packet.buf, self.base, self.end())
    }
}

/// The width to encode a float entry at, per [`Entries::set_float`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F16,
    F32,
    F64,
}

fn minimal_len(bytes_le: &[u8; 8]) -> usize {
    for i in (0..8).rev() {
        if bytes_le[i] != 0 {
            return i + 1;
        }
    }
    1
}

/// Encode a signed integer per spec §3's narrowing rule. Returns the
/// resulting type, an 8-byte little-endian magnitude buffer, and how many
/// of those bytes are meaningful.
pub(crate) fn encode_int(value: i64) -> (EntryType, [u8; 8], usize) {
    if value == 0 {
        return (EntryType::ShortInt(0), [0; 8], 0);
    }
    if (1..=31).contains(&value) {
        return (EntryType::ShortInt(value as u8), [0; 8], 0);
    }
    if value > 0 {
        let bytes = (value as u64).to_le_bytes();
        let n = minimal_len(&bytes);
        (EntryType::PositiveInt((n - 1) as u8), bytes, n)
    } else {
        let magnitude = value.unsigned_abs();
        let bytes = magnitude.to_le_bytes();
        let n = minimal_len(&bytes);
        (EntryType::NegativeInt((n - 1) as u8), bytes, n)
    }
}

/// Iterator over a container's entry offsets.
pub struct EntryIter<'e, 'p, 'a> {
    entries: &'e Entries<'p, 'a>,
    pos: usize,
}

impl Iterator for EntryIter<'_, '_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.pos >= self.entries.end() {
            return None;
        }
        let at = self.pos;
        self.pos += raw::entry_total_len(self.entries.packet.buf, at);
        Some(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;

    #[test]
    fn append_and_set_int_short_form() {
        let mut buf = [0u8; 32];
        let mut pkt = Packet::command(&mut buf, 0x41, 0x11).unwrap();
        let mut entries = pkt.entries();
        let at = entries.append(*b"Iy").unwrap();
        entries.set_int(at, 3).unwrap();
        assert_eq!(entries.get_int(at), 3);
        assert_eq!(entries.entry_type(at), EntryType::ShortInt(3));
    }

    #[test]
    fn set_int_idempotent() {
        let mut buf = [0u8; 32];
        let mut pkt = Packet::command(&mut buf, 1, 1).unwrap();
        let mut entries = pkt.entries();
        let at = entries.append(*b"Ab").unwrap();
        entries.set_int(at, 12345).unwrap();
        let total_after_first = pkt.total_len();
        let mut snapshot = [0u8; 32];
        snapshot[..total_after_first].copy_from_slice(&pkt.buf[..total_after_first]);
        let mut entries = pkt.entries();
        entries.set_int(at, 12345).unwrap();
        assert_eq!(pkt.total_len(), total_after_first);
        assert_eq!(&pkt.buf[..pkt.total_len()], &snapshot[..total_after_first]);
    }

    #[test]
    fn remove_shrinks_and_shifts() {
        let mut buf = [0u8; 32];
        let mut pkt = Packet::command(&mut buf, 1, 1).unwrap();
        let mut entries = pkt.entries();
        let a = entries.append(*b"Aa").unwrap();
        entries.set_int(a, 10).unwrap();
        let b = entries.append(*b"Bb").unwrap();
        entries.set_int(b, 20).unwrap();
        entries.remove(a).unwrap();
        let entries = pkt.entries();
        let only = entries.iter().next().unwrap();
        assert_eq!(entries.entry_name(only), *b"Bb");
        assert_eq!(entries.get_int(only), 20);
    }

    #[test]
    fn nested_struct_round_trip() {
        let mut buf = [0u8; 64];
        let mut pkt = Packet::telemetry(&mut buf, 2, 2).unwrap();
        let mut top = pkt.entries();
        let s_at = top.append(*b"Sx").unwrap();
        let mut inner = top.set_struct(s_at).unwrap();
        let x_at = inner.append(*b"Xa").unwrap();
        inner.set_int(x_at, -500).unwrap();
        drop(inner);
        assert_eq!(top.entry_type(s_at), EntryType::Struct);
        let inner2 = top.enter_struct(s_at).unwrap();
        let back = inner2.iter().next().unwrap();
        assert_eq!(inner2.get_int(back), -500);
    }

    #[test]
    fn encode_int_matches_narrowing_rule() {
        assert_eq!(encode_int(0).0, EntryType::ShortInt(0));
        assert_eq!(encode_int(31).0, EntryType::ShortInt(31));
        assert_eq!(encode_int(32).0, EntryType::PositiveInt(0));
        assert_eq!(encode_int(-1).0, EntryType::NegativeInt(0));
        assert_eq!(encode_int(300).0, EntryType::PositiveInt(1));
        assert_eq!(encode_int(-300).0, EntryType::NegativeInt(1));
    }
}
