//! Read-only entry traversal, usable from a plain `&[u8]` (e.g. the body of
//! a still-framed UART/CAN receive buffer, or a sub-packet payload) without
//! needing a mutable [`crate::packet::Packet`] borrow.

use crate::entry_type::EntryType;
use crate::raw;

/// A read-only view over one container's entries.
#[derive(Clone, Copy)]
pub struct EntriesView<'b> {
    buf: &'b [u8],
    base: usize,
    end: usize,
}

impl<'b> EntriesView<'b> {
    pub(crate) fn new(buf: &'b [u8], base: usize, end: usize) -> Self {
        Self { buf, base, end }
    }

    /// A view over a top-level packet's entries, given its full wire bytes
    /// (header through checksum inclusive) and header length.
    #[must_use]
    pub fn top_level(buf: &'b [u8], header_len: usize, sealed: bool) -> Self {
        let total = buf[0] as usize;
        let end = if sealed { total.saturating_sub(1) } else { total };
        Self { buf, base: header_len, end }
    }

    /// Iterate this container's entry offsets in order.
    pub fn iter(&self) -> EntryViewIter<'b> {
        EntryViewIter { buf: self.buf, pos: self.base, end: self.end }
    }

    #[must_use]
    pub fn find(&self, name: [u8; 2], index: usize) -> Option<usize> {
        self.iter().filter(|&at| self.entry_name(at) == name).nth(index)
    }

    #[must_use]
    pub fn entry_type(&self, at: usize) -> EntryType {
        raw::header_at(self.buf, at).0
    }

    #[must_use]
    pub fn entry_name(&self, at: usize) -> [u8; 2] {
        raw::header_at(self.buf, at).1
    }

    #[must_use]
    pub fn get_int(&self, at: usize) -> i64 {
        raw::get_int(self.buf, at)
    }

    #[must_use]
    pub fn get_float(&self, at: usize) -> f64 {
        raw::get_float(self.buf, at)
    }

    #[must_use]
    pub fn get_bytes(&self, at: usize) -> &'b [u8] {
        raw::get_bytes(self.buf, at)
    }

    #[must_use]
    pub fn get_str(&self, at: usize) -> &'b str {
        core::str::from_utf8(self.get_bytes(at)).unwrap_or("")
    }

    #[must_use]
    pub fn get_raw32(&self, at: usize) -> u32 {
        raw::get_u32_bits(self.buf, at)
    }

    #[must_use]
    pub fn get_subpacket_bytes(&self, at: usize) -> Option<&'b [u8]> {
        raw::get_subpacket_bytes(self.buf, at)
    }

    /// Descend into the entry at `at`, if it is a [`EntryType::Struct`].
    #[must_use]
    pub fn enter_struct(&self, at: usize) -> Option<EntriesView<'b>> {
        if self.entry_type(at) != EntryType::Struct {
            return None;
        }
        let len_off = raw::payload_start(at);
        let n = self.buf[len_off] as usize;
        Some(EntriesView { buf: self.buf, base: len_off + 1, end: len_off + 1 + n })
    }
}

pub struct EntryViewIter<'b> {
    buf: &'b [u8],
    pos: usize,
    end: usize,
}

impl Iterator for EntryViewIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.pos >= self.end {
            return None;
        }
        let at = self.pos;
        self.pos += raw::entry_total_len(self.buf, at);
        Some(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;

    #[test]
    fn read_only_view_matches_mutable_reads() {
        let mut buf = [0u8; 32];
        let mut pkt = Packet::command(&mut buf, 5, 5).unwrap();
        let mut entries = pkt.entries();
        let at = entries.append(*b"Vv").unwrap();
        entries.set_int(at, 77).unwrap();
        let bytes = pkt.as_bytes();
        let view = EntriesView::top_level(bytes, pkt.header_len(), pkt.is_sealed());
        let found = view.find(*b"Vv", 0).unwrap();
        assert_eq!(view.get_int(found), 77);
    }
}
