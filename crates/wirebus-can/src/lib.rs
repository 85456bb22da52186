//! CAN bus adapter: frame splitting/joining and multi-frame reassembly
//! (spec §4.5 "CanAdapter").
//!
//! The 29-bit extended identifier carries `kind_id:8 | origin_unit:8 |
//! hw_filter_byte:8 | frame_index:5`. A packet longer than 8 bytes is split
//! into `ceil(L / 8)` frames; frame 0's first two payload bytes are
//! overwritten with `(L, frame_count)` in place of the packet's own
//! (redundant, already implied by the identifier) length and kind bytes,
//! and reassembly reconstructs them from frame metadata instead.
//!
//! Dispatch into [`wirebus_core::BusCore`] is the caller's job once
//! [`CanAdapter::receive`] hands back a verified packet — this adapter only
//! owns framing, reassembly and hardware filter synthesis, per spec §2's
//! component boundaries.

#![no_std]

use wirebus_codec::crc8_smbus;
use wirebus_hal::{CanDriver, DiagEvent, ErrorCode, emit};
use wirebus_section::SectionBuf;
use wirebus_wire::Packet;

/// Reassembly metadata prefix: `[kind_id, origin, next_expected_idx, total_frames]`.
const META_LEN: usize = 4;

/// Split `packet_bytes` into CAN frames and send each over `driver`.
/// `packet_bytes` must already be a finalized (checksummed) remote packet.
pub fn send<D: CanDriver>(driver: &mut D, packet_bytes: &[u8]) -> Result<(), ErrorCode> {
    let l = packet_bytes.len();
    let kind_id = packet_bytes[1];
    let origin = packet_bytes[3];
    let hw_filter_byte = !(1u8 << (kind_id % 7));
    let frame_count = l.div_ceil(8).max(1) as u8;

    for k in 0..frame_count {
        let idx = k as usize;
        let ext_id = (u32::from(kind_id) << 21)
            | (u32::from(origin) << 13)
            | (u32::from(hw_filter_byte) << 5)
            | (u32::from(k) & 0x1F);

        let mut frame = [0u8; 8];
        let dlc;
        if idx == 0 {
            frame[0] = l as u8;
            frame[1] = frame_count;
            let n = l.min(8).saturating_sub(2);
            frame[2..2 + n].copy_from_slice(&packet_bytes[2..2 + n]);
            dlc = 2 + n;
        } else {
            let start = idx * 8;
            let n = (l - start).min(8);
            frame[..n].copy_from_slice(&packet_bytes[start..start + n]);
            dlc = n;
        }

        if !driver.send(ext_id, &frame[..dlc], dlc as u8) {
            return Err(ErrorCode::CanSendFailed);
        }
    }
    Ok(())
}

/// Program the CAN hardware acceptance filter from a subscription filter
/// word (spec §4.4/§4.5: `id = mask = !filter_bits << 5`).
pub fn program_filter<D: CanDriver>(driver: &mut D, filter_bits: u8) {
    let word = u32::from(!filter_bits) << 5;
    driver.set_filter(word, word);
}

/// Multi-frame reassembly arena. One section per in-flight or completed
/// stream, keyed by `(kind_id, origin)`.
pub struct CanAdapter<'a> {
    arena: SectionBuf<'a>,
}

impl<'a> CanAdapter<'a> {
    pub fn new(arena: &'a mut [u8]) -> Self {
        Self { arena: SectionBuf::init(arena) }
    }

    fn find_stream(&self, kind_id: u8, origin: u8) -> Option<usize> {
        self.arena.iter().find(|&h| {
            let p = self.arena.payload(h);
            p[0] == kind_id && p[1] == origin
        })
    }

    /// Feed one received CAN frame into the reassembly state machine
    /// (ISR context). `data` is the frame payload, `dlc` its length.
    pub fn received(&mut self, ext_id: u32, data: &[u8], dlc: u8) {
        let kind_id = (ext_id >> 21) as u8;
        let origin = (ext_id >> 13) as u8;
        let frame_index = (ext_id & 0x1F) as u8;
        let dlc = dlc as usize;

        if frame_index == 0 {
            if let Some(old) = self.find_stream(kind_id, origin) {
                self.arena.free(old);
                emit(DiagEvent::Error(ErrorCode::DuplicateStream));
            }

            let l = data[0] as usize;
            let total = data[1];
            let handle = self.arena.alloc(META_LEN + l);
            let payload = self.arena.payload_mut(handle);
            payload[0] = kind_id;
            payload[1] = origin;
            payload[2] = 0;
            payload[3] = total;
            let pkt = &mut payload[META_LEN..];
            pkt[0] = l as u8;
            pkt[1] = kind_id;
            let n = dlc.saturating_sub(2).min(l.saturating_sub(2));
            pkt[2..2 + n].copy_from_slice(&data[2..2 + n]);
        } else {
            let Some(handle) = self.find_stream(kind_id, origin) else {
                return;
            };
            let payload = self.arena.payload_mut(handle);
            let next_expected = payload[2];
            if frame_index != next_expected + 1 {
                self.arena.free(handle);
                emit(DiagEvent::Error(ErrorCode::FrameMisorder));
                return;
            }
            let l = payload[META_LEN] as usize;
            let off = META_LEN + 8 * frame_index as usize;
            let n = dlc.min((META_LEN + l).saturating_sub(off));
            payload[off..off + n].copy_from_slice(&data[..n]);
            payload[2] = frame_index;
        }
    }

    /// Foreground poll: unlock/free the previously returned packet, then
    /// return the next completed, CRC-verified packet (if any), locking it
    /// so the allocator will not reuse its bytes before the next call.
    pub fn receive(&mut self) -> Option<Packet<'_>> {
        if let Some(prev) = self.arena.locked_handle() {
            self.arena.unlock();
            self.arena.free(prev);
        }

        let mut found = None;
        for handle in self.arena.iter() {
            let payload = self.arena.payload(handle);
            if payload[2] + 1 == payload[3] {
                found = Some(handle);
                break;
            }
        }
        let handle = found?;

        let verified = {
            let packet_bytes = &self.arena.payload(handle)[META_LEN..];
            let len = packet_bytes[0] as usize;
            len >= 1
                && len <= packet_bytes.len()
                && crc8_smbus(&packet_bytes[..len - 1]) == packet_bytes[len - 1]
        };

        if !verified {
            emit(DiagEvent::Error(ErrorCode::BadChecksum));
            self.arena.free(handle);
            return None;
        }

        self.arena.lock(handle);
        Packet::decode(&mut self.arena.payload_mut(handle)[META_LEN..]).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirebus_wire::Packet as WirePacket;

    #[test]
    fn s3_multi_frame_reassembly() {
        let mut packet_buf = [0u8; 32];
        let mut built = WirePacket::telemetry_remote(&mut packet_buf, 0x41, 0, 2, 9, 0).unwrap();
        // Pad entries so the packet is long enough to need 3 frames.
        {
            let mut entries = built.entries();
            let at = entries.append(*b"aa").unwrap();
            entries.set_bytes(at, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).unwrap();
        }
        built.finalize().unwrap();
        let bytes = built.as_bytes();
        let l = bytes.len();
        assert!(l > 16);
        let frame_count = l.div_ceil(8) as u8;

        let mut arena = [0u8; 128];
        let mut adapter = CanAdapter::new(&mut arena);

        let kind_id = bytes[1];
        let origin = 2u8;
        let hw_filter_byte = !(1u8 << (kind_id % 7));

        for k in 0..frame_count {
            let idx = k as usize;
            let ext_id = (u32::from(kind_id) << 21)
                | (u32::from(origin) << 13)
                | (u32::from(hw_filter_byte) << 5)
                | (u32::from(k) & 0x1F);
            let mut frame = [0u8; 8];
            let dlc;
            if idx == 0 {
                frame[0] = l as u8;
                frame[1] = frame_count;
                let n = l.min(8).saturating_sub(2);
                frame[2..2 + n].copy_from_slice(&bytes[2..2 + n]);
                dlc = 2 + n;
            } else {
                let start = idx * 8;
                let n = (l - start).min(8);
                frame[..n].copy_from_slice(&bytes[start..start + n]);
                dlc = n;
            }
            adapter.received(ext_id, &frame[..dlc], dlc as u8);
        }

        let received = adapter.receive().expect("completed packet");
        assert_eq!(received.kind_id(), kind_id);
        assert_eq!(received.origin_unit_id(), origin);
        assert!(received.verify());

        assert!(adapter.receive().is_none());
    }
}
