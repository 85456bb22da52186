//! UART chain adapter: COBS+CRC8 framing, store-and-forward between the
//! two serial links a node sits between, and bounded send/receive queues
//! (spec §4.6 "UartAdapter").

#![no_std]

mod accumulator;
mod seq_filter;

use accumulator::{CobsAccumulator, RAW_CAP};
use seq_filter::SeqFilter;
use wirebus_codec::{cobs_decode, cobs_encode, crc8_smbus};
use wirebus_core::PacketQueue;
use wirebus_hal::config::{PACKET_LEN_MAX, RECEIVE_QUEUE_SIZE, SEND_QUEUE_SIZE};
use wirebus_hal::{DiagEvent, ErrorCode, UartLink, emit};
use wirebus_wire::Packet;

enum Port {
    Upper,
    Lower,
}

/// A node on a UART chain: two logical serial links, *upper* and *lower*,
/// connected by store-and-forward. A packet received on one link is
/// recorded, queued for the local application, and (unless it is a replay)
/// forwarded verbatim onto the other.
pub struct UartAdapter<const SEND: usize, const RECV: usize> {
    upper_acc: CobsAccumulator,
    lower_acc: CobsAccumulator,
    upper_tx: PacketQueue<SEND>,
    lower_tx: PacketQueue<SEND>,
    recv: PacketQueue<RECV>,
    seen: SeqFilter,
    decode_buf: [u8; PACKET_LEN_MAX],
}

/// A `UartAdapter` sized to the spec's default queue capacities.
pub type DefaultUartAdapter = UartAdapter<SEND_QUEUE_SIZE, RECEIVE_QUEUE_SIZE>;

impl<const SEND: usize, const RECV: usize> UartAdapter<SEND, RECV> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            upper_acc: CobsAccumulator::new(),
            lower_acc: CobsAccumulator::new(),
            upper_tx: PacketQueue::new(),
            lower_tx: PacketQueue::new(),
            recv: PacketQueue::new(),
            seen: SeqFilter::new(),
            decode_buf: [0; PACKET_LEN_MAX],
        }
    }

    /// Drain whatever bytes `link` has ready, feeding complete COBS frames
    /// from the *upper* port through the decode/dedup/forward pipeline.
    pub fn poll_upper<U: UartLink>(&mut self, link: &mut U) {
        while let Some(byte) = link.read_byte() {
            let mut frame_copy = [0u8; RAW_CAP];
            let mut frame_len = 0;
            let ready = if let Some(frame) = self.upper_acc.push(byte) {
                frame_len = frame.len();
                frame_copy[..frame_len].copy_from_slice(frame);
                true
            } else {
                false
            };
            if ready {
                self.handle_frame(Port::Upper, &frame_copy[..frame_len]);
            }
        }
    }

    /// Same as [`Self::poll_upper`] for the *lower* port.
    pub fn poll_lower<U: UartLink>(&mut self, link: &mut U) {
        while let Some(byte) = link.read_byte() {
            let mut frame_copy = [0u8; RAW_CAP];
            let mut frame_len = 0;
            let ready = if let Some(frame) = self.lower_acc.push(byte) {
                frame_len = frame.len();
                frame_copy[..frame_len].copy_from_slice(frame);
                true
            } else {
                false
            };
            if ready {
                self.handle_frame(Port::Lower, &frame_copy[..frame_len]);
            }
        }
    }

    fn handle_frame(&mut self, from: Port, frame: &[u8]) {
        let Some(n) = cobs_decode(frame, &mut self.decode_buf) else {
            self.error(ErrorCode::Overlength);
            return;
        };
        if n == 0 {
            return;
        }
        let l = self.decode_buf[0] as usize;
        if l == 0 || l != n {
            self.error(ErrorCode::Overlength);
            return;
        }
        if crc8_smbus(&self.decode_buf[..l - 1]) != self.decode_buf[l - 1] {
            self.error(ErrorCode::BadChecksum);
            return;
        }

        let (origin, seq) = match Packet::decode(&mut self.decode_buf[..l]) {
            Ok(pkt) => (pkt.origin_unit_id(), pkt.seq() as u8),
            Err(_) => {
                self.error(ErrorCode::NoData);
                return;
            }
        };

        if self.seen.already_seen(origin, seq) {
            return;
        }

        if !self.recv.push(&self.decode_buf[..l]) {
            self.error(ErrorCode::ReceiveDrop);
        }

        let forward_to = match from {
            Port::Upper => &mut self.lower_tx,
            Port::Lower => &mut self.upper_tx,
        };
        if !forward_to.push(&self.decode_buf[..l]) {
            self.error(ErrorCode::SendDrop);
        }
    }

    fn error(&self, code: ErrorCode) {
        emit(DiagEvent::Error(code));
    }

    /// Queue a locally originated packet for transmission on both links.
    pub fn broadcast(&mut self, packet_bytes: &[u8]) -> bool {
        let a = self.upper_tx.push(packet_bytes);
        if !a {
            self.error(ErrorCode::SendDrop);
        }
        let b = self.lower_tx.push(packet_bytes);
        if !b {
            self.error(ErrorCode::SendDrop);
        }
        a && b
    }

    /// Encode and write whatever is queued for the *upper* port.
    pub fn flush_upper<U: UartLink>(&mut self, link: &mut U) {
        Self::flush(&mut self.upper_tx, link);
    }

    /// Encode and write whatever is queued for the *lower* port.
    pub fn flush_lower<U: UartLink>(&mut self, link: &mut U) {
        Self::flush(&mut self.lower_tx, link);
    }

    fn flush<U: UartLink>(queue: &mut PacketQueue<SEND>, link: &mut U) {
        let mut raw = [0u8; PACKET_LEN_MAX];
        while let Some(n) = queue.pop(&mut raw) {
            let mut enc = [0u8; RAW_CAP];
            if let Some(m) = cobs_encode(&raw[..n], &mut enc) {
                link.write(&enc[..m]);
                link.write(&[0x00]);
            }
        }
    }

    /// Pop the oldest packet queued for the local application.
    pub fn poll_foreground(&mut self, out: &mut [u8]) -> Option<usize> {
        self.recv.pop(out)
    }
}

impl<const SEND: usize, const RECV: usize> Default for UartAdapter<SEND, RECV> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LoopbackLink {
        bytes: [u8; 512],
        read_pos: usize,
        len: usize,
    }

    impl LoopbackLink {
        fn from_bytes(bytes: &[u8]) -> Self {
            let mut buf = [0u8; 512];
            buf[..bytes.len()].copy_from_slice(bytes);
            Self { bytes: buf, read_pos: 0, len: bytes.len() }
        }

        fn empty() -> Self {
            Self { bytes: [0; 512], read_pos: 0, len: 0 }
        }
    }

    impl UartLink for LoopbackLink {
        fn read_byte(&mut self) -> Option<u8> {
            if self.read_pos < self.len {
                let b = self.bytes[self.read_pos];
                self.read_pos += 1;
                Some(b)
            } else {
                None
            }
        }

        fn write(&mut self, out: &[u8]) {
            for &b in out {
                if self.len < self.bytes.len() {
                    self.bytes[self.len] = b;
                    self.len += 1;
                }
            }
        }
    }

    fn framed(packet_bytes: &[u8]) -> FramedBytes {
        let mut enc = [0u8; 320];
        let n = cobs_encode(packet_bytes, &mut enc).unwrap();
        let mut out = [0u8; 321];
        out[..n].copy_from_slice(&enc[..n]);
        out[n] = 0x00;
        FramedBytes { bytes: out, len: n + 1 }
    }

    struct FramedBytes {
        bytes: [u8; 321],
        len: usize,
    }

    #[test]
    fn received_packet_forwards_to_opposite_port_and_local_queue() {
        let mut packet_buf = [0u8; 32];
        let mut pkt = Packet::telemetry_remote(&mut packet_buf, 0x50, 0, 2, 9, 3).unwrap();
        pkt.finalize().unwrap();
        let bytes = pkt.as_bytes();
        let frame = framed(bytes);

        let mut adapter: UartAdapter<64, 64> = UartAdapter::new();
        let mut upper = LoopbackLink::from_bytes(&frame.bytes[..frame.len]);
        adapter.poll_upper(&mut upper);

        let mut out = [0u8; 32];
        assert_eq!(adapter.poll_foreground(&mut out), Some(bytes.len()));
        assert_eq!(&out[..bytes.len()], bytes);

        let mut lower = LoopbackLink::empty();
        adapter.flush_lower(&mut lower);
        assert!(lower.len > 0);
    }

    #[test]
    fn replayed_sequence_is_not_forwarded_twice() {
        let mut first_buf = [0u8; 32];
        let mut first = Packet::telemetry_remote(&mut first_buf, 0x50, 0, 2, 9, 7).unwrap();
        first.finalize().unwrap();
        let first_frame = framed(first.as_bytes());

        let mut second_buf = [0u8; 32];
        let mut second = Packet::telemetry_remote(&mut second_buf, 0x50, 0, 2, 9, 8).unwrap();
        second.finalize().unwrap();
        let second_bytes_len = second.as_bytes().len();
        let second_frame = framed(second.as_bytes());

        let mut adapter: UartAdapter<64, 64> = UartAdapter::new();
        let mut upper = LoopbackLink::from_bytes(&first_frame.bytes[..first_frame.len]);
        adapter.poll_upper(&mut upper);
        let mut upper2 = LoopbackLink::from_bytes(&second_frame.bytes[..second_frame.len]);
        adapter.poll_upper(&mut upper2);
        // Replay of the first (now stale) sequence number.
        let mut upper_replay = LoopbackLink::from_bytes(&first_frame.bytes[..first_frame.len]);
        adapter.poll_upper(&mut upper_replay);

        let mut out = [0u8; 32];
        assert!(adapter.poll_foreground(&mut out).is_some());
        assert_eq!(adapter.poll_foreground(&mut out), Some(second_bytes_len));
        assert_eq!(adapter.poll_foreground(&mut out), None);
    }
}
