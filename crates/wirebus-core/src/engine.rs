//! Node identity, heartbeat, reception dispatch and telemetry summaries
//! (spec §4.4 "BusCore").

use wirebus_hal::config::{
    HEARTBEAT_FREQ, ID_ERROR_SUMMARY, ID_HEARTBEAT, ID_SANITY_SUMMARY, NODE_ID_PERSIST_ADDR, NODE_MAX,
};
use wirebus_hal::{Clock, DiagEvent, ErrorCode, Persistent, RandomSource, emit};
use wirebus_shared::SharedTable;
use wirebus_wire::Packet;

use crate::error::CoreError;
use crate::filter::Subscriptions;
use crate::node::{NodeInfo, SeqOutcome};
use crate::queue::PacketQueue;

/// `dest_unit_id` meaning "every node on the bus".
pub const BROADCAST_UNIT: u8 = 0xFF;

/// Entry-name convention for telemetry summaries: a node's single-byte
/// `name` folded into the 5-bit charset an entry name's first character
/// must live in (spec §3 "Name encoding"), open question not pinned by
/// spec.md — resolved here and recorded in DESIGN.md.
fn summary_entry_name(node_name: u8, second: u8) -> [u8; 2] {
    [0x40 | (node_name & 0x1F), second]
}

/// Outcome of feeding one packet through [`BusCore::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Dropped as a replay/out-of-order duplicate.
    Dropped,
    /// Consumed as a heartbeat; no further action needed.
    Heartbeat,
    /// Consumed by `SharedTable::update`.
    Shared,
    /// Pushed to the foreground receive queue.
    Foreground,
    /// Not listened to by anything; silently ignored.
    Unlistened,
}

/// Node identity, sequencing, heartbeat and dispatch (spec §4.4), generic
/// over the host primitives it needs (spec §6), the same way embedded
/// drivers in this stack are parameterized over their peripheral traits
/// rather than reaching for a global singleton (spec §9 "from process-wide
/// callback target to context-passing").
pub struct BusCore<C, P, R, const RXQ: usize> {
    clock: C,
    persistent: P,
    #[allow(dead_code)]
    random: R,
    self_node: u8,
    self_unique: u32,
    self_name: u8,
    self_seq: u16,
    nodes: [NodeInfo; NODE_MAX],
    sanity_bits: u16,
    error_count: u8,
    last_error: [u8; 3],
    subs: Subscriptions,
    rx_queue: PacketQueue<RXQ>,
}

impl<C: Clock, P: Persistent, R: RandomSource, const RXQ: usize> BusCore<C, P, R, RXQ> {
    /// Bring up node identity: read the persisted `self_node` slot and draw
    /// a fresh per-boot `self_unique` (spec §4.4 "Node identity").
    pub fn begin(clock: C, persistent: P, mut random: R, self_name: u8) -> Self {
        let self_node = persistent.read(NODE_ID_PERSIST_ADDR) % NODE_MAX as u8;
        let self_unique = random.random_unique();
        Self {
            clock,
            persistent,
            random,
            self_node,
            self_unique,
            self_name,
            self_seq: 0,
            nodes: [NodeInfo::new(); NODE_MAX],
            sanity_bits: 0,
            error_count: 0,
            last_error: [0; 3],
            subs: Subscriptions::new(),
            rx_queue: PacketQueue::new(),
        }
    }

    #[must_use]
    pub fn self_node(&self) -> u8 {
        self.self_node
    }

    #[must_use]
    pub fn self_unique(&self) -> u32 {
        self.self_unique
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_millis()
    }

    pub fn subscriptions(&mut self) -> &mut Subscriptions {
        &mut self.subs
    }

    pub fn node(&self, unit_id: u8) -> &NodeInfo {
        &self.nodes[unit_id as usize % NODE_MAX]
    }

    /// Milliseconds between heartbeat broadcasts.
    #[must_use]
    pub fn heartbeat_interval_ms() -> u64 {
        1000 / u64::from(HEARTBEAT_FREQ)
    }

    fn next_seq(&mut self) -> u16 {
        let s = self.self_seq;
        self.self_seq = self.self_seq.wrapping_add(1);
        s
    }

    pub fn error(&mut self, code: ErrorCode) {
        self.error_count = self.error_count.saturating_add(1);
        self.last_error = code.as_ascii();
        emit(DiagEvent::Error(code));
    }

    /// Clear or set sanity bit `bit` (set means *insane*, spec §4.4).
    pub fn sanity(&mut self, bit: u8, ok: bool) {
        let mask = 1u16 << (bit & 0x0F);
        if ok {
            self.sanity_bits &= !mask;
        } else {
            self.sanity_bits |= mask;
        }
        emit(DiagEvent::Sanity { bit, insane: !ok });
    }

    /// Build the 1 Hz heartbeat telemetry packet (spec §4.4 "Heartbeat").
    pub fn build_heartbeat<'b>(&mut self, buf: &'b mut [u8]) -> Result<Packet<'b>, CoreError> {
        let seq = self.next_seq();
        let mut pkt = Packet::telemetry_remote(
            buf,
            ID_HEARTBEAT,
            0,
            self.self_node,
            BROADCAST_UNIT,
            seq,
        )?;
        {
            let mut entries = pkt.entries();
            let un = entries.append(*b"un")?;
            entries.set_int(un, i64::from(self.self_unique))?;
            let nn = entries.append(*b"nn")?;
            entries.set_int(nn, i64::from(self.self_name))?;
            let sa = entries.append(*b"sa")?;
            entries.set_int(sa, i64::from(self.sanity_bits))?;
            let er = entries.append(*b"er")?;
            entries.set_int(er, i64::from(self.error_count))?;
            let cd = entries.append(*b"cd")?;
            entries.set_bytes(cd, &self.last_error)?;
        }
        pkt.finalize()?;
        Ok(pkt)
    }

    fn handle_heartbeat(&mut self, packet: &Packet<'_>) {
        let origin = packet.origin_unit_id();
        let view = packet.view();
        let sender_unique = view
            .find(*b"un", 0)
            .map_or(0, |at| view.get_int(at) as u32);
        let sender_name = view.find(*b"nn", 0).map_or(0, |at| view.get_int(at) as u8);
        let sender_sanity = view.find(*b"sa", 0).map_or(0, |at| view.get_int(at) as u16);
        let sender_errors = view.find(*b"er", 0).map_or(0, |at| view.get_int(at) as u8);
        let sender_code = view
            .find(*b"cd", 0)
            .map(|at| view.get_bytes(at))
            .map_or([0u8; 3], |b| {
                let mut code = [0u8; 3];
                let n = b.len().min(3);
                code[..n].copy_from_slice(&b[..n]);
                code
            });

        let node = &mut self.nodes[origin as usize % NODE_MAX];
        node.name = sender_name;
        node.sanity_bits = sender_sanity;
        node.error_count = sender_errors;
        node.error_code = sender_code;

        if sender_unique != self.self_unique && origin == self.self_node {
            if sender_unique >= self.self_unique {
                let old = self.self_node;
                self.self_node = (self.self_node + 1) % NODE_MAX as u8;
                self.persistent.write(NODE_ID_PERSIST_ADDR, self.self_node);
                self.nodes[old as usize % NODE_MAX] = NodeInfo::new();
                emit(DiagEvent::NodeReassigned { from: old, to: self.self_node });
            }
            self.error(ErrorCode::NodeConflict);
        }
    }

    /// Process one received, CRC-verified packet (spec §4.4 "Reception
    /// dispatch"). `shared` is consulted for listened-shared `kind_id`s.
    pub fn dispatch<const SN: usize>(
        &mut self,
        packet: &Packet<'_>,
        shared: &mut SharedTable<SN>,
    ) -> DispatchOutcome {
        let origin = packet.origin_unit_id();
        let now = self.clock.now_millis();
        let idx = origin as usize % NODE_MAX;

        if self.nodes[idx].observe_seq(packet.seq() as u8, now) == SeqOutcome::AlreadySeen {
            return DispatchOutcome::Dropped;
        }

        let kind_id = packet.kind_id();
        if packet.packet_id() == ID_HEARTBEAT {
            self.handle_heartbeat(packet);
            return DispatchOutcome::Heartbeat;
        }

        if self.subs.is_listening_shared(kind_id) {
            let node_name = self.nodes[idx].name;
            shared.update(packet, node_name, now);
            return DispatchOutcome::Shared;
        }

        if self.subs.is_listening(kind_id) {
            self.rx_queue.push(packet.as_bytes());
            return DispatchOutcome::Foreground;
        }

        DispatchOutcome::Unlistened
    }

    /// Pop the oldest queued foreground packet's bytes into `out`.
    pub fn poll_foreground(&mut self, out: &mut [u8]) -> Option<usize> {
        self.rx_queue.pop(out)
    }

    /// Build the error-summary telemetry packet (id `'!'`): one entry per
    /// alive peer plus self, carrying each node's `error_count`.
    pub fn build_error_summary<'b>(&mut self, buf: &'b mut [u8]) -> Result<Packet<'b>, CoreError> {
        let now = self.clock.now_millis();
        let seq = self.next_seq();
        let self_node = self.self_node;
        let self_name = self.self_name;
        let self_errors = self.error_count;
        let mut pkt =
            Packet::telemetry_remote(buf, ID_ERROR_SUMMARY, 0, self_node, BROADCAST_UNIT, seq)?;
        {
            let mut entries = pkt.entries();
            let at = entries.append(summary_entry_name(self_name, b'e'))?;
            entries.set_int(at, i64::from(self_errors))?;
            for node in self.nodes.iter().filter(|n| n.is_alive(now)) {
                let at = entries.append(summary_entry_name(node.name, b'e'))?;
                entries.set_int(at, i64::from(node.error_count))?;
            }
        }
        pkt.finalize()?;
        Ok(pkt)
    }

    /// Build the sanity-summary telemetry packet (id `'?'`): one entry per
    /// alive peer plus self, carrying each node's `sanity_bits`.
    pub fn build_sanity_summary<'b>(&mut self, buf: &'b mut [u8]) -> Result<Packet<'b>, CoreError> {
        let now = self.clock.now_millis();
        let seq = self.next_seq();
        let self_node = self.self_node;
        let self_name = self.self_name;
        let self_sanity = self.sanity_bits;
        let mut pkt =
            Packet::telemetry_remote(buf, ID_SANITY_SUMMARY, 0, self_node, BROADCAST_UNIT, seq)?;
        {
            let mut entries = pkt.entries();
            let at = entries.append(summary_entry_name(self_name, b's'))?;
            entries.set_int(at, i64::from(self_sanity))?;
            for node in self.nodes.iter().filter(|n| n.is_alive(now)) {
                let at = entries.append(summary_entry_name(node.name, b's'))?;
                entries.set_int(at, i64::from(node.sanity_bits))?;
            }
        }
        pkt.finalize()?;
        Ok(pkt)
    }
}
