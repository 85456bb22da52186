//! Two-level index-linked table of [`SharedVariable`]s (spec §4.3).
//!
//! The original is an intrusive linked list threaded through the variables
//! themselves (level 1: distinct `(kind_id, entry_name, index)` keys; level
//! 2: variables sharing a key, chained in insertion order). Re-expressed
//! here as an arena of fixed slots addressed by index (spec §9 design note)
//! rather than raw pointers, in the same spirit as the teacher's
//! [`wirebus_hal`]-adjacent `RingBuffer<T, const N: usize>` const-generic
//! capacity style.

use wirebus_wire::Packet;

use crate::variable::SharedVariable;

struct Slot {
    var: SharedVariable,
    next_same_key: Option<usize>,
    next_distinct_key: Option<usize>,
    used: bool,
}

impl Slot {
    const fn empty() -> Self {
        Self {
            var: SharedVariable::new(0, [0, 0], 0, 0, 0, 0),
            next_same_key: None,
            next_distinct_key: None,
            used: false,
        }
    }

    fn key_matches(&self, kind_id: u8, entry_name: [u8; 2], index: u8) -> bool {
        self.var.kind_id == kind_id && self.var.entry_name == entry_name && self.var.index == index
    }
}

/// A fixed-capacity table of shared variables, grouped by key for fast
/// dispatch on packet reception.
pub struct SharedTable<const N: usize> {
    slots: [Slot; N],
    first_key: Option<usize>,
}

impl<const N: usize> SharedTable<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: [const { Slot::empty() }; N], first_key: None }
    }

    fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| !s.used)
    }

    /// Register `var`, inserting it into the level-2 chain for its key if
    /// one already exists, otherwise starting a new level-1 node. Returns
    /// the slot index, or `None` if the table is full.
    pub fn add(&mut self, var: SharedVariable) -> Option<usize> {
        let free = self.free_slot()?;

        let mut key_head = self.first_key;
        while let Some(i) = key_head {
            if self.slots[i].key_matches(var.kind_id, var.entry_name, var.index) {
                let mut tail = i;
                while let Some(next) = self.slots[tail].next_same_key {
                    tail = next;
                }
                self.slots[free] = Slot { var, next_same_key: None, next_distinct_key: None, used: true };
                self.slots[tail].next_same_key = Some(free);
                return Some(free);
            }
            key_head = self.slots[i].next_distinct_key;
        }

        self.slots[free] =
            Slot { var, next_same_key: None, next_distinct_key: self.first_key, used: true };
        self.first_key = Some(free);
        Some(free)
    }

    /// Dispatch a received packet against every registered variable.
    ///
    /// Walks level 1 for a matching `kind_id`... wait, level 1 is keyed on
    /// the full `(kind_id, entry_name, index)` triple, so this walks every
    /// distinct key and lets [`SharedVariable::entry_name`]/`index` narrow
    /// within the bucket before testing origin filters.
    pub fn update(&mut self, packet: &Packet<'_>, origin_node_name: u8, now_ms: u64) {
        let kind_id = packet.kind_id();
        let origin = packet.origin_unit_id();
        let view = packet.view();

        let mut key_head = self.first_key;
        while let Some(head) = key_head {
            key_head = self.slots[head].next_distinct_key;

            if self.slots[head].var.kind_id != kind_id {
                continue;
            }
            let entry_name = self.slots[head].var.entry_name;
            let index = self.slots[head].var.index;
            let Some(at) = view.find(entry_name, index as usize) else {
                continue;
            };
            let raw = view.get_raw32(at);

            let mut member = Some(head);
            while let Some(i) = member {
                member = self.slots[i].next_same_key;
                let var = &self.slots[i].var;
                let origin_ok = var.origin_filter == crate::variable::ANY || var.origin_filter == origin;
                let node_ok =
                    var.node_name_filter == crate::variable::ANY || var.node_name_filter == origin_node_name;
                if origin_ok && node_ok {
                    self.slots[i].var.set_raw(raw, now_ms);
                }
            }
        }
    }

    /// Look up a registered variable by slot index (as returned by
    /// [`Self::add`]).
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&SharedVariable> {
        self.slots.get(slot).filter(|s| s.used).map(|s| &s.var)
    }
}

impl<const N: usize> Default for SharedTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{ANY, NEVER};

    #[test]
    fn s6_subscribe_then_update_then_stale_miss() {
        let mut table: SharedTable<4> = SharedTable::new();
        let slot = table
            .add(SharedVariable::new(b'T', *b"Px", 0, ANY, ANY, NEVER))
            .unwrap();

        let mut buf = [0u8; 64];
        let mut pkt = Packet::telemetry_remote(&mut buf, 5, 5, 7, 1, 0).unwrap();
        {
            let mut entries = pkt.entries();
            let py = entries.append(*b"Py").unwrap();
            entries.set_int(py, 1).unwrap();
            let px = entries.append(*b"Px").unwrap();
            entries.set_int(px, 42).unwrap();
        }

        table.update(&pkt, 3, 1000);
        let var = table.get(slot).unwrap();
        assert_eq!(var.as_i32(), 42);
        assert!(var.is_valid(1000));

        let mut buf2 = [0u8; 64];
        let mut pkt2 = Packet::telemetry_remote(&mut buf2, 5, 5, 7, 1, 0).unwrap();
        {
            let mut entries = pkt2.entries();
            let py = entries.append(*b"Py").unwrap();
            entries.set_int(py, 2).unwrap();
        }
        table.update(&pkt2, 3, 2000);
        let var = table.get(slot).unwrap();
        assert_eq!(var.as_i32(), 42);
    }

    #[test]
    fn origin_filter_rejects_other_nodes() {
        let mut table: SharedTable<4> = SharedTable::new();
        let slot = table.add(SharedVariable::new(b'T', *b"Px", 0, 7, ANY, NEVER)).unwrap();

        let mut buf = [0u8; 64];
        let mut pkt = Packet::telemetry_remote(&mut buf, 5, 5, 9, 1, 0).unwrap();
        let px = pkt.entries().append(*b"Px").unwrap();
        pkt.entries().set_int(px, 42).unwrap();

        table.update(&pkt, 0, 10);
        assert!(!table.get(slot).unwrap().is_valid(10));
    }

    #[test]
    fn two_variables_share_a_key_bucket() {
        let mut table: SharedTable<4> = SharedTable::new();
        let a = table.add(SharedVariable::new(b'T', *b"Px", 0, 1, ANY, NEVER)).unwrap();
        let b = table.add(SharedVariable::new(b'T', *b"Px", 0, 2, ANY, NEVER)).unwrap();

        let mut buf = [0u8; 64];
        let mut pkt = Packet::telemetry_remote(&mut buf, 5, 5, 2, 1, 0).unwrap();
        let px = pkt.entries().append(*b"Px").unwrap();
        pkt.entries().set_int(px, 5).unwrap();

        table.update(&pkt, 0, 10);
        assert_eq!(table.get(a).unwrap().as_i32(), 5);
        assert!(!table.get(b).unwrap().is_valid(10));
    }
}
