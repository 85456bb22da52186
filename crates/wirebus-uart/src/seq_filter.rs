//! The lightweight forward-progress test used at the link layer to decide
//! whether to re-forward a packet down the chain (spec §4.6 "Store-and-
//! forward": "unless the packet was already seen (per §4.4 sequence rule,
//! second-seen)"). This is the same `(s - last) & 0xFF < 128` test
//! `wirebus_core::NodeInfo` runs for dispatch, reimplemented here so a UART
//! repeater link can make its forward/drop decision without depending on
//! a full `BusCore`. Matches `NodeInfo::observe_seq` exactly, including
//! treating an exact repeat (`diff == 0`) as forward progress rather than
//! a replay — the spec's forward-progress test carves out no special case
//! for it.

use wirebus_hal::config::NODE_MAX;

pub struct SeqFilter {
    last_seq: [Option<u8>; NODE_MAX],
}

impl SeqFilter {
    pub const fn new() -> Self {
        Self { last_seq: [None; NODE_MAX] }
    }

    /// Record `seq` from `origin` and report whether it represents forward
    /// progress (`false`) or a replay/duplicate (`true`).
    pub fn already_seen(&mut self, origin: u8, seq: u8) -> bool {
        let slot = &mut self.last_seq[origin as usize % NODE_MAX];
        match *slot {
            None => {
                *slot = Some(seq);
                false
            }
            Some(last) => {
                let diff = seq.wrapping_sub(last);
                if diff >= 128 {
                    true
                } else {
                    *slot = Some(seq);
                    false
                }
            }
        }
    }
}

impl Default for SeqFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_progress_is_not_seen() {
        let mut f = SeqFilter::new();
        assert!(!f.already_seen(1, 0));
        assert!(!f.already_seen(1, 1));
        assert!(!f.already_seen(1, 2));
    }

    #[test]
    fn exact_repeat_is_forward_progress_not_a_replay() {
        // Matches NodeInfo::observe_seq: diff == 0 is not special-cased.
        let mut f = SeqFilter::new();
        assert!(!f.already_seen(1, 5));
        assert!(!f.already_seen(1, 5));
    }

    #[test]
    fn large_backward_jump_is_seen() {
        let mut f = SeqFilter::new();
        assert!(!f.already_seen(1, 200));
        assert!(f.already_seen(1, 50));
    }

    #[test]
    fn peers_are_independent() {
        let mut f = SeqFilter::new();
        assert!(!f.already_seen(1, 9));
        assert!(!f.already_seen(2, 9));
    }
}
