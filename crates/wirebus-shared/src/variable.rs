//! A single replicated value mirrored from inbound packets (spec §3
//! "SharedVariable").

use wirebus_wire::{Entries, WireError};

/// Filter value meaning "accept any origin/node".
pub const ANY: u8 = 0xFF;

/// `timeout_ms` sentinel meaning "valid forever once updated".
pub const NEVER: u64 = u64::MAX;

/// One entry mirrored out of a class of inbound packets, keyed by
/// `(kind_id, entry_name, index)` and optionally restricted to a single
/// origin node.
#[derive(Debug, Clone, Copy)]
pub struct SharedVariable {
    pub kind_id: u8,
    pub entry_name: [u8; 2],
    pub index: u8,
    pub origin_filter: u8,
    pub node_name_filter: u8,
    value: u32,
    timeout_ms: u64,
    last_update_ms: u64,
}

impl SharedVariable {
    /// Declare a variable not yet populated by any packet.
    #[must_use]
    pub const fn new(
        kind_id: u8,
        entry_name: [u8; 2],
        index: u8,
        origin_filter: u8,
        node_name_filter: u8,
        timeout_ms: u64,
    ) -> Self {
        Self {
            kind_id,
            entry_name,
            index,
            origin_filter,
            node_name_filter,
            value: 0,
            timeout_ms,
            last_update_ms: 0,
        }
    }

    pub(crate) fn set_raw(&mut self, value: u32, now_ms: u64) {
        self.value = value;
        self.last_update_ms = now_ms;
    }

    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub fn as_i32(&self) -> i32 {
        self.value as i32
    }

    #[must_use]
    pub fn as_f32(&self) -> f32 {
        f32::from_bits(self.value)
    }

    /// `true` once a value has been stored and it has not timed out.
    #[must_use]
    pub fn is_valid(&self, now_ms: u64) -> bool {
        if self.last_update_ms == 0 {
            return false;
        }
        self.timeout_ms == NEVER || now_ms.wrapping_sub(self.last_update_ms) < self.timeout_ms
    }

    /// Milliseconds since the last update, or `None` if never updated.
    #[must_use]
    pub fn age_ms(&self, now_ms: u64) -> Option<u64> {
        if self.last_update_ms == 0 {
            None
        } else {
            Some(now_ms.wrapping_sub(self.last_update_ms))
        }
    }

    /// Append `name = value` to `entries` as a signed integer, but only if
    /// the variable currently holds a valid value — used to build the
    /// error/sanity summary telemetry (spec §4.4) without emitting stale
    /// entries for nodes that have dropped off the bus.
    pub fn append_if_valid(
        &self,
        entries: &mut Entries<'_, '_>,
        name: [u8; 2],
        now_ms: u64,
    ) -> Result<(), WireError> {
        if !self.is_valid(now_ms) {
            return Ok(());
        }
        let at = entries.append(name)?;
        entries.set_int(at, i64::from(self.as_i32()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_until_first_update() {
        let var = SharedVariable::new(0, *b"Px", 0, ANY, ANY, NEVER);
        assert!(!var.is_valid(1000));
        assert_eq!(var.age_ms(1000), None);
    }

    #[test]
    fn never_timeout_stays_valid() {
        let mut var = SharedVariable::new(0, *b"Px", 0, ANY, ANY, NEVER);
        var.set_raw(42, 1000);
        assert!(var.is_valid(1_000_000));
        assert_eq!(var.as_i32(), 42);
    }

    #[test]
    fn bounded_timeout_expires() {
        let mut var = SharedVariable::new(0, *b"Px", 0, ANY, ANY, 500);
        var.set_raw(7, 1000);
        assert!(var.is_valid(1400));
        assert!(!var.is_valid(1600));
    }

    #[test]
    fn float_bits_round_trip() {
        let mut var = SharedVariable::new(0, *b"Fz", 0, ANY, ANY, NEVER);
        var.set_raw(1.5f32.to_bits(), 10);
        assert_eq!(var.as_f32(), 1.5);
    }
}
