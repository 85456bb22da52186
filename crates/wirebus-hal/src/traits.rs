//! Required host primitives (spec §6).
//!
//! The stack never assumes a particular MCU, RTC, CAN peripheral or serial
//! driver — each is expressed as a small trait the application implements
//! once and passes in, the same way the teacher's driver layer is built
//! against narrow contracts (`CanDriver`-shaped callback registration in
//! `drivers::pci`/`drivers::virtio`) rather than reaching for a global
//! singleton.

/// A monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch; must never go backwards.
    fn now_millis(&self) -> u64;
}

/// A tiny one-byte-addressable persistent store.
///
/// Only address `0` (the `self_node` slot, §6) is used by this stack, but
/// the trait is not restricted to that in case a host wants to reuse the
/// same backing store for other single bytes.
pub trait Persistent {
    /// Read the byte at `addr`.
    fn read(&self, addr: u8) -> u8;
    /// Write `value` to `addr`.
    fn write(&mut self, addr: u8, value: u8);
}

/// A per-boot unique value source. Need not be cryptographically random.
pub trait RandomSource {
    /// Draw a fresh 32-bit value, used as `self_unique` in the node-id
    /// conflict protocol.
    fn random_unique(&mut self) -> u32;
}

/// The CAN peripheral driver contract.
pub trait CanDriver {
    /// One-time hardware bring-up.
    fn init(&mut self);
    /// Transmit one frame. Returns `false` on driver-level send failure
    /// (`BCS`, §4.4).
    fn send(&mut self, ext_id: u32, buf: &[u8], dlc: u8) -> bool;
    /// Program the 29-bit extended-ID hardware filter (§4.5).
    fn set_filter(&mut self, id: u32, mask: u32);
}

/// One logical UART/serial link (the *upper* or *lower* side of a chain).
pub trait UartLink {
    /// Pop one byte if the driver's receive FIFO has one ready.
    fn read_byte(&mut self) -> Option<u8>;
    /// Push bytes to the transmit FIFO (blocking or buffering is up to the
    /// implementer; the adapter never calls this from outside the main loop
    /// per §5's concurrency contract).
    fn write(&mut self, bytes: &[u8]);
}
