//! Errors produced while reading or mutating a [`crate::Packet`](crate::Packet).

/// Failure modes for packet/entry mutation (spec §3 "Lifecycle", §4.2
/// "Resize discipline").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// The mutation would grow the packet past its buffer capacity or past
    /// the 255-byte wire limit (`buf[0]` is a `u8`). The packet is left
    /// unchanged.
    InsufficientCapacity,
    /// Two bytes of entry header could not be written (capacity exhausted).
    HeaderWriteFailed,
    /// Struct nesting exceeded [`crate::entries::MAX_NESTING`].
    NestingTooDeep,
}
