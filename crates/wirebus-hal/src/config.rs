//! Compile-time configuration constants shared across the bus stack.
//!
//! Mirrors how the teacher kernel keeps tunables as plain `pub const` items
//! next to the code that uses them (`slopos_lib::ports`, `drivers::net::pool`)
//! rather than behind a configuration crate or environment variables — there
//! is no OS underneath this stack to source either from.

/// Maximum number of distinct peer nodes tracked (`self_node` range is
/// `[0, NODE_MAX)`).
pub const NODE_MAX: usize = 32;

/// Heartbeat broadcast frequency, in Hz.
pub const HEARTBEAT_FREQ: u32 = 1;

/// A peer is considered alive if a heartbeat was seen within this many
/// milliseconds.
pub const HEARTBEAT_TIMEOUT_MS: u64 = 5000;

/// Maximum number of foreground (`listen`) and shared subscriptions.
pub const LISTENING_MAX: usize = 8;

/// Size, in bytes, of the CAN reassembly arena ([`SectionBuf`](wirebus_section)).
pub const CANBUS_BUFFER_SIZE: usize = 512;

/// Capacity, in bytes, of the UART send queue.
pub const SEND_QUEUE_SIZE: usize = 128;

/// Capacity, in bytes, of the UART receive queue.
pub const RECEIVE_QUEUE_SIZE: usize = 1024;

/// Width, in bits, of the legacy wide bus filter (retained for documentation;
/// the current design only uses the low 8 bits, see [`FILTER_BITS_WIDTH`]).
pub const BUS_FILTER_WIDTH: usize = 64;

/// Width, in bits, of the OR-reduced hardware filter word actually used.
pub const FILTER_BITS_WIDTH: u32 = 8;

/// Maximum total packet length in bytes (`buf[0]` is a `u8` size field).
pub const PACKET_LEN_MAX: usize = 256;

/// Packet id of the heartbeat telemetry packet.
pub const ID_HEARTBEAT: u8 = 0x7F;

/// Packet id of the error-summary telemetry packet (`'!'`).
pub const ID_ERROR_SUMMARY: u8 = b'!';

/// Packet id of the sanity-summary telemetry packet (`'?'`).
pub const ID_SANITY_SUMMARY: u8 = b'?';

/// Persistent-store address of the single persisted byte (`self_node`).
pub const NODE_ID_PERSIST_ADDR: u8 = 0;
