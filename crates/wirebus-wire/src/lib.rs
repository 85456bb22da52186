//! The self-describing packet wire format (spec §3, §4.2 "PacketCodec").
//!
//! A [`Packet`] borrows a caller-owned byte buffer and exposes a tree of
//! named, typed [`entries`] — integers, floats, bytes, nested structs, and
//! whole sub-packets — encoded with no schema beyond the bytes themselves.
//! [`wirebus_codec`] supplies the CRC-8 checksum and the COBS framing used
//! to put these bytes on a wire; this crate only knows about the packet's
//! own in-memory shape.

#![no_std]

pub mod entries;
pub mod entry_type;
pub mod error;
mod float16;
pub mod packet;
mod raw;
pub mod view;

pub use entries::{Entries, FloatWidth};
pub use entry_type::EntryType;
pub use error::WireError;
pub use packet::Packet;
pub use view::EntriesView;
