//! COBS framing and CRC-8-SMBUS — the two pure, stateless primitives spec
//! §6 lists as external collaborators. Since neither depends on any
//! hardware or timing behavior, they are implemented here as plain
//! `#![no_std]` functions rather than trait methods on [`wirebus_hal`],
//! matching how the teacher keeps pure byte-math (`ipv4_header_checksum`)
//! as free functions rather than behind a driver trait.

#![no_std]

pub mod cobs;
pub mod crc8;

pub use cobs::{cobs_decode, cobs_encode};
pub use crc8::crc8_smbus;
