//! Shared host-boundary contract for the embedded inter-node bus stack.
//!
//! This crate carries no protocol logic of its own. It defines the traits
//! the concrete CAN/UART drivers, clock, persistent store and random source
//! must satisfy (spec §6), the compile-time configuration constants (§6's
//! "Configuration" table), the shared [`ErrorCode`](error::ErrorCode) type
//! (§4.4/§7), and an optional diagnostics sink (§1's "printing/debug
//! serial" external collaborator).

#![no_std]

pub mod config;
pub mod diag;
pub mod error;
pub mod traits;

pub use diag::{DiagEvent, emit, set_diag_sink};
pub use error::ErrorCode;
pub use traits::{CanDriver, Clock, Persistent, RandomSource, UartLink};
