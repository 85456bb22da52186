//! Node identity, heartbeat, loss accounting, subscription filtering and
//! reception dispatch (spec §4.4 "BusCore").

#![no_std]

mod engine;
mod error;
mod filter;
mod node;
mod queue;

pub use engine::{BROADCAST_UNIT, BusCore, DispatchOutcome};
pub use error::CoreError;
pub use filter::Subscriptions;
pub use node::{NodeInfo, SeqOutcome};
pub use queue::PacketQueue;
