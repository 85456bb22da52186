//! Pluggable diagnostics sink.
//!
//! The stack never prints or logs by itself — §1 of the spec lists
//! "printing/debug serial" as an external collaborator. Mirroring the
//! teacher's single-backend-function-pointer design
//! (`slopos_lib::klog::klog_register_backend`), implementers may register a
//! plain `fn(DiagEvent)` to observe dropped frames, conflicts and queue
//! pressure without this crate depending on `log`/`tracing` or an allocator.
//! The default sink is a no-op.

use core::sync::atomic::{AtomicPtr, Ordering};

use crate::error::ErrorCode;

/// An observable event a node's diagnostics sink may receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagEvent {
    /// `BusCore::error()` recorded this error code.
    Error(ErrorCode),
    /// A sanity bit transitioned.
    Sanity { bit: u8, insane: bool },
    /// The node-id conflict protocol reassigned `self_node`.
    NodeReassigned { from: u8, to: u8 },
}

type SinkFn = fn(DiagEvent);

fn noop_sink(_event: DiagEvent) {}

static SINK: AtomicPtr<()> = AtomicPtr::new(noop_sink as *mut ());

/// Register the process-wide diagnostics sink.
///
/// Mirrors `klog_register_backend`: a single global slot, last writer wins.
/// Safe to call repeatedly (e.g. once per driver init).
pub fn set_diag_sink(sink: SinkFn) {
    SINK.store(sink as *mut (), Ordering::Release);
}

/// Deliver an event to the currently registered sink.
pub fn emit(event: DiagEvent) {
    // SAFETY: the stored pointer is always a value previously cast from a
    // `SinkFn` by `set_diag_sink` (or the `noop_sink` initializer), so the
    // transmute-back below recovers a valid function pointer of the same type.
    let raw = SINK.load(Ordering::Acquire);
    let sink: SinkFn = unsafe { core::mem::transmute::<*mut (), SinkFn>(raw) };
    sink(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering as O};

    static SEEN: AtomicU32 = AtomicU32::new(0);

    fn counting_sink(_event: DiagEvent) {
        SEEN.fetch_add(1, O::Relaxed);
    }

    #[test]
    fn emit_reaches_registered_sink() {
        set_diag_sink(counting_sink);
        let before = SEEN.load(O::Relaxed);
        emit(DiagEvent::Error(ErrorCode::BadChecksum));
        assert_eq!(SEEN.load(O::Relaxed), before + 1);
        set_diag_sink(noop_sink);
    }
}
