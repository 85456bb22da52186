//! Errors produced while building or dispatching through [`crate::BusCore`].

use wirebus_wire::WireError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// Building or mutating a packet failed (capacity, nesting).
    Wire(WireError),
}

impl From<WireError> for CoreError {
    fn from(e: WireError) -> Self {
        Self::Wire(e)
    }
}
