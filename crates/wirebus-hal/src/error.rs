//! The 3-byte ASCII error codes of spec §4.4/§7.
//!
//! Modeled as a typed enum rather than a raw `[u8; 3]`, following the
//! teacher's newtype-everything style (`drivers::net::types::NetError`)
//! instead of carrying bare byte arrays through the API.

/// One of the fixed set of bus error codes.
///
/// Every variant maps to exactly one 3-byte ASCII code recorded by
/// `BusCore::error()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Node-id conflict detected and resolved.
    NodeConflict,
    /// CRC-8 mismatch on a received packet.
    BadChecksum,
    /// No data left after a zero-length read.
    NoData,
    /// Packet or frame exceeded a length limit.
    Overlength,
    /// A send was dropped (queue full or over-length).
    SendDrop,
    /// A receive was dropped (queue full or over-length).
    ReceiveDrop,
    /// SectionBuf ring overflow (oldest section evicted).
    RingOverflow,
    /// Duplicate in-flight reassembly stream for the same `(kind, origin)`.
    DuplicateStream,
    /// Duplicate or unexpected frame index during reassembly.
    DuplicateFrame,
    /// Frame arrived out of order (misordered relative to `next_expected_idx`).
    FrameMisorder,
    /// The CAN driver reported a send failure.
    CanSendFailed,
}

impl ErrorCode {
    /// The literal 3-byte ASCII code, as specified in §4.4.
    #[must_use]
    pub const fn as_ascii(self) -> [u8; 3] {
        match self {
            Self::NodeConflict => *b"BCF",
            Self::BadChecksum => *b"BCR",
            Self::NoData => *b"BND",
            Self::Overlength => *b"BLN",
            Self::SendDrop => *b"BSD",
            Self::ReceiveDrop => *b"BRD",
            Self::RingOverflow => *b"BOF",
            Self::DuplicateStream => *b"BDS",
            Self::DuplicateFrame => *b"BDR",
            Self::FrameMisorder => *b"BDM",
            Self::CanSendFailed => *b"BCS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_codes_match_spec_table() {
        assert_eq!(ErrorCode::NodeConflict.as_ascii(), *b"BCF");
        assert_eq!(ErrorCode::BadChecksum.as_ascii(), *b"BCR");
        assert_eq!(ErrorCode::NoData.as_ascii(), *b"BND");
        assert_eq!(ErrorCode::Overlength.as_ascii(), *b"BLN");
        assert_eq!(ErrorCode::SendDrop.as_ascii(), *b"BSD");
        assert_eq!(ErrorCode::ReceiveDrop.as_ascii(), *b"BRD");
        assert_eq!(ErrorCode::RingOverflow.as_ascii(), *b"BOF");
        assert_eq!(ErrorCode::DuplicateStream.as_ascii(), *b"BDS");
        assert_eq!(ErrorCode::DuplicateFrame.as_ascii(), *b"BDR");
        assert_eq!(ErrorCode::FrameMisorder.as_ascii(), *b"BDM");
        assert_eq!(ErrorCode::CanSendFailed.as_ascii(), *b"BCS");
    }
}
