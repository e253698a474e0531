//! Link diagnostics
//!
//! Nothing on the receive path is fatal: every rejected byte or frame is
//! classified and counted here so an OSD page can show link health.

use uavtalk_protocol::{ParseError, ParserStats};

use crate::dispatch::DispatchError;

/// Recoverable faults observed on a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Byte discarded while waiting for SYNC
    SyncMismatch,
    /// Frame dropped for an unknown message type
    UnsupportedMsgType,
    /// Frame dropped for an impossible LENGTH
    LengthOutOfRange,
    /// Frame dropped for a bad checksum
    CrcMismatch,
    /// Valid frame for an object not in the descriptor table
    UnknownObjId,
    /// Object shorter than its descriptor
    TruncatedObject,
    /// Snapshot could not take another object instance
    SnapshotFull,
    /// Flight stats went stale
    HandshakeTimeout,
}

impl From<ParseError> for Fault {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnsupportedMsgType(_) => Fault::UnsupportedMsgType,
            ParseError::LengthOutOfRange(_) => Fault::LengthOutOfRange,
            ParseError::CrcMismatch { .. } => Fault::CrcMismatch,
        }
    }
}

impl From<DispatchError> for Fault {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UnknownObjId(_) => Fault::UnknownObjId,
            DispatchError::Truncated { .. } | DispatchError::FieldMismatch { .. } => {
                Fault::TruncatedObject
            }
            DispatchError::SnapshotFull(_) => Fault::SnapshotFull,
        }
    }
}

/// Fault and traffic counters for one link
///
/// All counters wrap on overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    pub unsupported_msg_type: u32,
    pub length_out_of_range: u32,
    pub crc_mismatch: u32,
    pub unknown_obj_id: u32,
    pub truncated_object: u32,
    pub snapshot_full: u32,
    pub handshake_timeouts: u32,
    /// Frames that passed the CRC check
    pub frames_received: u32,
    /// Objects published to the snapshot
    pub objects_published: u32,
    /// Frames handed to the transmitter
    pub tx_frames: u32,
    /// Frames the transmitter rejected or cut short
    pub tx_errors: u32,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `fault`
    ///
    /// Sync mismatches are counted by the parser itself, see
    /// [`ParserStats::sync_discards`].
    pub fn count(&mut self, fault: Fault) {
        let counter = match fault {
            Fault::SyncMismatch => return,
            Fault::UnsupportedMsgType => &mut self.unsupported_msg_type,
            Fault::LengthOutOfRange => &mut self.length_out_of_range,
            Fault::CrcMismatch => &mut self.crc_mismatch,
            Fault::UnknownObjId => &mut self.unknown_obj_id,
            Fault::TruncatedObject => &mut self.truncated_object,
            Fault::SnapshotFull => &mut self.snapshot_full,
            Fault::HandshakeTimeout => &mut self.handshake_timeouts,
        };
        *counter = counter.wrapping_add(1);
    }

    /// Total frames dropped after SYNC was found
    pub fn dropped_frames(&self) -> u32 {
        self.unsupported_msg_type
            .wrapping_add(self.length_out_of_range)
            .wrapping_add(self.crc_mismatch)
    }

    /// Number of times `fault` was seen
    pub fn occurrences(&self, fault: Fault, parser: &ParserStats) -> u32 {
        match fault {
            Fault::SyncMismatch => parser.sync_discards,
            Fault::UnsupportedMsgType => self.unsupported_msg_type,
            Fault::LengthOutOfRange => self.length_out_of_range,
            Fault::CrcMismatch => self.crc_mismatch,
            Fault::UnknownObjId => self.unknown_obj_id,
            Fault::TruncatedObject => self.truncated_object,
            Fault::SnapshotFull => self.snapshot_full,
            Fault::HandshakeTimeout => self.handshake_timeouts,
        }
    }
}
