//! Message types and header layouts
//!
//! The message-type byte carries the protocol version tag in its upper
//! nibble and the message category in its lower nibble.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Frame synchronization byte
pub const SYNC_BYTE: u8 = 0x3C;

/// Version tag expected in the upper nibble of the message-type byte
pub const TYPE_VERSION: u8 = 0x20;

/// Bits of the message-type byte that must equal [`TYPE_VERSION`]
pub const TYPE_VERSION_MASK: u8 = 0xF0;

/// Message category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MsgType {
    /// Object update, no acknowledgement expected
    Object = TYPE_VERSION,
    /// Request for the peer to send an object
    ObjectRequest = TYPE_VERSION | 0x01,
    /// Object update that the receiver must acknowledge
    ObjectAck = TYPE_VERSION | 0x02,
    /// Acknowledgement of an `ObjectAck`
    Ack = TYPE_VERSION | 0x03,
    /// Negative acknowledgement (object unknown to the sender)
    Nack = TYPE_VERSION | 0x04,
}

impl MsgType {
    /// Parse a message-type byte
    ///
    /// Returns `None` if the version tag does not match or the category is
    /// not one of the five supported ones.
    pub fn from_byte(byte: u8) -> Option<Self> {
        if byte & TYPE_VERSION_MASK != TYPE_VERSION {
            return None;
        }
        match byte {
            0x20 => Some(MsgType::Object),
            0x21 => Some(MsgType::ObjectRequest),
            0x22 => Some(MsgType::ObjectAck),
            0x23 => Some(MsgType::Ack),
            0x24 => Some(MsgType::Nack),
            _ => None,
        }
    }

    /// Wire representation
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Whether frames of this type carry object data
    pub fn carries_object(&self) -> bool {
        matches!(self, MsgType::Object | MsgType::ObjectAck)
    }
}

/// Header layout, fixed per firmware release
///
/// Releases up to 13.06 use an 8-byte header without instance ID; later
/// releases add a 16-bit instance ID for a 10-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HeaderLayout {
    /// SYNC, MSGTYPE, LENGTH, OBJID
    Short,
    /// SYNC, MSGTYPE, LENGTH, OBJID, INSTID
    #[default]
    Extended,
}

impl HeaderLayout {
    /// Header length in bytes
    pub const fn header_len(self) -> usize {
        match self {
            HeaderLayout::Short => 8,
            HeaderLayout::Extended => 10,
        }
    }

    /// Whether the header carries an instance ID
    pub const fn has_instance_id(self) -> bool {
        matches!(self, HeaderLayout::Extended)
    }
}
