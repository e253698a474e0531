//! Frame encoding for UAVTalk
//!
//! Frame format (little-endian):
//! - SYNC (1 byte): 0x3C
//! - MSGTYPE (1 byte): version tag | category
//! - LENGTH (2 bytes): header length + data length (CRC not included)
//! - OBJID (4 bytes): object type identifier
//! - INSTID (2 bytes): instance index, extended layout only
//! - DATA (0-255 bytes): object fields
//! - CRC (1 byte): CRC-8 over everything from SYNC through DATA

use heapless::Vec;

use crate::crc::Crc8;
use crate::message::{HeaderLayout, MsgType, SYNC_BYTE};

/// Maximum data size in bytes
pub const MAX_DATA_LEN: usize = 255;

/// Maximum complete frame size (extended header + data + CRC)
pub const MAX_FRAME_SIZE: usize = 10 + MAX_DATA_LEN + 1;

/// Errors that can occur while building or encoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Data exceeds 255 bytes
    DataTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Message category
    pub msg_type: MsgType,
    /// Object type identifier
    pub obj_id: u32,
    /// Instance index (always 0 with the short header layout)
    pub inst_id: u16,
    /// Object data
    pub data: Vec<u8, MAX_DATA_LEN>,
}

impl Frame {
    /// Create a frame carrying `data`
    pub fn new(msg_type: MsgType, obj_id: u32, inst_id: u16, data: &[u8]) -> Result<Self, FrameError> {
        let data = Vec::from_slice(data).map_err(|_| FrameError::DataTooLarge)?;
        Ok(Self {
            msg_type,
            obj_id,
            inst_id,
            data,
        })
    }

    /// Create a bodiless frame
    pub fn empty(msg_type: MsgType, obj_id: u32, inst_id: u16) -> Self {
        Self {
            msg_type,
            obj_id,
            inst_id,
            data: Vec::new(),
        }
    }

    /// Request the peer to send an object instance
    pub fn request(obj_id: u32, inst_id: u16) -> Self {
        Self::empty(MsgType::ObjectRequest, obj_id, inst_id)
    }

    /// Acknowledge an `ObjectAck` frame
    pub fn ack_for(frame: &Frame) -> Self {
        Self::empty(MsgType::Ack, frame.obj_id, frame.inst_id)
    }

    /// Refuse an `ObjectAck` or `ObjectRequest` frame
    pub fn nack_for(frame: &Frame) -> Self {
        Self::empty(MsgType::Nack, frame.obj_id, frame.inst_id)
    }

    /// Value of the LENGTH field for this frame
    pub fn length_field(&self, layout: HeaderLayout) -> u16 {
        (layout.header_len() + self.data.len()) as u16
    }

    /// Total number of bytes on the wire, CRC included
    pub fn wire_len(&self, layout: HeaderLayout) -> usize {
        layout.header_len() + self.data.len() + 1
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, layout: HeaderLayout, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.wire_len(layout);
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = SYNC_BYTE;
        buffer[1] = self.msg_type.to_byte();
        buffer[2..4].copy_from_slice(&self.length_field(layout).to_le_bytes());
        buffer[4..8].copy_from_slice(&self.obj_id.to_le_bytes());
        if layout.has_instance_id() {
            buffer[8..10].copy_from_slice(&self.inst_id.to_le_bytes());
        }

        let header_len = layout.header_len();
        let data_end = header_len + self.data.len();
        buffer[header_len..data_end].copy_from_slice(&self.data);
        buffer[data_end] = Crc8::new().update_slice(&buffer[..data_end]).finalize();

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self, layout: HeaderLayout) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(layout, &mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}
