//! UAVTalk wire protocol
//!
//! This crate implements the framing layer of UAVTalk, the telemetry
//! protocol spoken by OpenPilot / LibrePilot flight controllers over a
//! serial link. It knows nothing about individual telemetry objects; it
//! only turns a byte stream into validated frames and back.
//!
//! # Frame Format
//!
//! ```text
//! ┌──────┬─────────┬────────┬───────┬────────┬─────────────┬─────┐
//! │ SYNC │ MSGTYPE │ LENGTH │ OBJID │ INSTID │ DATA        │ CRC │
//! │ 1B   │ 1B      │ 2B     │ 4B    │ 2B     │ 0–255B      │ 1B  │
//! └──────┴─────────┴────────┴───────┴────────┴─────────────┴─────┘
//! ```
//!
//! INSTID is only present with [`HeaderLayout::Extended`]. LENGTH counts the
//! header and the data but not the CRC. All multi-byte fields are
//! little-endian.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod crc;
pub mod frame;
pub mod message;
pub mod parser;

pub use crc::Crc8;
pub use frame::{Frame, FrameError, MAX_DATA_LEN, MAX_FRAME_SIZE};
pub use message::{HeaderLayout, MsgType, SYNC_BYTE};
pub use parser::{FrameParser, ParseError, ParsePhase, ParserStats};
