//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;

use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use uavtalk_core::config::{self, UavTalkConfig};
use uavtalk_core::{PeerStatus, Session};
use uavtalk_protocol::{Frame, FrameParser, HeaderLayout, MsgType};

pub const RELEASE_16_09: &str = include_str!("../../../config/release-16.09.toml");

pub const GPSTIME: u32 = 0xD447_8084;
pub const ATTITUDE: u32 = 0xD7E0_D964;

/// Receive side of a serial port, handing out at most `chunk` bytes per read
pub struct MockRx {
    pending: VecDeque<u8>,
    chunk: usize,
}

impl MockRx {
    pub fn new(chunk: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            chunk: chunk.max(1),
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes);
    }
}

impl ErrorType for MockRx {
    type Error = ErrorKind;
}

impl Read for MockRx {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
        let n = buf.len().min(self.chunk).min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl ReadReady for MockRx {
    fn read_ready(&mut self) -> Result<bool, ErrorKind> {
        Ok(!self.pending.is_empty())
    }
}

/// Transmit side of a serial port that records everything written
#[derive(Default)]
pub struct MockTx {
    pub written: Vec<u8>,
}

impl MockTx {
    /// Frames decoded from the recorded bytes
    pub fn frames(&self, layout: HeaderLayout) -> Vec<Frame> {
        let mut parser = FrameParser::new(layout);
        parser.frames(&self.written).filter_map(Result::ok).collect()
    }
}

impl ErrorType for MockTx {
    type Error = ErrorKind;
}

impl Write for MockTx {
    fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

pub fn release_config() -> UavTalkConfig {
    config::toml::parse(RELEASE_16_09).unwrap()
}

pub fn session_with(config: UavTalkConfig, chunk: usize) -> Session<MockRx, MockTx> {
    Session::new(config, MockRx::new(chunk), MockTx::default()).unwrap()
}

pub fn session(chunk: usize) -> Session<MockRx, MockTx> {
    session_with(release_config(), chunk)
}

pub fn encode(frame: &Frame) -> Vec<u8> {
    frame.encode_to_vec(HeaderLayout::Extended).unwrap().to_vec()
}

pub fn flight_stats(config: &UavTalkConfig, status: PeerStatus) -> Frame {
    let stats = config.link.flight_stats;
    let mut data = vec![0u8; stats.len as usize];
    data[stats.status_offset as usize] = status.to_byte();
    Frame::new(MsgType::Object, stats.obj_id, 0, &data).unwrap()
}
