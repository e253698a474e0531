//! Streaming frame parser
//!
//! Bytes arrive from the UART in arbitrary chunks. The parser is a byte-at-a-
//! time state machine whose state survives between calls, so a frame split
//! across any number of reads is reassembled exactly as if it had arrived
//! in one piece.
//!
//! Every error drops the frame in progress and returns to [`ParsePhase::WaitSync`];
//! the next SYNC byte starts over. Nothing here is fatal.

use heapless::Vec;

use crate::crc::Crc8;
use crate::frame::{Frame, MAX_DATA_LEN};
use crate::message::{HeaderLayout, MsgType, SYNC_BYTE};

/// Reasons a frame in progress was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Message-type byte has a wrong version tag or unknown category
    UnsupportedMsgType(u8),
    /// LENGTH smaller than the header or larger than header + 255
    LengthOutOfRange(u16),
    /// CRC byte does not match the running checksum
    CrcMismatch { expected: u8, actual: u8 },
}

/// Externally visible parser position
///
/// Named after the last field received, so `GotSync` means the parser is
/// waiting for the message-type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParsePhase {
    WaitSync,
    GotSync,
    GotMsgType,
    GotLength,
    GotObjId,
    GotInstId,
    GotData,
}

/// Parser diagnostic counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParserStats {
    /// Bytes discarded while hunting for SYNC
    pub sync_discards: u32,
    /// Frames dropped for a bad message-type byte
    pub bad_msg_type: u32,
    /// Frames dropped for an out-of-range LENGTH
    pub bad_length: u32,
    /// Frames dropped for a CRC mismatch
    pub crc_errors: u32,
    /// Frames completed
    pub frames: u32,
}

/// Little-endian field being accumulated one byte at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Partial<const N: usize> {
    bytes: [u8; N],
    filled: usize,
}

enum Fill<const N: usize> {
    Pending(Partial<N>),
    Done([u8; N]),
}

impl<const N: usize> Partial<N> {
    const fn new() -> Self {
        Self {
            bytes: [0; N],
            filled: 0,
        }
    }

    fn push(mut self, byte: u8) -> Fill<N> {
        self.bytes[self.filled] = byte;
        self.filled += 1;
        if self.filled == N {
            Fill::Done(self.bytes)
        } else {
            Fill::Pending(self)
        }
    }
}

/// Header fields, all validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    msg_type: MsgType,
    length: u16,
    obj_id: u32,
    inst_id: u16,
}

/// Parser state
///
/// Each variant holds exactly what is known to be valid at that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Hunting for SYNC
    WaitSync,
    /// Got SYNC, waiting for MSGTYPE
    GotSync,
    /// Reading LENGTH
    GotMsgType { msg_type: MsgType, length: Partial<2> },
    /// Reading OBJID
    GotLength { msg_type: MsgType, length: u16, obj_id: Partial<4> },
    /// Reading INSTID (extended layout only)
    GotObjId { msg_type: MsgType, length: u16, obj_id: u32, inst_id: Partial<2> },
    /// Reading DATA
    GotInstId { header: Header },
    /// Waiting for CRC
    GotData { header: Header },
}

enum Transition {
    Next(ParseState),
    Complete(Frame),
    Drop(ParseError),
}

/// State machine for parsing incoming frames
#[derive(Debug, Clone)]
pub struct FrameParser {
    layout: HeaderLayout,
    state: ParseState,
    crc: Crc8,
    data: Vec<u8, MAX_DATA_LEN>,
    stats: ParserStats,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(HeaderLayout::default())
    }
}

impl FrameParser {
    /// Create a new frame parser for the given header layout
    pub fn new(layout: HeaderLayout) -> Self {
        Self {
            layout,
            state: ParseState::WaitSync,
            crc: Crc8::new(),
            data: Vec::new(),
            stats: ParserStats::default(),
        }
    }

    /// Header layout this parser was built for
    pub fn layout(&self) -> HeaderLayout {
        self.layout
    }

    /// Drop any frame in progress
    pub fn reset(&mut self) {
        self.state = ParseState::WaitSync;
        self.crc = Crc8::new();
        self.data.clear();
    }

    /// Current position in the frame
    pub fn phase(&self) -> ParsePhase {
        match self.state {
            ParseState::WaitSync => ParsePhase::WaitSync,
            ParseState::GotSync => ParsePhase::GotSync,
            ParseState::GotMsgType { .. } => ParsePhase::GotMsgType,
            ParseState::GotLength { .. } => ParsePhase::GotLength,
            ParseState::GotObjId { .. } => ParsePhase::GotObjId,
            ParseState::GotInstId { .. } => ParsePhase::GotInstId,
            ParseState::GotData { .. } => ParsePhase::GotData,
        }
    }

    /// Diagnostic counters
    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed (or a noise byte was skipped),
    /// or `Err` when the frame in progress was dropped. The parser is
    /// already resynchronising when an error is returned.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, ParseError> {
        let state = self.state;
        match self.transition(state, byte) {
            Transition::Next(next) => {
                self.state = next;
                Ok(None)
            }
            Transition::Complete(frame) => {
                self.stats.frames = self.stats.frames.wrapping_add(1);
                trace!(
                    "frame type={} obj={=u32:#x} len={}",
                    frame.msg_type,
                    frame.obj_id,
                    frame.data.len()
                );
                self.reset();
                Ok(Some(frame))
            }
            Transition::Drop(err) => {
                match err {
                    ParseError::UnsupportedMsgType(_) => {
                        self.stats.bad_msg_type = self.stats.bad_msg_type.wrapping_add(1)
                    }
                    ParseError::LengthOutOfRange(_) => {
                        self.stats.bad_length = self.stats.bad_length.wrapping_add(1)
                    }
                    ParseError::CrcMismatch { .. } => {
                        self.stats.crc_errors = self.stats.crc_errors.wrapping_add(1)
                    }
                }
                debug!("frame dropped: {}", err);
                self.reset();
                Err(err)
            }
        }
    }

    /// Iterate over every frame and error produced by `bytes`
    ///
    /// All bytes are consumed, even after a complete frame; state carries
    /// over to the next call.
    pub fn frames<'p, 'b>(&'p mut self, bytes: &'b [u8]) -> Frames<'p, 'b> {
        Frames {
            parser: self,
            bytes: bytes.iter(),
        }
    }

    fn transition(&mut self, state: ParseState, byte: u8) -> Transition {
        use ParseState::*;

        if !matches!(state, GotData { .. }) {
            self.crc = self.crc.update(byte);
        }

        match state {
            WaitSync => {
                if byte == SYNC_BYTE {
                    self.crc = Crc8::new().update(byte);
                    Transition::Next(GotSync)
                } else {
                    // Line noise or the tail of a dropped frame
                    self.stats.sync_discards = self.stats.sync_discards.wrapping_add(1);
                    self.crc = Crc8::new();
                    Transition::Next(WaitSync)
                }
            }
            GotSync => match MsgType::from_byte(byte) {
                Some(msg_type) => Transition::Next(GotMsgType {
                    msg_type,
                    length: Partial::new(),
                }),
                None => Transition::Drop(ParseError::UnsupportedMsgType(byte)),
            },
            GotMsgType { msg_type, length } => match length.push(byte) {
                Fill::Pending(length) => Transition::Next(GotMsgType { msg_type, length }),
                Fill::Done(bytes) => {
                    let length = u16::from_le_bytes(bytes);
                    let header_len = self.layout.header_len();
                    let len = length as usize;
                    if len < header_len || len > header_len + MAX_DATA_LEN {
                        return Transition::Drop(ParseError::LengthOutOfRange(length));
                    }
                    Transition::Next(GotLength {
                        msg_type,
                        length,
                        obj_id: Partial::new(),
                    })
                }
            },
            GotLength {
                msg_type,
                length,
                obj_id,
            } => match obj_id.push(byte) {
                Fill::Pending(obj_id) => Transition::Next(GotLength {
                    msg_type,
                    length,
                    obj_id,
                }),
                Fill::Done(bytes) => {
                    let obj_id = u32::from_le_bytes(bytes);
                    if self.layout.has_instance_id() {
                        Transition::Next(GotObjId {
                            msg_type,
                            length,
                            obj_id,
                            inst_id: Partial::new(),
                        })
                    } else {
                        Transition::Next(self.begin_data(Header {
                            msg_type,
                            length,
                            obj_id,
                            inst_id: 0,
                        }))
                    }
                }
            },
            GotObjId {
                msg_type,
                length,
                obj_id,
                inst_id,
            } => match inst_id.push(byte) {
                Fill::Pending(inst_id) => Transition::Next(GotObjId {
                    msg_type,
                    length,
                    obj_id,
                    inst_id,
                }),
                Fill::Done(bytes) => Transition::Next(self.begin_data(Header {
                    msg_type,
                    length,
                    obj_id,
                    inst_id: u16::from_le_bytes(bytes),
                })),
            },
            GotInstId { header } => {
                // Capacity is guaranteed by the LENGTH check
                let _ = self.data.push(byte);
                if self.data.len() == self.data_len(&header) {
                    Transition::Next(GotData { header })
                } else {
                    Transition::Next(GotInstId { header })
                }
            }
            GotData { header } => {
                let expected = self.crc.finalize();
                if byte != expected {
                    return Transition::Drop(ParseError::CrcMismatch {
                        expected,
                        actual: byte,
                    });
                }
                Transition::Complete(Frame {
                    msg_type: header.msg_type,
                    obj_id: header.obj_id,
                    inst_id: header.inst_id,
                    data: core::mem::take(&mut self.data),
                })
            }
        }
    }

    fn begin_data(&mut self, header: Header) -> ParseState {
        self.data.clear();
        if self.data_len(&header) == 0 {
            ParseState::GotData { header }
        } else {
            ParseState::GotInstId { header }
        }
    }

    fn data_len(&self, header: &Header) -> usize {
        header.length as usize - self.layout.header_len()
    }
}

/// Iterator returned by [`FrameParser::frames`]
pub struct Frames<'p, 'b> {
    parser: &'p mut FrameParser,
    bytes: core::slice::Iter<'b, u8>,
}

impl Iterator for Frames<'_, '_> {
    type Item = Result<Frame, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        for &byte in self.bytes.by_ref() {
            match self.parser.feed(byte) {
                Ok(Some(frame)) => return Some(Ok(frame)),
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MAX_FRAME_SIZE;

    fn encoded(frame: &Frame, layout: HeaderLayout) -> Vec<u8, MAX_FRAME_SIZE> {
        frame.encode_to_vec(layout).unwrap()
    }

    fn feed_all(parser: &mut FrameParser, bytes: &[u8]) -> Option<Frame> {
        let mut found = None;
        for &b in bytes {
            if let Ok(Some(frame)) = parser.feed(b) {
                found = Some(frame);
            }
        }
        found
    }

    #[test]
    fn test_parse_object_frame() {
        let frame = Frame::new(MsgType::Object, 0xD7E0_D964, 0, &[1, 2, 3, 4]).unwrap();
        let mut parser = FrameParser::new(HeaderLayout::Extended);

        let parsed = feed_all(&mut parser, &encoded(&frame, HeaderLayout::Extended)).unwrap();

        assert_eq!(parsed, frame);
        assert_eq!(parser.phase(), ParsePhase::WaitSync);
        assert_eq!(parser.stats().frames, 1);
    }

    #[test]
    fn test_parse_short_layout() {
        let frame = Frame::new(MsgType::ObjectAck, 0x1234_5678, 0, &[9, 8, 7]).unwrap();
        let mut parser = FrameParser::new(HeaderLayout::Short);

        let parsed = feed_all(&mut parser, &encoded(&frame, HeaderLayout::Short)).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_bodiless_frame() {
        let frame = Frame::empty(MsgType::Object, 0xD447_8084, 0);
        let bytes = encoded(&frame, HeaderLayout::Extended);
        assert_eq!(bytes.len(), 11);

        let mut parser = FrameParser::new(HeaderLayout::Extended);
        let parsed = feed_all(&mut parser, &bytes).unwrap();
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.obj_id, 0xD447_8084);
    }

    #[test]
    fn test_phases_follow_fields() {
        let frame = Frame::new(MsgType::Object, 1, 2, &[0xAA]).unwrap();
        let bytes = encoded(&frame, HeaderLayout::Extended);
        let mut parser = FrameParser::new(HeaderLayout::Extended);

        let expected = [
            ParsePhase::GotSync,
            ParsePhase::GotMsgType,
            ParsePhase::GotMsgType,
            ParsePhase::GotLength,
            ParsePhase::GotLength,
            ParsePhase::GotLength,
            ParsePhase::GotLength,
            ParsePhase::GotObjId,
            ParsePhase::GotObjId,
            ParsePhase::GotInstId,
            ParsePhase::GotData,
            ParsePhase::WaitSync,
        ];
        for (&b, &phase) in bytes.iter().zip(expected.iter()) {
            let _ = parser.feed(b);
            assert_eq!(parser.phase(), phase);
        }
    }

    #[test]
    fn test_noise_is_discarded() {
        let mut parser = FrameParser::new(HeaderLayout::Extended);
        for b in [0x00, 0xFF, 0x12, 0x34, 0x3B, 0x3D] {
            assert_eq!(parser.feed(b), Ok(None));
        }
        assert_eq!(parser.phase(), ParsePhase::WaitSync);
        assert_eq!(parser.stats().sync_discards, 6);
    }

    #[test]
    fn test_bad_msg_type_resyncs() {
        let mut parser = FrameParser::new(HeaderLayout::Extended);
        assert_eq!(parser.feed(SYNC_BYTE), Ok(None));
        assert_eq!(parser.feed(0x30), Err(ParseError::UnsupportedMsgType(0x30)));
        assert_eq!(parser.phase(), ParsePhase::WaitSync);
        assert_eq!(parser.stats().bad_msg_type, 1);
    }

    #[test]
    fn test_length_out_of_range() {
        let mut parser = FrameParser::new(HeaderLayout::Extended);
        // Shorter than the header
        for b in [SYNC_BYTE, 0x20, 9] {
            let _ = parser.feed(b);
        }
        assert_eq!(parser.feed(0), Err(ParseError::LengthOutOfRange(9)));

        // Longer than header + 255
        for b in [SYNC_BYTE, 0x20] {
            let _ = parser.feed(b);
        }
        let too_long = (10 + 256u16).to_le_bytes();
        let _ = parser.feed(too_long[0]);
        assert_eq!(parser.feed(too_long[1]), Err(ParseError::LengthOutOfRange(266)));
        assert_eq!(parser.stats().bad_length, 2);
    }

    #[test]
    fn test_invalid_crc() {
        let frame = Frame::new(MsgType::Object, 42, 0, &[1, 2]).unwrap();
        let mut bytes = encoded(&frame, HeaderLayout::Extended);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        let mut parser = FrameParser::new(HeaderLayout::Extended);
        let results: Vec<_, 4> = parser.frames(&bytes).collect();

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(ParseError::CrcMismatch { .. })));
        assert_eq!(parser.stats().crc_errors, 1);
    }

    #[test]
    fn test_frames_consumes_whole_chunk() {
        let a = encoded(&Frame::request(1, 0), HeaderLayout::Extended);
        let b = encoded(&Frame::request(2, 0), HeaderLayout::Extended);
        let mut chunk = Vec::<u8, 64>::new();
        chunk.extend_from_slice(&[0x00, 0x11]).unwrap();
        chunk.extend_from_slice(&a).unwrap();
        chunk.extend_from_slice(&b).unwrap();

        let mut parser = FrameParser::new(HeaderLayout::Extended);
        let ids: Vec<u32, 4> = parser
            .frames(&chunk)
            .filter_map(|r| r.ok())
            .map(|f| f.obj_id)
            .collect();
        assert_eq!(&ids[..], &[1, 2]);
    }

    #[test]
    fn test_split_across_calls() {
        let frame = Frame::new(MsgType::Object, 0xDED4_3774, 1, &[5; 30]).unwrap();
        let bytes = encoded(&frame, HeaderLayout::Extended);
        let mut parser = FrameParser::new(HeaderLayout::Extended);

        let (head, tail) = bytes.split_at(5);
        assert_eq!(parser.frames(head).count(), 0);
        assert_eq!(parser.phase(), ParsePhase::GotLength);
        let parsed: Vec<_, 2> = parser.frames(tail).collect();
        assert_eq!(parsed[0], Ok(frame));
    }

    #[test]
    fn test_sync_inside_data_is_not_resync() {
        // A SYNC-valued data byte must be treated as data
        let frame = Frame::new(MsgType::Object, 7, 0, &[SYNC_BYTE, 0x20, SYNC_BYTE]).unwrap();
        let mut parser = FrameParser::new(HeaderLayout::Extended);
        let parsed = feed_all(&mut parser, &encoded(&frame, HeaderLayout::Extended)).unwrap();
        assert_eq!(&parsed.data[..], &[SYNC_BYTE, 0x20, SYNC_BYTE]);
    }

    proptest::proptest! {
        #[test]
        fn test_every_outcome_starts_at_a_sync_byte(
            bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..600),
            short in proptest::prelude::any::<bool>(),
        ) {
            let layout = if short { HeaderLayout::Short } else { HeaderLayout::Extended };
            let mut parser = FrameParser::new(layout);
            let outcomes = parser.frames(&bytes).count();

            let stats = parser.stats();
            let syncs = bytes.iter().filter(|&&b| b == SYNC_BYTE).count();
            proptest::prop_assert!(outcomes <= syncs);
            proptest::prop_assert_eq!(
                (stats.frames + stats.bad_msg_type + stats.bad_length + stats.crc_errors) as usize,
                outcomes
            );
            proptest::prop_assert!(stats.sync_discards as usize <= bytes.len());
        }
    }
}
