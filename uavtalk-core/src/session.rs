//! Telemetry session
//!
//! One session per link: it pumps received bytes through the frame parser,
//! hands complete frames to the dispatcher and the connection monitor, and
//! writes replies and stats frames back to the transport.
//!
//! # Usage
//!
//! ```ignore
//! let mut session = Session::new(config, rx, tx)?;
//! loop {
//!     match session.read(clock.now_ms()) {
//!         Ok(ReadStatus::Dispatched) => osd.refresh(session.snapshot()),
//!         Ok(_) => {}
//!         Err(e) => log_uart_error(e),
//!     }
//! }
//! ```

use uavtalk_hal::{UartRx, UartTx};
use uavtalk_protocol::{
    Frame, FrameError, FrameParser, HeaderLayout, MsgType, ParsePhase, ParserStats,
    MAX_DATA_LEN, MAX_FRAME_SIZE,
};

use crate::config::{ConfigError, StatsObject, UavTalkConfig};
use crate::diagnostics::{Diagnostics, Fault};
use crate::dispatch::Dispatcher;
use crate::link::{ConnectionMonitor, ConnectionState, PeerStatus};
use crate::telemetry::{FieldValue, ObjectKey, TelemetrySnapshot};

/// Bytes pulled from the transport per read call
pub const RX_BUF_SIZE: usize = 64;

/// Outcome of one [`Session::read`] or [`Session::feed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadStatus {
    /// Nothing pending, parser waiting for SYNC
    Idle,
    /// A frame is partially received
    InProgress,
    /// At least one frame passed the CRC check
    Dispatched,
    /// Frames were dropped and none completed
    Dropped,
}

/// Whether an outbound frame went out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transmit {
    Sent,
    /// Passive mode; nothing written
    Suppressed,
}

/// Outbound frame failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError<E> {
    /// Frame could not be encoded
    Frame(FrameError),
    /// Transport error
    Uart(E),
    /// Transport stopped accepting bytes mid-frame
    Incomplete { written: usize, len: usize },
}

/// Read-only view of a link for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStatus {
    pub parser: ParsePhase,
    pub parser_stats: ParserStats,
    pub connection: ConnectionState,
    pub passive: bool,
    pub last_activity_ms: Option<u32>,
    pub diagnostics: Diagnostics,
}

#[derive(Default)]
struct Outcome {
    dispatched: bool,
    dropped: bool,
}

impl Outcome {
    fn status(&self, phase: ParsePhase) -> ReadStatus {
        if self.dispatched {
            ReadStatus::Dispatched
        } else if self.dropped {
            ReadStatus::Dropped
        } else if phase == ParsePhase::WaitSync {
            ReadStatus::Idle
        } else {
            ReadStatus::InProgress
        }
    }
}

/// A UAVTalk link over one UART
pub struct Session<R, T> {
    rx: R,
    tx: T,
    layout: HeaderLayout,
    parser: FrameParser,
    dispatcher: Dispatcher,
    snapshot: TelemetrySnapshot,
    monitor: ConnectionMonitor,
    flight_stats: StatsObject,
    gcs_stats: StatsObject,
    diagnostics: Diagnostics,
}

impl<R: UartRx, T: UartTx> Session<R, T> {
    /// Create a session from a configuration
    pub fn new(config: UavTalkConfig, rx: R, tx: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let link = config.link;
        info!(
            "session: {} header, {} objects, passive {}",
            link.header,
            config.objects.len(),
            link.passive
        );

        Ok(Self {
            rx,
            tx,
            layout: link.header,
            parser: FrameParser::new(link.header),
            dispatcher: Dispatcher::new(config.objects),
            snapshot: TelemetrySnapshot::new(),
            monitor: ConnectionMonitor::new(&link),
            flight_stats: link.flight_stats,
            gcs_stats: link.gcs_stats,
            diagnostics: Diagnostics::new(),
        })
    }

    /// Pump everything the transport holds, then run link housekeeping
    ///
    /// Housekeeping (timeouts, stats frames) runs even if the transport
    /// reported an error part way through.
    pub fn read(&mut self, now_ms: u32) -> Result<ReadStatus, R::Error> {
        let mut outcome = Outcome::default();
        let received = self.drain(now_ms, &mut outcome);
        self.service(now_ms);
        received?;
        Ok(outcome.status(self.parser.phase()))
    }

    /// Same as [`read`](Self::read) for bytes obtained elsewhere
    pub fn feed(&mut self, bytes: &[u8], now_ms: u32) -> ReadStatus {
        let mut outcome = Outcome::default();
        self.process(bytes, now_ms, &mut outcome);
        self.service(now_ms);
        outcome.status(self.parser.phase())
    }

    /// Current parser and connection state
    pub fn state(&self) -> LinkStatus {
        LinkStatus {
            parser: self.parser.phase(),
            parser_stats: self.parser.stats(),
            connection: self.monitor.state(),
            passive: self.monitor.is_passive(),
            last_activity_ms: self.monitor.last_activity_ms(),
            diagnostics: self.diagnostics,
        }
    }

    /// Ask the flight controller to send an object instance
    pub fn request_object(
        &mut self,
        obj_id: u32,
        inst_id: u16,
    ) -> Result<Transmit, SendError<T::Error>> {
        self.transmit(&Frame::request(obj_id, inst_id))
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Latest value of a named field of instance 0 of a named object
    pub fn value(&self, object: &str, field: &str) -> Option<FieldValue> {
        let descriptor = self.dispatcher.table().by_name(object)?;
        let index = descriptor.field_index(field)?;
        let key = ObjectKey {
            obj_id: descriptor.obj_id,
            inst_id: 0,
        };
        self.snapshot.get(key)?.values.get(index).copied()
    }

    pub fn rx_mut(&mut self) -> &mut R {
        &mut self.rx
    }

    pub fn tx(&self) -> &T {
        &self.tx
    }

    pub fn into_parts(self) -> (R, T) {
        (self.rx, self.tx)
    }

    fn drain(&mut self, now_ms: u32, outcome: &mut Outcome) -> Result<(), R::Error> {
        let mut buf = [0u8; RX_BUF_SIZE];
        loop {
            let n = self.rx.read_available(&mut buf)?;
            if n == 0 {
                return Ok(());
            }
            trace!("rx {=usize} bytes", n);
            self.process(&buf[..n], now_ms, outcome);
        }
    }

    fn process(&mut self, bytes: &[u8], now_ms: u32, outcome: &mut Outcome) {
        for &byte in bytes {
            match self.parser.feed(byte) {
                Ok(Some(frame)) => {
                    outcome.dispatched = true;
                    self.handle_frame(&frame, now_ms);
                }
                Ok(None) => {}
                Err(err) => {
                    outcome.dropped = true;
                    self.diagnostics.count(Fault::from(err));
                }
            }
        }
    }

    fn handle_frame(&mut self, frame: &Frame, now_ms: u32) {
        self.diagnostics.frames_received = self.diagnostics.frames_received.wrapping_add(1);

        let stats_only = frame.obj_id == self.flight_stats.obj_id
            && self.dispatcher.table().get(frame.obj_id).is_none();

        let accepted = stats_only
            || match self.dispatcher.dispatch(frame, &mut self.snapshot, now_ms) {
                Ok(Some(_)) => {
                    self.diagnostics.objects_published =
                        self.diagnostics.objects_published.wrapping_add(1);
                    true
                }
                Ok(None) => true,
                Err(err) => {
                    debug!("object {=u32:#x} dropped: {}", frame.obj_id, err);
                    self.diagnostics.count(Fault::from(err));
                    false
                }
            };

        self.monitor.on_frame(frame, now_ms);

        match frame.msg_type {
            MsgType::ObjectAck if accepted => {
                let _ = self.transmit(&Frame::ack_for(frame));
            }
            // Nothing is served from this side
            MsgType::ObjectAck | MsgType::ObjectRequest => {
                let _ = self.transmit(&Frame::nack_for(frame));
            }
            _ => {}
        }
    }

    fn service(&mut self, now_ms: u32) {
        let poll = self.monitor.poll(now_ms);
        if poll.timed_out {
            self.diagnostics.count(Fault::HandshakeTimeout);
        }
        if let Some(status) = poll.send_stats {
            match self.stats_frame(status) {
                Ok(frame) => {
                    let _ = self.transmit(&frame);
                }
                Err(_) => self.tx_failed(self.gcs_stats.obj_id),
            }
        }
    }

    /// Our stats object: zero-filled with the status byte set
    fn stats_frame(&self, status: PeerStatus) -> Result<Frame, FrameError> {
        let mut data = [0u8; MAX_DATA_LEN];
        let len = self.gcs_stats.len as usize;
        data[self.gcs_stats.status_offset as usize] = status.to_byte();
        Frame::new(MsgType::ObjectAck, self.gcs_stats.obj_id, 0, &data[..len])
    }

    fn transmit(&mut self, frame: &Frame) -> Result<Transmit, SendError<T::Error>> {
        if self.monitor.is_passive() {
            return Ok(Transmit::Suppressed);
        }
        let result = self.send(frame);
        match result {
            Ok(_) => {
                self.diagnostics.tx_frames = self.diagnostics.tx_frames.wrapping_add(1);
            }
            Err(_) => self.tx_failed(frame.obj_id),
        }
        result
    }

    fn send(&mut self, frame: &Frame) -> Result<Transmit, SendError<T::Error>> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = frame
            .encode(self.layout, &mut buf)
            .map_err(SendError::Frame)?;
        let written = self.tx.write_bytes(&buf[..len]).map_err(SendError::Uart)?;
        if written < len {
            return Err(SendError::Incomplete { written, len });
        }
        self.tx.flush().map_err(SendError::Uart)?;
        trace!("tx {} obj {=u32:#x}", frame.msg_type, frame.obj_id);
        Ok(Transmit::Sent)
    }

    fn tx_failed(&mut self, obj_id: u32) {
        warn!("tx failed for obj {=u32:#x}", obj_id);
        self.diagnostics.tx_errors = self.diagnostics.tx_errors.wrapping_add(1);
    }
}
