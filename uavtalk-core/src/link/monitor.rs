//! Connection monitor
//!
//! Feeds received stats frames into the state machine, detects a stale
//! link and decides when our own stats frame is due. Time is the caller's
//! millisecond clock; wrap-around is handled with wrapping arithmetic.

use uavtalk_protocol::Frame;

use super::events::{LinkEvent, PeerStatus};
use super::machine::ConnectionState;
use crate::config::{LinkConfig, StatsObject};

/// Result of one [`ConnectionMonitor::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Poll {
    /// Stats went stale during this poll; the link was demoted
    pub timed_out: bool,
    /// Send a stats frame with this status now
    pub send_stats: Option<PeerStatus>,
}

/// Owns the connection state of one link
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    state: ConnectionState,
    passive: bool,
    timeout_ms: u32,
    period_ms: u32,
    flight_stats: StatsObject,
    /// Last accepted flight stats frame; cleared once it goes stale
    last_stats_ms: Option<u32>,
    /// Last frame of any kind
    last_activity_ms: Option<u32>,
    last_sent_ms: Option<u32>,
    /// State changed since the last stats frame went out
    send_due: bool,
    timeouts: u32,
}

impl ConnectionMonitor {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            passive: config.passive,
            timeout_ms: config.connect_timeout_ms,
            period_ms: config.stats_period_ms,
            flight_stats: config.flight_stats,
            last_stats_ms: None,
            last_activity_ms: None,
            last_sent_ms: None,
            send_due: false,
            timeouts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_passive(&self) -> bool {
        self.passive
    }

    /// Time of the last frame received, if any
    pub fn last_activity_ms(&self) -> Option<u32> {
        self.last_activity_ms
    }

    /// Number of stale-link demotions so far
    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    /// Account for a received frame
    ///
    /// Returns the new state if the frame was a flight stats update that
    /// moved the handshake along.
    pub fn on_frame(&mut self, frame: &Frame, now_ms: u32) -> Option<ConnectionState> {
        self.last_activity_ms = Some(now_ms);

        if frame.obj_id != self.flight_stats.obj_id || !frame.msg_type.carries_object() {
            return None;
        }

        let byte = *frame.data.get(self.flight_stats.status_offset as usize)?;
        let Some(status) = PeerStatus::from_byte(byte) else {
            debug!("flight stats: invalid status {=u8}", byte);
            return None;
        };

        self.last_stats_ms = Some(now_ms);
        self.apply(LinkEvent::PeerStats(status))
    }

    /// Check for a stale link and whether a stats frame is due
    pub fn poll(&mut self, now_ms: u32) -> Poll {
        let mut poll = Poll::default();

        if let Some(last) = self.last_stats_ms {
            if now_ms.wrapping_sub(last) > self.timeout_ms {
                warn!("no flight stats for {=u32} ms", now_ms.wrapping_sub(last));
                self.last_stats_ms = None;
                self.timeouts = self.timeouts.wrapping_add(1);
                self.apply(LinkEvent::Timeout);
                poll.timed_out = true;
            }
        }

        if self.passive {
            self.send_due = false;
            return poll;
        }

        let Some(status) = self.state.advertised_status() else {
            self.send_due = false;
            return poll;
        };

        let period_elapsed = self
            .last_sent_ms
            .map_or(true, |sent| now_ms.wrapping_sub(sent) >= self.period_ms);

        if self.send_due || period_elapsed {
            self.send_due = false;
            self.last_sent_ms = Some(now_ms);
            poll.send_stats = Some(status);
        }

        poll
    }

    fn apply(&mut self, event: LinkEvent) -> Option<ConnectionState> {
        let next = self.state.transition(event);
        if next == self.state {
            return None;
        }
        info!("link: {} -> {}", self.state, next);
        self.state = next;
        self.send_due = true;
        Some(next)
    }
}
