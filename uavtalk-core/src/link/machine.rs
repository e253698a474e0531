//! Connection state machine
//!
//! The handshake is a function of the current state and the status the
//! flight controller reports. The machine only reacts; deciding when to
//! send our own stats is the monitor's job.

use super::events::{LinkEvent, PeerStatus};

/// Handshake progress as seen from our side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// No link; waiting for any stats frame
    #[default]
    Disconnected,
    /// Peer seen, we are asking for a handshake
    HandshakeRequested,
    /// Peer acknowledged, we confirm
    HandshakeAcknowledged,
    /// Both sides agree the link is up
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Status byte to put in our own stats frame
    ///
    /// `None` while disconnected: nothing is sent until the peer shows up.
    pub fn advertised_status(&self) -> Option<PeerStatus> {
        match self {
            ConnectionState::Disconnected => None,
            ConnectionState::HandshakeRequested => Some(PeerStatus::HandshakeReq),
            ConnectionState::HandshakeAcknowledged => Some(PeerStatus::Connected),
            ConnectionState::Connected => Some(PeerStatus::Connected),
        }
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LinkEvent) -> Self {
        use ConnectionState::*;
        use LinkEvent::*;

        match (self, event) {
            (_, Timeout) => Disconnected,

            (Disconnected, PeerStats(PeerStatus::Disconnected | PeerStatus::HandshakeReq)) => {
                HandshakeRequested
            }

            (HandshakeRequested, PeerStats(PeerStatus::HandshakeAck)) => HandshakeAcknowledged,

            (HandshakeAcknowledged, PeerStats(PeerStatus::Connected)) => Connected,

            // Peer restarted
            (HandshakeAcknowledged | Connected, PeerStats(PeerStatus::Disconnected)) => {
                HandshakeRequested
            }

            _ => self,
        }
    }
}
