//! Events that drive the connection state machine

/// Connection status carried in a telemetry-stats object
///
/// Both sides report their own view of the handshake in this byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PeerStatus {
    Disconnected = 0,
    HandshakeReq = 1,
    HandshakeAck = 2,
    Connected = 3,
}

impl PeerStatus {
    /// Decode a status byte; values above 3 are invalid
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(PeerStatus::Disconnected),
            1 => Some(PeerStatus::HandshakeReq),
            2 => Some(PeerStatus::HandshakeAck),
            3 => Some(PeerStatus::Connected),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Inputs to [`ConnectionState::transition`](super::ConnectionState::transition)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Flight controller reported its status
    PeerStats(PeerStatus),
    /// No stats frame within the connect timeout
    Timeout,
}
