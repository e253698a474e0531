//! Connection handshake
//!
//! The flight controller only streams telemetry to a peer that completed
//! the stats handshake. The state machine is explicit, finite, and
//! deterministic; the monitor adds timing on top of it.

pub mod events;
pub mod machine;
pub mod monitor;

pub use events::{LinkEvent, PeerStatus};
pub use machine::ConnectionState;
pub use monitor::{ConnectionMonitor, Poll};
