//! Board-agnostic UAVTalk telemetry link
//!
//! This crate contains everything above the framing layer that does not
//! depend on a specific board:
//!
//! - Release-specific configuration (descriptor tables, link settings)
//! - Object dispatch into a telemetry snapshot
//! - Connection handshake state machine and monitor
//! - The session that pumps a UART through all of the above
//! - Link diagnostics

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod link;
pub mod session;
pub mod telemetry;

pub use config::{ConfigError, UavTalkConfig};
pub use diagnostics::{Diagnostics, Fault};
pub use dispatch::{DispatchError, Dispatcher};
pub use link::{ConnectionMonitor, ConnectionState, LinkEvent, PeerStatus};
pub use session::{LinkStatus, ReadStatus, SendError, Session, Transmit};
pub use telemetry::{FieldValue, ObjectKey, TelemetrySnapshot};
