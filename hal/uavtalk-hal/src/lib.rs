//! UAVTalk Hardware Abstraction Layer
//!
//! The telemetry core never owns a UART. It talks to the serial port through
//! the two traits in this crate, which any `embedded-io` driver satisfies
//! automatically:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  uavtalk-core (Session)                 │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  uavtalk-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  embedded-io UART driver (any chip)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartRx`] - non-blocking "give me what you have" reads
//! - [`uart::UartTx`] - frame writes

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod uart;

pub use uart::{Uart, UartRx, UartTx};
