//! RC car vehicle control library.
//!
//! Exposes the control core (command decoding, state transitions, obstacle
//! override, sound arbitration) for integration testing, plus the board
//! adapters the firmware binary wires together.  All ESP-IDF-specific code
//! is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod link;
pub mod obstacle;
pub mod pins;
pub mod scheduler;
pub mod sound;
pub mod vehicle;

// Board adapters and drivers; on the host they run against a simulation.
pub mod adapters;
pub mod drivers;
pub mod sensors;
