//! Port traits: the hexagonal boundary between the control core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ VehicleService (domain)
//! ```
//!
//! Driven adapters (motor drivers, distance sensor, SD card, audio output,
//! clock, event sinks) implement these traits.  The
//! [`VehicleService`](super::service::VehicleService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::config::VehicleConfig;
use crate::error::{AudioError, SensorError, StorageError};
use crate::vehicle::{DriveDirection, DriveSide, Output};

// ───────────────────────────────────────────────────────────────
// Drive port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Pin-level actuation of the two drive sides and the light circuits.
pub trait DrivePort {
    /// Set the polarity of one drive side's H-bridge.
    fn set_drive_side(&mut self, side: DriveSide, direction: DriveDirection);

    /// Set the PWM duty on one drive side's enable line.
    fn set_drive_speed(&mut self, side: DriveSide, duty: u8);

    /// Switch a light circuit on or off.
    fn set_output(&mut self, output: Output, on: bool);

    /// Read back the level currently driven on a light circuit.
    fn read_output(&mut self, output: Output) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Distance sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw analog distance sampling.
pub trait DistanceSensorPort {
    /// Take one raw ADC reading (0 – full scale).
    fn sample_raw(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Audio ports (driven adapters: domain → SD card / DAC)
// ───────────────────────────────────────────────────────────────

/// Opens audio assets by path.
pub trait AssetStore {
    /// Byte stream handed to the [`PlaybackEngine`].
    type Stream;

    /// Whether the backing storage came up at boot.
    fn is_available(&self) -> bool;

    /// Open an asset for playback from its start.
    fn open(&mut self, path: &str) -> Result<Self::Stream, StorageError>;
}

/// A single-voice playback engine.
pub trait PlaybackEngine<S> {
    /// Start playing `stream` from its start, replacing anything running.
    fn begin(&mut self, stream: S) -> Result<(), AudioError>;

    /// Whether a stream is currently being played.
    fn is_running(&self) -> bool;

    /// Push the next chunk of the running stream to the output.
    /// Returns `false` once the stream has ended.
    fn pump(&mut self) -> bool;

    /// Stop playback immediately.
    fn stop(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Every timeout in the core is a
/// timestamp comparison against this clock.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads the vehicle configuration.
///
/// Implementations MUST validate what they load; invalid values are
/// reported with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Returns [`VehicleConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<VehicleConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config could not be parsed.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
