//! Outbound application events.
//!
//! The [`VehicleService`](super::service::VehicleService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them; on the car they go to the
//! serial log.

use crate::app::commands::Command;
use crate::sound::Asset;
use crate::vehicle::Direction;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Outputs are at their power-on levels and the loop is about to run.
    Started,

    /// An operator command was decoded and applied.
    CommandApplied(Command),

    /// A payload did not decode and was discarded.
    CommandDropped,

    /// The obstacle monitor took control.
    ObstacleDetected { distance_cm: i32 },

    /// The reversing window elapsed; the operator is back in control.
    OverrideReleased,

    /// Obstacle avoidance switched on (`true`) or off.
    AvoidanceToggled(bool),

    /// A sound clip began playing.
    SoundStarted(Asset),

    /// Playback was halted because no sound condition is active.
    SoundStopped,

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub direction: Direction,
    pub speed_level: u32,
    pub accelerating: bool,
    pub reversing: bool,
    pub honking: bool,
    pub avoidance_enabled: bool,
    pub override_active: bool,
    pub last_distance_cm: Option<i32>,
    pub playing: Option<Asset>,
    pub commands_applied: u32,
    pub commands_dropped: u32,
    pub sensor_failures: u32,
}
