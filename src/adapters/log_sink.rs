//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART on the car, stderr on the host).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as a one-line record.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | dir={:?} speed={} | accel={} rev={} horn={} | \
                     avoid={} override={} dist={} | sound={:?} | \
                     cmds={}/{} sensor_err={}",
                    t.direction,
                    t.speed_level,
                    t.accelerating,
                    t.reversing,
                    t.honking,
                    t.avoidance_enabled,
                    t.override_active,
                    t.last_distance_cm
                        .map_or_else(|| "-".to_string(), |cm| format!("{}cm", cm)),
                    t.playing,
                    t.commands_applied,
                    t.commands_dropped,
                    t.sensor_failures,
                );
            }
            AppEvent::Started => info!("START | outputs at power-on levels"),
            AppEvent::CommandApplied(cmd) => debug!("CMD   | {}", cmd),
            AppEvent::CommandDropped => debug!("CMD   | dropped"),
            AppEvent::ObstacleDetected { distance_cm } => {
                warn!("OBST  | {} cm, reversing", distance_cm)
            }
            AppEvent::OverrideReleased => info!("OBST  | released"),
            AppEvent::AvoidanceToggled(on) => {
                info!("OBST  | avoidance {}", if *on { "on" } else { "off" })
            }
            AppEvent::SoundStarted(asset) => debug!("SOUND | {:?}", asset),
            AppEvent::SoundStopped => debug!("SOUND | stopped"),
        }
    }
}
