//! Application service: the hexagonal core.
//!
//! [`VehicleService`] owns the single [`VehicleState`], the obstacle
//! monitor and the sound controller.  All I/O flows through port traits
//! injected at call sites, so the whole service is testable with mock
//! adapters.
//!
//! ```text
//!  payload ──▶ decode ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                         │      VehicleService       │
//!  DistanceSensorPort ──▶ │  transition · obstacle    │ ──▶ DrivePort
//!                         │  sound                    │ ──▶ PlaybackEngine
//!                         └──────────────────────────┘
//! ```

use log::{debug, info};

use crate::config::VehicleConfig;
use crate::obstacle::ObstacleMonitor;
use crate::sound::{Asset, SoundController, SoundEvent};
use crate::vehicle::{VehicleState, motion, transition};

use super::commands::{self, Command};
use super::events::{AppEvent, TelemetryData};
use super::ports::{AssetStore, DistanceSensorPort, DrivePort, EventSink, PlaybackEngine};

// ───────────────────────────────────────────────────────────────
// VehicleService
// ───────────────────────────────────────────────────────────────

pub struct VehicleService {
    config: VehicleConfig,
    state: VehicleState,
    obstacle: ObstacleMonitor,
    sound: SoundController,
    tick_count: u64,
    commands_applied: u32,
    commands_dropped: u32,
}

impl VehicleService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch the outputs; call [`start`](Self::start) next.
    pub fn new(config: VehicleConfig, storage_available: bool) -> Self {
        let state = VehicleState::new(config.default_speed);
        let obstacle = ObstacleMonitor::new(&config);
        let sound = SoundController::new(&config, storage_available);
        Self {
            config,
            state,
            obstacle,
            sound,
            tick_count: 0,
            commands_applied: 0,
            commands_dropped: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output to its power-on level.
    pub fn start(&mut self, hw: &mut impl DrivePort, sink: &mut impl EventSink) {
        motion::apply(&transition::power_on_plan(&self.config), hw);
        sink.emit(&AppEvent::Started);
        info!(
            "VehicleService started (speed {}, sound {})",
            self.state.speed_level,
            if self.sound.is_enabled() { "on" } else { "off" }
        );
    }

    // ── Command handling ──────────────────────────────────────

    /// Decode and apply one complete operator payload.
    ///
    /// Returns the command that was applied, or `None` if the payload was
    /// dropped.
    pub fn handle_payload(
        &mut self,
        payload: &[u8],
        hw: &mut impl DrivePort,
        sink: &mut impl EventSink,
    ) -> Option<Command> {
        match commands::decode(payload) {
            Some(cmd) => {
                self.handle_command(cmd, hw, sink);
                Some(cmd)
            }
            None => {
                self.commands_dropped = self.commands_dropped.saturating_add(1);
                debug!("dropped payload {:?}", String::from_utf8_lossy(payload));
                sink.emit(&AppEvent::CommandDropped);
                None
            }
        }
    }

    /// Apply one decoded command to completion.
    pub fn handle_command(
        &mut self,
        cmd: Command,
        hw: &mut impl DrivePort,
        sink: &mut impl EventSink,
    ) {
        debug!("{}", cmd);
        let was_enabled = self.state.obstacle_avoidance_enabled;

        let t = transition::apply(&self.state, &cmd);
        motion::apply(&t.plan, hw);
        self.state = t.state;
        self.commands_applied = self.commands_applied.saturating_add(1);

        sink.emit(&AppEvent::CommandApplied(cmd));
        if self.state.obstacle_avoidance_enabled != was_enabled {
            sink.emit(&AppEvent::AvoidanceToggled(
                self.state.obstacle_avoidance_enabled,
            ));
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one background pass at `now_ms`: sound arbitration, then the
    /// obstacle monitor.
    ///
    /// The `hw` parameter satisfies **both** [`DrivePort`] and
    /// [`DistanceSensorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick<S, P>(
        &mut self,
        now_ms: u64,
        hw: &mut (impl DrivePort + DistanceSensorPort),
        store: &mut S,
        player: &mut P,
        sink: &mut impl EventSink,
    ) where
        S: AssetStore,
        P: PlaybackEngine<S::Stream>,
    {
        self.tick_count += 1;

        match self.sound.tick(&self.state, store, player) {
            Some(SoundEvent::Started(asset)) => sink.emit(&AppEvent::SoundStarted(asset)),
            Some(SoundEvent::Stopped) => sink.emit(&AppEvent::SoundStopped),
            None => {}
        }

        let step = self.obstacle.tick(&mut self.state, now_ms, hw);
        motion::apply(&step.plan, hw);
        if let Some(distance_cm) = step.detected {
            sink.emit(&AppEvent::ObstacleDetected { distance_cm });
        }
        if step.released {
            sink.emit(&AppEvent::OverrideReleased);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current state and counters.
    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            direction: self.state.direction,
            speed_level: self.state.speed_level,
            accelerating: self.state.accelerating,
            reversing: self.state.reversing,
            honking: self.state.honking,
            avoidance_enabled: self.state.obstacle_avoidance_enabled,
            override_active: self.state.obstacle_override_active,
            last_distance_cm: self.obstacle.last_distance_cm(),
            playing: self.sound.playing(),
            commands_applied: self.commands_applied,
            commands_dropped: self.commands_dropped,
            sensor_failures: self.obstacle.failed_reads(),
        }
    }

    /// Clip currently playing, if any.
    pub fn playing(&self) -> Option<Asset> {
        self.sound.playing()
    }

    /// Current vehicle state.
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Live configuration.
    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    /// Background passes executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn commands_applied(&self) -> u32 {
        self.commands_applied
    }

    pub fn commands_dropped(&self) -> u32 {
        self.commands_dropped
    }
}
