//! Obstacle avoidance monitor.
//!
//! Samples the infrared distance sensor on a fixed period while the
//! feature is enabled.  A reading at or below the threshold seizes
//! control: the car stops, reverses, and hands control back after the
//! reversing window.  A fresh detection inside the window restarts it.
//!
//! All timing is a monotonic timestamp comparison; nothing here sleeps.

use log::{debug, warn};

use crate::app::ports::DistanceSensorPort;
use crate::config::VehicleConfig;
use crate::error::SensorError;
use crate::vehicle::transition::{engage_override, release_override};
use crate::vehicle::{ActuationPlan, VehicleState};

/// Analog curve of the Sharp-style IR rangefinder.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub reference_volts: f32,
    pub full_scale: u16,
    pub coefficient: f32,
    pub exponent: f32,
}

impl Calibration {
    pub fn from_config(config: &VehicleConfig) -> Self {
        Self {
            reference_volts: config.adc_reference_volts,
            full_scale: config.adc_full_scale,
            coefficient: config.distance_coefficient,
            exponent: config.distance_exponent,
        }
    }

    /// Convert a raw ADC reading to whole centimetres.
    ///
    /// The curve diverges at 0 V; `as` saturates, so a zero reading comes
    /// out as `i32::MAX` ("nothing in range").
    pub fn distance_cm(&self, raw: u16) -> i32 {
        let volts = f32::from(raw) * self.reference_volts / f32::from(self.full_scale);
        let cm = self.coefficient * volts.powf(self.exponent);
        if cm.is_nan() { i32::MAX } else { cm as i32 }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::from_config(&VehicleConfig::default())
    }
}

/// What one monitor tick did.
#[derive(Debug, Default)]
pub struct ObstacleStep {
    /// Actuation to execute, front to back.
    pub plan: ActuationPlan,
    /// Distance of an obstacle that triggered (or re-triggered) the override.
    pub detected: Option<i32>,
    /// The reversing window elapsed and control went back to the operator.
    pub released: bool,
}

pub struct ObstacleMonitor {
    cal: Calibration,
    interval_ms: u64,
    reversing_ms: u64,
    threshold_cm: i32,
    last_distance_cm: Option<i32>,
    failed_reads: u32,
}

impl ObstacleMonitor {
    pub fn new(config: &VehicleConfig) -> Self {
        Self {
            cal: Calibration::from_config(config),
            interval_ms: u64::from(config.sensor_read_interval_ms),
            reversing_ms: u64::from(config.reversing_duration_ms),
            threshold_cm: config.obstacle_threshold_cm,
            last_distance_cm: None,
            failed_reads: 0,
        }
    }

    /// Run one monitor pass at `now_ms`, updating `state` in place.
    ///
    /// Does nothing while obstacle avoidance is disabled.
    pub fn tick(
        &mut self,
        state: &mut VehicleState,
        now_ms: u64,
        sensor: &mut impl DistanceSensorPort,
    ) -> ObstacleStep {
        let mut step = ObstacleStep::default();
        if !state.obstacle_avoidance_enabled {
            return step;
        }

        if now_ms.saturating_sub(state.last_sensor_sample_ms) >= self.interval_ms {
            match sensor.sample_raw() {
                Ok(raw) => {
                    let cm = self.cal.distance_cm(raw);
                    self.last_distance_cm = Some(cm);
                    if cm <= self.threshold_cm {
                        debug!("obstacle at {} cm (raw {})", cm, raw);
                        let t = engage_override(state, now_ms);
                        *state = t.state;
                        step.plan.extend(&t.plan);
                        step.detected = Some(cm);
                    }
                }
                Err(e) => {
                    self.failed_reads = self.failed_reads.saturating_add(1);
                    // A missing ADC was already reported at boot.
                    if e == SensorError::NotInitialised {
                        debug!("distance sample skipped: {}", e);
                    } else {
                        warn!("distance sample failed: {}", e);
                    }
                }
            }
            state.last_sensor_sample_ms = now_ms;
        }

        if state.obstacle_override_active
            && now_ms.saturating_sub(state.override_started_ms) >= self.reversing_ms
        {
            let t = release_override(state);
            *state = t.state;
            step.plan.extend(&t.plan);
            step.released = true;
        }

        step
    }

    /// Most recent converted reading, if any sample has succeeded.
    pub fn last_distance_cm(&self) -> Option<i32> {
        self.last_distance_cm
    }

    pub fn failed_reads(&self) -> u32 {
        self.failed_reads
    }
}
