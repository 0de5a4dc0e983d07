//! The authoritative vehicle state.
//!
//! One `VehicleState` value lives for the whole process, owned by the
//! [`VehicleService`](crate::app::service::VehicleService) and threaded by
//! reference into every component.  There is no global access.

use super::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleState {
    /// Current whole-vehicle motion.
    pub direction: Direction,
    /// Driving forward; selects the acceleration sound.
    pub accelerating: bool,
    /// Driving backward; selects the reversing sound.
    pub reversing: bool,
    /// Horn held by the operator.
    pub honking: bool,
    /// Operator-toggled obstacle avoidance feature.
    pub obstacle_avoidance_enabled: bool,
    /// The core has seized control to back away from an obstacle.
    pub obstacle_override_active: bool,
    /// Last commanded PWM duty, shared by both drive sides.
    pub speed_level: u32,
    /// Monotonic ms of the last distance sample.
    pub last_sensor_sample_ms: u64,
    /// Monotonic ms at which the current override began.
    pub override_started_ms: u64,
}

impl VehicleState {
    /// Power-on state: stopped, every flag cleared, speed at `default_speed`.
    pub fn new(default_speed: u8) -> Self {
        Self {
            direction: Direction::Stopped,
            accelerating: false,
            reversing: false,
            honking: false,
            obstacle_avoidance_enabled: false,
            obstacle_override_active: false,
            speed_level: u32::from(default_speed),
            last_sensor_sample_ms: 0,
            override_started_ms: 0,
        }
    }

    /// `accelerating` and `reversing` are mutually exclusive.
    pub fn is_consistent(&self) -> bool {
        !(self.accelerating && self.reversing)
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::new(u8::MAX)
    }
}
