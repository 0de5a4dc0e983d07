//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns both H-bridge sides, the light circuits and the IR sensor,
//! exposing them through [`DrivePort`] and [`DistanceSensorPort`].  This
//! is the only module in the system that touches actual hardware.  On
//! non-espidf targets the underlying drivers use the `hw_init`
//! simulation.

use log::warn;

use crate::app::ports::{DistanceSensorPort, DrivePort};
use crate::drivers::hw_init;
use crate::drivers::lights::LightCircuit;
use crate::drivers::motor::HBridgeSide;
use crate::drivers::pin::{LedcChannel, SysPin};
use crate::error::{ActuatorError, SensorError};
use crate::pins;
use crate::sensors::distance::IrDistanceSensor;
use crate::vehicle::{DriveDirection, DriveSide, Output};

pub type BoardMotor = HBridgeSide<SysPin, SysPin, LedcChannel>;
pub type BoardLight = LightCircuit<SysPin>;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    left: BoardMotor,
    right: BoardMotor,
    headlights: BoardLight,
    taillights: BoardLight,
    ir: IrDistanceSensor,
    write_failures: u32,
}

impl HardwareAdapter {
    pub fn new(
        left: BoardMotor,
        right: BoardMotor,
        headlights: BoardLight,
        taillights: BoardLight,
        ir: IrDistanceSensor,
    ) -> Self {
        Self {
            left,
            right,
            headlights,
            taillights,
            ir,
            write_failures: 0,
        }
    }

    /// Adapter wired to the main board's pin map.
    pub fn board() -> Self {
        Self::new(
            HBridgeSide::new(
                SysPin::new(pins::LEFT_MOTORS_IN1_GPIO),
                SysPin::new(pins::LEFT_MOTORS_IN2_GPIO),
                LedcChannel::new(hw_init::LEDC_CH_LEFT_EN),
            ),
            HBridgeSide::new(
                SysPin::new(pins::RIGHT_MOTORS_IN3_GPIO),
                SysPin::new(pins::RIGHT_MOTORS_IN4_GPIO),
                LedcChannel::new(hw_init::LEDC_CH_RIGHT_EN),
            ),
            LightCircuit::new(SysPin::new(pins::HEADLIGHTS_GPIO)),
            LightCircuit::new(SysPin::new(pins::TAILLIGHTS_GPIO)),
            IrDistanceSensor::new(pins::IR_SENSOR_ADC1_CHANNEL),
        )
    }

    /// Output writes that failed since boot.
    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }

    fn motor(&mut self, side: DriveSide) -> &mut BoardMotor {
        match side {
            DriveSide::Left => &mut self.left,
            DriveSide::Right => &mut self.right,
        }
    }

    fn light(&mut self, output: Output) -> &mut BoardLight {
        match output {
            Output::Headlights => &mut self.headlights,
            Output::Taillights => &mut self.taillights,
        }
    }

    fn note(&mut self, what: &str, res: Result<(), ActuatorError>) {
        if let Err(e) = res {
            self.write_failures = self.write_failures.saturating_add(1);
            warn!("{}: {}", what, e);
        }
    }
}

// ── DrivePort implementation ─────────────────────────────────

impl DrivePort for HardwareAdapter {
    fn set_drive_side(&mut self, side: DriveSide, direction: DriveDirection) {
        let res = self.motor(side).set_direction(direction);
        self.note("drive direction", res);
    }

    fn set_drive_speed(&mut self, side: DriveSide, duty: u8) {
        let res = self.motor(side).set_speed(duty);
        self.note("drive speed", res);
    }

    fn set_output(&mut self, output: Output, on: bool) {
        let res = self.light(output).set(on);
        self.note("light", res);
    }

    fn read_output(&mut self, output: Output) -> bool {
        match self.light(output).is_on() {
            Ok(on) => on,
            Err(e) => {
                warn!("{:?} readback: {}", output, e);
                false
            }
        }
    }
}

// ── DistanceSensorPort implementation ────────────────────────

impl DistanceSensorPort for HardwareAdapter {
    fn sample_raw(&mut self) -> Result<u16, SensorError> {
        self.ir.sample_raw()
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use std::fs::File;
    use std::io::BufReader;

    use super::*;
    use crate::adapters::audio::{FileAssetStore, NullPcmOutput, WavPlayer};
    use crate::adapters::log_sink::LogEventSink;
    use crate::app::ports::AssetStore;
    use crate::app::service::VehicleService;
    use crate::config::VehicleConfig;
    use crate::vehicle::{ActuationPlan, Direction, motion};

    #[test]
    fn forward_sets_h_bridge_table() {
        hw_init::sim_reset();
        let mut hw = HardwareAdapter::board();
        let mut plan = ActuationPlan::new();
        motion::plan_drive(&mut plan, Direction::Forward);
        motion::apply(&plan, &mut hw);

        assert!(!hw_init::sim_level(pins::LEFT_MOTORS_IN1_GPIO));
        assert!(hw_init::sim_level(pins::LEFT_MOTORS_IN2_GPIO));
        assert!(!hw_init::sim_level(pins::RIGHT_MOTORS_IN3_GPIO));
        assert!(hw_init::sim_level(pins::RIGHT_MOTORS_IN4_GPIO));
        assert_eq!(hw.write_failures(), 0);
    }

    #[test]
    fn left_turn_spins_sides_in_opposition() {
        hw_init::sim_reset();
        let mut hw = HardwareAdapter::board();
        let mut plan = ActuationPlan::new();
        motion::plan_drive(&mut plan, Direction::Left);
        motion::apply(&plan, &mut hw);

        // Left side backward, right side forward.
        assert!(hw_init::sim_level(pins::LEFT_MOTORS_IN1_GPIO));
        assert!(!hw_init::sim_level(pins::LEFT_MOTORS_IN2_GPIO));
        assert!(!hw_init::sim_level(pins::RIGHT_MOTORS_IN3_GPIO));
        assert!(hw_init::sim_level(pins::RIGHT_MOTORS_IN4_GPIO));
    }

    #[test]
    fn headlight_toggle_reads_back_pin() {
        hw_init::sim_reset();
        let mut hw = HardwareAdapter::board();
        assert!(!hw.read_output(Output::Headlights));
        hw.set_output(Output::Headlights, true);
        assert!(hw_init::sim_level(pins::HEADLIGHTS_GPIO));
        assert!(hw.read_output(Output::Headlights));
        assert!(!hw.read_output(Output::Taillights));
    }

    #[test]
    fn speed_reaches_both_enable_channels() {
        hw_init::sim_reset();
        let mut hw = HardwareAdapter::board();
        hw.set_drive_speed(DriveSide::Left, 200);
        hw.set_drive_speed(DriveSide::Right, 127);
        assert_eq!(hw_init::sim_duty(hw_init::LEDC_CH_LEFT_EN), 200);
        assert_eq!(hw_init::sim_duty(hw_init::LEDC_CH_RIGHT_EN), 127);
    }

    #[test]
    fn drives_with_avoidance_on_when_adc_never_came_up() {
        hw_init::sim_reset();
        hw_init::sim_fail_adc_init();
        let status = hw_init::init_peripherals().unwrap();
        assert!(!status.distance_sensor);

        let mut hw = HardwareAdapter::board();
        let mut store = FileAssetStore::new("/definitely/not/a/mount");
        let mut player: WavPlayer<BufReader<File>, NullPcmOutput> =
            WavPlayer::new(NullPcmOutput::default(), 1.0);
        let mut sink = LogEventSink::new();
        let mut app = VehicleService::new(VehicleConfig::default(), store.is_available());
        app.start(&mut hw, &mut sink);
        app.handle_payload(b"toggle1", &mut hw, &mut sink);
        app.handle_payload(b"move1", &mut hw, &mut sink);

        for now in (0..200).step_by(25) {
            app.tick(now, &mut hw, &mut store, &mut player, &mut sink);
        }

        assert!(app.state().obstacle_avoidance_enabled);
        assert!(!app.state().obstacle_override_active);
        assert!(hw_init::sim_level(pins::LEFT_MOTORS_IN2_GPIO));
        assert!(hw_init::sim_level(pins::RIGHT_MOTORS_IN4_GPIO));
        assert_eq!(hw_init::sim_duty(hw_init::LEDC_CH_LEFT_EN), 255);
        assert_eq!(hw.sample_raw(), Err(SensorError::NotInitialised));
    }
}
