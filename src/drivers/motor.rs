//! Drive motor driver (one side of an L298N dual H-bridge).
//!
//! Polarity comes from two digital inputs, speed from PWM on the enable
//! line:
//!
//! | Direction | IN_A | IN_B |
//! |-----------|------|------|
//! | Forward   | low  | high |
//! | Backward  | high | low  |
//! | Stopped   | low  | low  |
//!
//! ## Shoot-through contract
//!
//! Both inputs high brakes the motor against the supply.  Every polarity
//! change de-asserts the opposite input before asserting the new one, so
//! the pair is never high together even transiently.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::error::ActuatorError;
use crate::vehicle::DriveDirection;

pub struct HBridgeSide<A, B, E> {
    in_a: A,
    in_b: B,
    enable: E,
    direction: DriveDirection,
    duty: u8,
}

impl<A, B, E> HBridgeSide<A, B, E>
where
    A: OutputPin,
    B: OutputPin,
    E: SetDutyCycle,
{
    pub fn new(in_a: A, in_b: B, enable: E) -> Self {
        Self {
            in_a,
            in_b,
            enable,
            direction: DriveDirection::Stopped,
            duty: 0,
        }
    }

    pub fn set_direction(&mut self, direction: DriveDirection) -> Result<(), ActuatorError> {
        match direction {
            DriveDirection::Forward => {
                self.in_a.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
                self.in_b.set_high().map_err(|_| ActuatorError::GpioWriteFailed)?;
            }
            DriveDirection::Backward => {
                self.in_b.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
                self.in_a.set_high().map_err(|_| ActuatorError::GpioWriteFailed)?;
            }
            DriveDirection::Stopped => {
                self.in_a.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
                self.in_b.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
            }
        }
        self.direction = direction;
        Ok(())
    }

    /// Set the enable-line duty (0 – 255), scaled to the channel's range.
    pub fn set_speed(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.enable
            .set_duty_cycle_fraction(u16::from(duty), u16::from(u8::MAX))
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.duty = duty;
        Ok(())
    }

    pub fn direction(&self) -> DriveDirection {
        self.direction
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }
}
