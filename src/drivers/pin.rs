//! `embedded-hal` views of the raw ESP-IDF pins configured by
//! [`hw_init`](super::hw_init).
//!
//! Drivers are written against the `embedded-hal` 1.0 traits so they can be
//! exercised with mock pins on the host.

use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin, StatefulOutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

impl digital::Error for ActuatorError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl pwm::Error for ActuatorError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

/// A GPIO configured as input+output by `hw_init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysPin {
    gpio: i32,
}

impl SysPin {
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }
}

impl ErrorType for SysPin {
    type Error = ActuatorError;
}

impl OutputPin for SysPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, true)
    }
}

impl StatefulOutputPin for SysPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        hw_init::gpio_read(self.gpio)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.is_set_high().map(|high| !high)
    }
}

/// One LEDC channel at [`pins::PWM_RESOLUTION_BITS`] resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedcChannel {
    channel: u32,
}

impl LedcChannel {
    pub const fn new(channel: u32) -> Self {
        Self { channel }
    }
}

impl pwm::ErrorType for LedcChannel {
    type Error = ActuatorError;
}

impl SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        (1u16 << pins::PWM_RESOLUTION_BITS) - 1
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let duty = duty.min(self.max_duty_cycle()) as u8;
        hw_init::ledc_set(self.channel, duty)
    }
}
