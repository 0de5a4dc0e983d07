//! Headlight / taillight LED circuits.
//!
//! A light has no state of its own: the level driven on its pin is the
//! state, read back for toggling.

use embedded_hal::digital::StatefulOutputPin;

use crate::error::ActuatorError;

pub struct LightCircuit<P> {
    pin: P,
}

impl<P: StatefulOutputPin> LightCircuit<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        res.map_err(|_| ActuatorError::GpioWriteFailed)
    }

    pub fn is_on(&mut self) -> Result<bool, ActuatorError> {
        self.pin.is_set_high().map_err(|_| ActuatorError::GpioReadFailed)
    }
}
