//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod hw_init;
pub mod lights;
pub mod motor;
pub mod pin;
