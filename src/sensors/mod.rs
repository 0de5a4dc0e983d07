//! Sensor drivers.

pub mod distance;
