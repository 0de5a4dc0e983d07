//! Sharp GP2Y0A21 infrared distance sensor.
//!
//! Analog output on an ADC1 channel.  This driver only samples; the
//! voltage-to-distance curve lives in [`crate::obstacle::Calibration`].
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the oneshot ADC unit initialised by `hw_init`.
//! On host/test: reads the value injected with `hw_init::sim_set_adc`.

use crate::app::ports::DistanceSensorPort;
use crate::drivers::hw_init;
use crate::error::SensorError;

pub struct IrDistanceSensor {
    channel: u32,
    total_reads: u32,
    last_raw: Option<u16>,
}

impl IrDistanceSensor {
    pub fn new(adc1_channel: u32) -> Self {
        Self {
            channel: adc1_channel,
            total_reads: 0,
            last_raw: None,
        }
    }

    pub fn read(&mut self) -> Result<u16, SensorError> {
        self.total_reads = self.total_reads.saturating_add(1);
        let raw = hw_init::adc1_read(self.channel)?;
        self.last_raw = Some(raw);
        Ok(raw)
    }

    pub fn last_raw(&self) -> Option<u16> {
        self.last_raw
    }

    pub fn total_reads(&self) -> u32 {
        self.total_reads
    }
}

impl DistanceSensorPort for IrDistanceSensor {
    fn sample_raw(&mut self) -> Result<u16, SensorError> {
        self.read()
    }
}
