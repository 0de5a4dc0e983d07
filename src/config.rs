//! Vehicle configuration parameters
//!
//! All tunable parameters for the RC car control core.  Values can be
//! overridden by a `config.json` on the SD card (see
//! [`FileConfigStore`](crate::adapters::config_file::FileConfigStore)).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core vehicle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    // --- Drive ---
    /// PWM duty applied to both drive sides at power-on (0-255)
    pub default_speed: u8,

    // --- Obstacle avoidance ---
    /// Distance sensor sampling period (milliseconds)
    pub sensor_read_interval_ms: u32,
    /// How long the car reverses away from an obstacle (milliseconds)
    pub reversing_duration_ms: u32,
    /// Distance (cm) at or below which an obstacle is avoided
    pub obstacle_threshold_cm: i32,

    // --- Distance sensor calibration ---
    /// ADC reference voltage (volts)
    pub adc_reference_volts: f32,
    /// Raw ADC reading at the reference voltage
    pub adc_full_scale: u16,
    /// Empirical curve `cm = coefficient * volts ^ exponent`
    pub distance_coefficient: f32,
    pub distance_exponent: f32,

    // --- Audio ---
    /// Output gain applied to every sample (0-1]
    pub audio_gain: f32,
    /// Mount point of the asset storage
    pub asset_root: String,
    pub acceleration_sound_path: String,
    pub horn_sound_path: String,
    pub reversing_sound_path: String,
    /// I2S output rate; assets must be recorded at this rate
    pub audio_sample_rate_hz: u32,

    // --- Telemetry ---
    /// Period of the telemetry log line (milliseconds, 0 = off)
    pub telemetry_interval_ms: u32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            // Drive
            default_speed: 255,

            // Obstacle avoidance
            sensor_read_interval_ms: 25,
            reversing_duration_ms: 250,
            obstacle_threshold_cm: 15,

            // GP2Y0A21 curve on a 12-bit, 3.3 V ADC
            adc_reference_volts: 3.3,
            adc_full_scale: 4095,
            distance_coefficient: 29.988,
            distance_exponent: -1.173,

            // Audio
            audio_gain: 0.15, // low enough to avoid DAC distortion
            asset_root: "/sdcard".into(),
            acceleration_sound_path: "/acceleration.wav".into(),
            horn_sound_path: "/horn.wav".into(),
            reversing_sound_path: "/reverse.wav".into(),
            audio_sample_rate_hz: 22_050,

            // Telemetry
            telemetry_interval_ms: 5_000,
        }
    }
}

impl VehicleConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor_read_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("sensor_read_interval_ms must be > 0"));
        }
        if self.reversing_duration_ms == 0 {
            return Err(ConfigError::ValidationFailed("reversing_duration_ms must be > 0"));
        }
        if self.adc_full_scale == 0 || !(self.adc_reference_volts > 0.0) {
            return Err(ConfigError::ValidationFailed("ADC scale must be positive"));
        }
        if self.audio_sample_rate_hz == 0 {
            return Err(ConfigError::ValidationFailed("audio_sample_rate_hz must be > 0"));
        }
        if !(self.audio_gain > 0.0 && self.audio_gain <= 1.0) {
            return Err(ConfigError::ValidationFailed("audio_gain outside (0, 1]"));
        }
        Ok(())
    }
}
