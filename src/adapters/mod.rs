//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements         | Connects to                |
//! |---------------|--------------------|----------------------------|
//! | `audio`       | AssetStore         | SD card (FAT)              |
//! |               | PlaybackEngine     | I2S amplifier              |
//! | `config_file` | ConfigPort         | `config.json` on SD card   |
//! | `hardware`    | DrivePort          | ESP32 GPIO, LEDC PWM       |
//! |               | DistanceSensorPort | ESP32 ADC1                 |
//! | `log_sink`    | EventSink          | Serial log output          |
//! | `time`        | ClockPort          | ESP32 system timer         |
//! | `ws_server`   | (feeds Transport)  | HTTP server `/ws` endpoint |

pub mod audio;
pub mod config_file;
pub mod hardware;
pub mod log_sink;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod ws_server;
