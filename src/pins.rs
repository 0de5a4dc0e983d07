//! GPIO / peripheral pin assignments for the RC car main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Drive motors (L298N dual H-bridge)
// ---------------------------------------------------------------------------

/// LEDC PWM output: enable line of the left motor pair.
pub const LEFT_MOTORS_EN_GPIO: i32 = 32;
/// Left motor pair polarity input 1.
pub const LEFT_MOTORS_IN1_GPIO: i32 = 13;
/// Left motor pair polarity input 2.
pub const LEFT_MOTORS_IN2_GPIO: i32 = 27;

/// Right motor pair polarity input 3.
pub const RIGHT_MOTORS_IN3_GPIO: i32 = 14;
/// Right motor pair polarity input 4.
pub const RIGHT_MOTORS_IN4_GPIO: i32 = 12;
/// LEDC PWM output: enable line of the right motor pair.
pub const RIGHT_MOTORS_EN_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Sensors: analog (ADC1)
// ---------------------------------------------------------------------------

/// Sharp GP2Y0A21 infrared distance sensor.
pub const IR_SENSOR_GPIO: i32 = 35;
pub const IR_SENSOR_ADC1_CHANNEL: u32 = adc1_channel(IR_SENSOR_GPIO);

/// ADC1 channel wired to `gpio` on the ESP32.  Fails the build for pins
/// ADC1 cannot sample.
pub const fn adc1_channel(gpio: i32) -> u32 {
    match gpio {
        36 => 0,
        37 => 1,
        38 => 2,
        39 => 3,
        32 => 4,
        33 => 5,
        34 => 6,
        35 => 7,
        _ => panic!("not an ADC1 pin"),
    }
}

// ---------------------------------------------------------------------------
// Lights
// ---------------------------------------------------------------------------

pub const HEADLIGHTS_GPIO: i32 = 17;
pub const TAILLIGHTS_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// SD card (SPI)
//
// main() takes these as typed peripherals; it asserts they match.
// ---------------------------------------------------------------------------

pub const SD_CS_GPIO: i32 = 5;
pub const SD_SCLK_GPIO: i32 = 18;
pub const SD_MOSI_GPIO: i32 = 23;
pub const SD_MISO_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// I2S audio output (mono DAC amplifier)
// ---------------------------------------------------------------------------

pub const I2S_BCLK_GPIO: i32 = 26;
pub const I2S_WS_GPIO: i32 = 25;
pub const I2S_DOUT_GPIO: i32 = 22;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels; the
/// drive duty is a `u8`, so this cannot grow.
pub const PWM_RESOLUTION_BITS: u32 = 8;
const _: () = assert!(PWM_RESOLUTION_BITS == u8::BITS);
/// LEDC base frequency for the drive motors.
pub const MOTOR_PWM_FREQ_HZ: u32 = 5_000;
