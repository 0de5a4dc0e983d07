//! One-shot hardware peripheral initialization and raw register access.
//!
//! Configures the IR sensor ADC channel, the H-bridge and light GPIOs, and
//! the LEDC timer/channels for the motor enable lines, using raw ESP-IDF
//! sys calls.  Called once from `main()` before the control loop starts.
//!
//! Only the drive outputs are mandatory.  If the ADC cannot be brought up
//! the car keeps driving and every distance read reports
//! [`SensorError::NotInitialised`].
//!
//! ## Dual-target design
//!
//! On ESP-IDF: every accessor below is a thin wrapper over a sys call.
//! On host/test: pin levels, duties and the ADC reading live in a
//! per-thread simulation so parallel tests cannot see each other's pins.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::{info, warn};

use crate::error::{ActuatorError, SensorError};
#[cfg(any(target_os = "espidf", test))]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC timer/channel config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Self::Init("ADC1"),
            HwInitError::GpioConfigFailed(_) => Self::Init("GPIO"),
            HwInitError::LedcInitFailed(_) => Self::Init("LEDC"),
        }
    }
}

pub const LEDC_CH_LEFT_EN: u32 = 0;
pub const LEDC_CH_RIGHT_EN: u32 = 1;

/// What came up during [`init_peripherals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralStatus {
    /// The IR sensor ADC is configured; obstacle avoidance has readings.
    pub distance_sensor: bool,
}

fn degrade_adc(res: Result<(), HwInitError>) -> bool {
    match res {
        Ok(()) => true,
        Err(e) => {
            warn!("hw_init: {}; driving without obstacle protection", e);
            false
        }
    }
}

/// Configure every peripheral.  Fails only if the drive outputs cannot be
/// configured.
#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<PeripheralStatus, HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    let distance_sensor = degrade_adc(unsafe { init_adc() });
    unsafe {
        init_gpio_outputs()?;
        init_ledc()?;
    }
    info!("hw_init: peripherals configured");
    Ok(PeripheralStatus { distance_sensor })
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<PeripheralStatus, HwInitError> {
    let distance_sensor = degrade_adc(sim::init_adc());
    sim::init_outputs()?;
    info!("hw_init(sim): peripherals configured");
    Ok(PeripheralStatus { distance_sensor })
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// control-loop ADC read path.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    // 12 dB attenuation: full 0 – 3.3 V sensor swing, 12-bit result.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe {
        adc_oneshot_config_channel(adc1_handle(), pins::IR_SENSOR_ADC1_CHANNEL, &chan_cfg)
    };
    if ret != ESP_OK as i32 {
        // Leave the handle null so reads report NotInitialised.
        unsafe {
            adc_oneshot_del_unit(adc1_handle());
            ADC1_HANDLE = core::ptr::null_mut();
        }
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!(
        "hw_init: ADC1 configured (CH{}=GPIO{} IR distance)",
        pins::IR_SENSOR_ADC1_CHANNEL,
        pins::IR_SENSOR_GPIO
    );
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    // SAFETY: adc1_handle() contract; control-loop access only.
    let handle = unsafe { adc1_handle() };
    if handle.is_null() {
        return Err(SensorError::NotInitialised);
    }
    let mut raw: i32 = 0;
    let ret = unsafe { adc_oneshot_read(handle, channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.clamp(0, i32::from(u16::MAX)) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Result<u16, SensorError> {
    sim::with(|s| s.adc)
}

// ── GPIO Outputs ──────────────────────────────────────────────

/// H-bridge inputs and light circuits.  Configured input+output so the
/// driven level can be read back.
#[cfg(target_os = "espidf")]
const OUTPUT_PINS: [i32; 6] = [
    pins::LEFT_MOTORS_IN1_GPIO,
    pins::LEFT_MOTORS_IN2_GPIO,
    pins::RIGHT_MOTORS_IN3_GPIO,
    pins::RIGHT_MOTORS_IN4_GPIO,
    pins::HEADLIGHTS_GPIO,
    pins::TAILLIGHTS_GPIO,
];

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    for &pin in &OUTPUT_PINS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: GPIO outputs configured (H-bridge inputs low, lights off)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), ActuatorError> {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK as i32 {
        return Err(ActuatorError::GpioWriteFailed);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), ActuatorError> {
    sim::with_mut(|s| {
        let bit = sim::bit(pin)?;
        if high { s.levels |= bit } else { s.levels &= !bit }
        Ok(())
    })
}

/// Level currently driven on an input+output pin.
#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> Result<bool, ActuatorError> {
    // SAFETY: register read on a configured pin.
    Ok((unsafe { gpio_get_level(pin) }) != 0)
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> Result<bool, ActuatorError> {
    let bit = sim::bit(pin).map_err(|_| ActuatorError::GpioReadFailed)?;
    Ok(sim::with(|s| s.levels & bit != 0))
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: both motor enables.  ledc_timer_bit_t is the bit count.
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: pins::PWM_RESOLUTION_BITS,
        freq_hz: pins::MOTOR_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    let channels = [
        (LEDC_CH_LEFT_EN, pins::LEFT_MOTORS_EN_GPIO),
        (LEDC_CH_RIGHT_EN, pins::RIGHT_MOTORS_EN_GPIO),
    ];
    for (channel, gpio) in channels {
        let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        }) };
        if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }
    }

    info!("hw_init: LEDC configured (left EN=CH0, right EN=CH1)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) -> Result<(), ActuatorError> {
    // SAFETY: channels were configured in init_ledc(); only the control
    // loop writes duty registers.
    let ret = unsafe {
        let r = ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        if r == ESP_OK as i32 {
            ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel)
        } else {
            r
        }
    };
    if ret != ESP_OK as i32 {
        return Err(ActuatorError::PwmWriteFailed);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(channel: u32, duty: u8) -> Result<(), ActuatorError> {
    sim::with_mut(|s| {
        let slot = s.duty.get_mut(channel as usize).ok_or(ActuatorError::PwmWriteFailed)?;
        *slot = duty;
        Ok(())
    })
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub use sim::{
    sim_duty, sim_fail_adc, sim_fail_adc_init, sim_fail_gpio_init, sim_level, sim_reset,
    sim_set_adc,
};

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::cell::RefCell;

    use super::HwInitError;
    use crate::error::{ActuatorError, SensorError};

    /// ESP_FAIL
    const FAIL_RC: i32 = -1;

    pub(super) struct SimState {
        pub levels: u64,
        pub duty: [u8; 2],
        pub adc: Result<u16, SensorError>,
        adc_init_fails: bool,
        gpio_init_fails: bool,
    }

    impl Default for SimState {
        fn default() -> Self {
            Self {
                levels: 0,
                duty: [0; 2],
                // Nothing in front of the sensor.
                adc: Ok(0),
                adc_init_fails: false,
                gpio_init_fails: false,
            }
        }
    }

    thread_local! {
        static SIM: RefCell<SimState> = RefCell::new(SimState::default());
    }

    pub(super) fn with<R>(f: impl FnOnce(&SimState) -> R) -> R {
        SIM.with(|s| f(&s.borrow()))
    }

    pub(super) fn with_mut<R>(f: impl FnOnce(&mut SimState) -> R) -> R {
        SIM.with(|s| f(&mut s.borrow_mut()))
    }

    pub(super) fn bit(pin: i32) -> Result<u64, ActuatorError> {
        if (0..64).contains(&pin) {
            Ok(1u64 << pin)
        } else {
            Err(ActuatorError::GpioWriteFailed)
        }
    }

    pub(super) fn init_adc() -> Result<(), HwInitError> {
        with_mut(|s| {
            if s.adc_init_fails {
                s.adc = Err(SensorError::NotInitialised);
                Err(HwInitError::AdcInitFailed(FAIL_RC))
            } else {
                Ok(())
            }
        })
    }

    pub(super) fn init_outputs() -> Result<(), HwInitError> {
        with_mut(|s| {
            if s.gpio_init_fails {
                return Err(HwInitError::GpioConfigFailed(FAIL_RC));
            }
            s.levels = 0;
            s.duty = [0; 2];
            Ok(())
        })
    }

    /// Make the next [`init_peripherals`](super::init_peripherals) fail to
    /// bring up the ADC.
    pub fn sim_fail_adc_init() {
        with_mut(|s| s.adc_init_fails = true);
    }

    /// Make the next [`init_peripherals`](super::init_peripherals) fail to
    /// configure the output pins.
    pub fn sim_fail_gpio_init() {
        with_mut(|s| s.gpio_init_fails = true);
    }

    /// Level last written to `pin` on this thread.
    pub fn sim_level(pin: i32) -> bool {
        bit(pin).is_ok_and(|b| with(|s| s.levels & b != 0))
    }

    /// Duty last written to an LEDC channel on this thread.
    pub fn sim_duty(channel: u32) -> u8 {
        with(|s| s.duty.get(channel as usize).copied().unwrap_or(0))
    }

    /// Raw value returned by the next ADC reads.
    pub fn sim_set_adc(raw: u16) {
        with_mut(|s| s.adc = Ok(raw));
    }

    pub fn sim_fail_adc() {
        with_mut(|s| s.adc = Err(SensorError::AdcReadFailed));
    }

    pub fn sim_reset() {
        with_mut(|s| *s = SimState::default());
    }
}
