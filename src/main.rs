//! RC car firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     FileAssetStore   WavPlayer    LogEventSink│
//! │  (Drive+Distance)    (SD card)        (I2S)        (EventSink) │
//! │  ws_server ──▶ SharedTransport        MonotonicClock           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            VehicleService (pure logic)                 │    │
//! │  │  transition · obstacle override · sound arbitration    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ControlLoop (drain link → tick → telemetry)                   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::i2s::config::{
    Config as I2sChannelConfig, DataBitWidth, SlotMode, StdClkConfig, StdConfig, StdGpioConfig,
    StdSlotConfig,
};
use esp_idf_hal::i2s::I2sDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::sd::spi::SdSpiHostDriver;
use esp_idf_hal::sd::{SdCardConfiguration, SdCardDriver};
use esp_idf_hal::spi::{Dma, SpiDriver, SpiDriverConfig};
use esp_idf_svc::fs::fatfs::Fatfs;
use esp_idf_svc::io::vfs::MountedFatfs;
use log::{info, warn};

use rccar::adapters::audio::{
    DMA_FRAMES, FileAssetStore, I2sPcmOutput, NullPcmOutput, PcmOutput, WavPlayer,
};
use rccar::adapters::config_file::FileConfigStore;
use rccar::adapters::hardware::HardwareAdapter;
use rccar::adapters::log_sink::LogEventSink;
use rccar::adapters::time::MonotonicClock;
use rccar::adapters::ws_server;
use rccar::app::ports::AssetStore;
use rccar::app::service::VehicleService;
use rccar::drivers::hw_init;
use rccar::link::SharedTransport;
use rccar::pins;
use rccar::scheduler::ControlLoop;

/// VFS mount point of the SD card; `config.json` lives here.
const SD_MOUNT_POINT: &str = "/sdcard";
/// Pause between passes while no clip is playing.
const IDLE_PASS_MS: u32 = 10;
/// Pause between passes while a clip plays.  Short enough to refill the
/// I2S DMA buffers, long enough to let the idle task feed the watchdog.
const PLAYING_PASS_MS: u32 = 1;

// The typed peripherals taken below must match the board map.
const _: () = assert!(
    pins::SD_SCLK_GPIO == 18
        && pins::SD_MOSI_GPIO == 23
        && pins::SD_MISO_GPIO == 19
        && pins::SD_CS_GPIO == 5
);
const _: () = assert!(
    pins::I2S_BCLK_GPIO == 26 && pins::I2S_DOUT_GPIO == 22 && pins::I2S_WS_GPIO == 25
);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RC car v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Motors, lights, IR sensor ──────────────────────────
    // A missing ADC only disables obstacle readings.  Without the
    // H-bridge there is nothing to drive; halt until the task watchdog
    // resets the chip.
    match hw_init::init_peripherals() {
        Ok(status) if !status.distance_sensor => {
            warn!("IR sensor offline, obstacle avoidance has no readings");
        }
        Ok(_) => {}
        Err(e) => {
            log::error!("HAL init failed: {}, halting", e);
            #[allow(clippy::empty_loop)]
            loop {}
        }
    }

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // ── 3. SD card (assets + config) ──────────────────────────
    let sdcard = SpiDriver::new(
        peripherals.spi3,
        pins.gpio18,
        pins.gpio23,
        Some(pins.gpio19),
        &SpiDriverConfig::default().dma(Dma::Auto(4096)),
    )
    .and_then(|spi| {
        SdSpiHostDriver::new(
            spi,
            Some(pins.gpio5),
            AnyIOPin::none(),
            AnyIOPin::none(),
            AnyIOPin::none(),
            None,
        )
    })
    .and_then(|host| SdCardDriver::new_spi(host, &SdCardConfiguration::new()))
    .and_then(|card| Fatfs::new_sdcard(0, card))
    .and_then(|fs| MountedFatfs::mount(fs, SD_MOUNT_POINT, 4));
    // Held for the life of the program; dropping it unmounts the card.
    let _sdcard = match sdcard {
        Ok(mounted) => {
            info!("SD card mounted at {}", SD_MOUNT_POINT);
            Some(mounted)
        }
        Err(e) => {
            warn!("SD card mount failed ({}), sounds disabled", e);
            None
        }
    };

    // ── 4. Config ─────────────────────────────────────────────
    let config = FileConfigStore::new(SD_MOUNT_POINT).load_or_default();

    // ── 5. Audio ──────────────────────────────────────────────
    let mut store = FileAssetStore::from_config(&config);
    let i2s_config = StdConfig::new(
        I2sChannelConfig::default().frames_per_buffer(DMA_FRAMES as u32),
        StdClkConfig::from_sample_rate_hz(config.audio_sample_rate_hz),
        StdSlotConfig::philips_slot_default(DataBitWidth::Bits16, SlotMode::Mono),
        StdGpioConfig::default(),
    );
    let output: Box<dyn PcmOutput> = match I2sDriver::new_std_tx(
        peripherals.i2s0,
        &i2s_config,
        pins.gpio26,
        pins.gpio22,
        Option::<AnyIOPin>::None,
        pins.gpio25,
    ) {
        Ok(driver) => Box::new(I2sPcmOutput::new(driver, config.audio_sample_rate_hz)),
        Err(e) => {
            warn!("I2S init failed ({}), audio muted", e);
            Box::new(NullPcmOutput::default())
        }
    };
    let mut player = WavPlayer::new(output, config.audio_gain);

    // ── 6. Operator link ──────────────────────────────────────
    let link = SharedTransport::new();
    let _server = ws_server::start(link.clone())?;

    // ── 7. Control loop ───────────────────────────────────────
    let telemetry_ms = u64::from(config.telemetry_interval_ms);
    let service = VehicleService::new(config, store.is_available());
    let mut control = ControlLoop::new(service, link, MonotonicClock::new());
    if telemetry_ms > 0 {
        control = control.with_telemetry(telemetry_ms);
    }

    let mut hw = HardwareAdapter::board();
    let mut sink = LogEventSink::new();
    control.start(&mut hw, &mut sink);

    info!("System ready. Entering control loop.");

    loop {
        control.run_once(&mut hw, &mut store, &mut player, &mut sink);

        let pause = if control.service().playing().is_some() {
            PLAYING_PASS_MS
        } else {
            IDLE_PASS_MS
        };
        FreeRtos::delay_ms(pause);
    }
}
