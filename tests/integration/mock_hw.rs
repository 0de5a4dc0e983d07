//! Mock adapters for integration tests.
//!
//! Records every port call so tests can assert on the full actuation
//! history without touching real GPIO/PWM registers.

use rccar::app::events::AppEvent;
use rccar::app::ports::{AssetStore, DistanceSensorPort, DrivePort, EventSink, PlaybackEngine};
use rccar::error::{AudioError, SensorError, StorageError};
use rccar::vehicle::{DriveDirection, DriveSide, Output};

// ── Drive call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveCall {
    Side { side: DriveSide, direction: DriveDirection },
    Speed { side: DriveSide, duty: u8 },
    Output { output: Output, on: bool },
}

// ── MockHardware ──────────────────────────────────────────────

/// Raw ADC reading for something about 8 cm away.
pub const RAW_NEAR: u16 = 3700;
/// Raw ADC reading for something about 87 cm away.
pub const RAW_FAR: u16 = 500;

pub struct MockHardware {
    pub calls: Vec<DriveCall>,
    pub headlights: bool,
    pub taillights: bool,
    pub raw: Result<u16, SensorError>,
    pub samples: u32,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            headlights: false,
            taillights: false,
            raw: Ok(RAW_FAR),
            samples: 0,
        }
    }

    /// Last direction commanded on `side`.
    pub fn side(&self, side: DriveSide) -> Option<DriveDirection> {
        self.calls.iter().rev().find_map(|c| match *c {
            DriveCall::Side { side: s, direction } if s == side => Some(direction),
            _ => None,
        })
    }

    /// Last duty written to `side`.
    pub fn duty(&self, side: DriveSide) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match *c {
            DriveCall::Speed { side: s, duty } if s == side => Some(duty),
            _ => None,
        })
    }

    pub fn both_sides(&self) -> (Option<DriveDirection>, Option<DriveDirection>) {
        (self.side(DriveSide::Left), self.side(DriveSide::Right))
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl DrivePort for MockHardware {
    fn set_drive_side(&mut self, side: DriveSide, direction: DriveDirection) {
        self.calls.push(DriveCall::Side { side, direction });
    }

    fn set_drive_speed(&mut self, side: DriveSide, duty: u8) {
        self.calls.push(DriveCall::Speed { side, duty });
    }

    fn set_output(&mut self, output: Output, on: bool) {
        match output {
            Output::Headlights => self.headlights = on,
            Output::Taillights => self.taillights = on,
        }
        self.calls.push(DriveCall::Output { output, on });
    }

    fn read_output(&mut self, output: Output) -> bool {
        match output {
            Output::Headlights => self.headlights,
            Output::Taillights => self.taillights,
        }
    }
}

impl DistanceSensorPort for MockHardware {
    fn sample_raw(&mut self) -> Result<u16, SensorError> {
        self.samples += 1;
        self.raw
    }
}

// ── MockStore / MockPlayer ────────────────────────────────────

/// Asset store whose streams are just the requested path.
pub struct MockStore {
    pub available: bool,
    pub missing: Vec<&'static str>,
    pub opened: Vec<String>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self {
            available: true,
            missing: Vec::new(),
            opened: Vec::new(),
        }
    }
}

impl AssetStore for MockStore {
    type Stream = String;

    fn is_available(&self) -> bool {
        self.available
    }

    fn open(&mut self, path: &str) -> Result<String, StorageError> {
        if !self.available {
            return Err(StorageError::NotMounted);
        }
        if self.missing.contains(&path) {
            return Err(StorageError::NotFound);
        }
        self.opened.push(path.to_string());
        Ok(path.to_string())
    }
}

/// Player that "plays" a clip for a fixed number of pumps.
pub struct MockPlayer {
    pub current: Option<String>,
    pub clip_len: u32,
    pub remaining: u32,
    pub pumps: u32,
    pub stops: u32,
}

#[allow(dead_code)]
impl MockPlayer {
    pub fn new() -> Self {
        Self::with_clip_len(u32::MAX)
    }

    pub fn with_clip_len(clip_len: u32) -> Self {
        Self {
            current: None,
            clip_len,
            remaining: 0,
            pumps: 0,
            stops: 0,
        }
    }
}

impl PlaybackEngine<String> for MockPlayer {
    fn begin(&mut self, stream: String) -> Result<(), AudioError> {
        self.current = Some(stream);
        self.remaining = self.clip_len;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.current.is_some()
    }

    fn pump(&mut self) -> bool {
        self.pumps += 1;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.current = None;
        }
        self.current.is_some()
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.current = None;
    }
}

// ── LogSink ───────────────────────────────────────────────────

pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
