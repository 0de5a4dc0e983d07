//! Cooperative control loop.
//!
//! One pass of the loop does, in order:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  1. drain the transport                                      │
//! │       each payload → VehicleService::handle_payload          │
//! │  2. VehicleService::tick(now)                                │
//! │       sound arbitration → obstacle monitor                   │
//! │  3. telemetry, if the interval has elapsed                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Time comes only from a [`ClockPort`].  On the car that is the ESP
//! high-resolution timer; in tests it is a [`ManualClock`].

use core::cell::Cell;

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::{
    AssetStore, ClockPort, DistanceSensorPort, DrivePort, EventSink, PlaybackEngine,
};
use crate::app::service::VehicleService;
use crate::link::Transport;

// ═══════════════════════════════════════════════════════════════
//  Manual clock
// ═══════════════════════════════════════════════════════════════

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(delta_ms));
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

impl<C: ClockPort> ClockPort for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Control loop
// ═══════════════════════════════════════════════════════════════

/// What one pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Payloads taken off the transport.
    pub messages: usize,
    /// Of those, payloads that decoded to a command.
    pub applied: usize,
    pub now_ms: u64,
}

pub struct ControlLoop<T: Transport, C: ClockPort> {
    service: VehicleService,
    transport: T,
    clock: C,
    telemetry_interval_ms: Option<u64>,
    last_telemetry_ms: u64,
    passes: u64,
}

impl<T: Transport, C: ClockPort> ControlLoop<T, C> {
    pub fn new(service: VehicleService, transport: T, clock: C) -> Self {
        Self {
            service,
            transport,
            clock,
            telemetry_interval_ms: None,
            last_telemetry_ms: 0,
            passes: 0,
        }
    }

    /// Emit a telemetry snapshot every `interval_ms`.
    pub fn with_telemetry(mut self, interval_ms: u64) -> Self {
        self.telemetry_interval_ms = Some(interval_ms);
        self
    }

    /// Bring outputs to their power-on levels.
    pub fn start(&mut self, hw: &mut impl DrivePort, sink: &mut impl EventSink) {
        self.last_telemetry_ms = self.clock.now_ms();
        self.service.start(hw, sink);
    }

    /// Run one pass of the loop.
    pub fn run_once<S, P>(
        &mut self,
        hw: &mut (impl DrivePort + DistanceSensorPort),
        store: &mut S,
        player: &mut P,
        sink: &mut impl EventSink,
    ) -> PassReport
    where
        S: AssetStore,
        P: PlaybackEngine<S::Stream>,
    {
        self.passes += 1;
        let mut report = PassReport::default();

        while let Some(msg) = self.transport.poll_message() {
            report.messages += 1;
            if self.service.handle_payload(&msg, hw, sink).is_some() {
                report.applied += 1;
            }
        }

        let now_ms = self.clock.now_ms();
        report.now_ms = now_ms;
        self.service.tick(now_ms, hw, store, player, sink);

        if let Some(interval) = self.telemetry_interval_ms {
            if now_ms.saturating_sub(self.last_telemetry_ms) >= interval {
                self.last_telemetry_ms = now_ms;
                sink.emit(&AppEvent::Telemetry(self.service.build_telemetry()));
            }
        }

        if self.passes == 1 {
            info!("control loop running");
        }
        report
    }

    pub fn service(&self) -> &VehicleService {
        &self.service
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }
}
