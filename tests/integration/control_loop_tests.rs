//! Integration tests for the ControlLoop: link buffering, pass ordering
//! and telemetry cadence.

use std::thread;

use crate::mock_hw::{LogSink, MockHardware, MockPlayer, MockStore, RAW_NEAR};

use rccar::app::events::AppEvent;
use rccar::app::service::VehicleService;
use rccar::config::VehicleConfig;
use rccar::link::{FrameInfo, LinkEvent, Opcode, QueuedTransport, SharedTransport, Transport};
use rccar::scheduler::{ControlLoop, ManualClock};
use rccar::vehicle::Direction;

fn service() -> VehicleService {
    VehicleService::new(VehicleConfig::default(), true)
}

fn text(payload: &[u8]) -> LinkEvent<'_> {
    LinkEvent::Data {
        client: 7,
        frame: FrameInfo::text(payload.len()),
        payload,
    }
}

#[test]
fn buffered_commands_apply_before_the_tick() {
    let clock = ManualClock::new(0);
    let mut link: QueuedTransport = QueuedTransport::new();
    link.on_event(text(b"toggle1"));
    link.on_event(text(b"move1"));

    let mut control = ControlLoop::new(service(), link, &clock);
    let mut hw = MockHardware::new();
    let (mut store, mut player, mut sink) = (MockStore::new(), MockPlayer::new(), LogSink::new());
    control.start(&mut hw, &mut sink);

    hw.raw = Ok(RAW_NEAR);
    clock.set(100);
    let report = control.run_once(&mut hw, &mut store, &mut player, &mut sink);

    assert_eq!(report.messages, 2);
    assert_eq!(report.applied, 2);
    assert_eq!(report.now_ms, 100);
    // Avoidance was on by the time the monitor ran in the same pass.
    let s = control.service().state();
    assert!(s.obstacle_override_active);
    assert_eq!(s.direction, Direction::Backward);
}

#[test]
fn dropped_payloads_are_counted() {
    let clock = ManualClock::new(0);
    let mut link: QueuedTransport = QueuedTransport::new();
    link.on_event(text(b"xyz9"));
    link.on_event(text(b"speed90"));

    let mut control = ControlLoop::new(service(), link, &clock);
    let mut hw = MockHardware::new();
    let (mut store, mut player, mut sink) = (MockStore::new(), MockPlayer::new(), LogSink::new());

    let report = control.run_once(&mut hw, &mut store, &mut player, &mut sink);
    assert_eq!(report.messages, 2);
    assert_eq!(report.applied, 1);
    assert_eq!(control.service().commands_dropped(), 1);
    assert_eq!(control.service().state().speed_level, 90);
}

#[test]
fn fragmented_and_binary_frames_never_reach_the_core() {
    let mut link: QueuedTransport = QueuedTransport::new();
    let fragment = FrameInfo {
        fin: false,
        ..FrameInfo::text(5)
    };
    let binary = FrameInfo {
        opcode: Opcode::Binary,
        ..FrameInfo::text(5)
    };
    assert!(!link.on_event(LinkEvent::Data {
        client: 1,
        frame: fragment,
        payload: b"move1",
    }));
    assert!(!link.on_event(LinkEvent::Data {
        client: 1,
        frame: binary,
        payload: b"move1",
    }));
    assert!(!link.on_event(LinkEvent::Connected { client: 1 }));
    assert!(link.is_empty());
}

#[test]
fn telemetry_follows_the_interval() {
    let clock = ManualClock::new(0);
    let mut control =
        ControlLoop::new(service(), QueuedTransport::<4>::new(), &clock).with_telemetry(1_000);
    let mut hw = MockHardware::new();
    let (mut store, mut player, mut sink) = (MockStore::new(), MockPlayer::new(), LogSink::new());
    control.start(&mut hw, &mut sink);

    let telemetry = |sink: &LogSink| sink.count(|e| matches!(e, AppEvent::Telemetry(_)));

    clock.set(500);
    control.run_once(&mut hw, &mut store, &mut player, &mut sink);
    assert_eq!(telemetry(&sink), 0);

    clock.set(1_000);
    control.run_once(&mut hw, &mut store, &mut player, &mut sink);
    assert_eq!(telemetry(&sink), 1);

    clock.set(1_999);
    control.run_once(&mut hw, &mut store, &mut player, &mut sink);
    assert_eq!(telemetry(&sink), 1);

    clock.set(2_000);
    control.run_once(&mut hw, &mut store, &mut player, &mut sink);
    assert_eq!(telemetry(&sink), 2);
    assert_eq!(control.passes(), 4);
}

#[test]
fn server_thread_feeds_the_loop() {
    let link: SharedTransport = SharedTransport::new();
    let producer = link.clone();
    thread::spawn(move || {
        producer.on_event(LinkEvent::Connected { client: 3 });
        producer.on_event(text(b"move1"));
        producer.on_event(text(b"toggle2"));
        producer.on_event(LinkEvent::Disconnected { client: 3 });
    })
    .join()
    .unwrap();

    let clock = ManualClock::new(0);
    let mut control = ControlLoop::new(service(), link, &clock);
    let mut hw = MockHardware::new();
    let (mut store, mut player, mut sink) = (MockStore::new(), MockPlayer::new(), LogSink::new());

    let report = control.run_once(&mut hw, &mut store, &mut player, &mut sink);
    assert_eq!(report.applied, 2);
    assert!(hw.headlights);
    assert_eq!(control.service().state().direction, Direction::Forward);
    assert!(control.transport_mut().poll_message().is_none());
}
