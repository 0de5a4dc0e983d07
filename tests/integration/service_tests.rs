//! Integration tests for the VehicleService → transition → DrivePort
//! pipeline, plus the obstacle override and sound arbitration it runs
//! each tick.

use crate::mock_hw::{LogSink, MockHardware, MockPlayer, MockStore, RAW_FAR, RAW_NEAR};

use rccar::app::events::AppEvent;
use rccar::app::service::VehicleService;
use rccar::config::VehicleConfig;
use rccar::error::SensorError;
use rccar::sound::Asset;
use rccar::vehicle::{Direction, DriveDirection, DriveSide};

struct Rig {
    app: VehicleService,
    hw: MockHardware,
    store: MockStore,
    player: MockPlayer,
    sink: LogSink,
}

impl Rig {
    fn new() -> Self {
        let mut app = VehicleService::new(VehicleConfig::default(), true);
        let mut hw = MockHardware::new();
        let mut sink = LogSink::new();
        app.start(&mut hw, &mut sink);
        Self {
            app,
            hw,
            store: MockStore::new(),
            player: MockPlayer::new(),
            sink,
        }
    }

    fn send(&mut self, payload: &str) {
        self.app
            .handle_payload(payload.as_bytes(), &mut self.hw, &mut self.sink);
    }

    fn tick(&mut self, now_ms: u64) {
        self.app.tick(
            now_ms,
            &mut self.hw,
            &mut self.store,
            &mut self.player,
            &mut self.sink,
        );
    }

    fn avoidance_on(&mut self) {
        self.send("toggle1");
        assert!(self.app.state().obstacle_avoidance_enabled);
    }
}

// ── Driving ───────────────────────────────────────────────────

#[test]
fn start_drives_outputs_to_power_on_levels() {
    let rig = Rig::new();
    assert_eq!(
        rig.hw.both_sides(),
        (Some(DriveDirection::Stopped), Some(DriveDirection::Stopped))
    );
    assert_eq!(rig.hw.duty(DriveSide::Left), Some(255));
    assert_eq!(rig.hw.duty(DriveSide::Right), Some(255));
    assert!(!rig.hw.headlights && !rig.hw.taillights);
    assert_eq!(rig.sink.events, vec![AppEvent::Started]);
}

#[test]
fn forward_then_stop_lights_the_taillights() {
    let mut rig = Rig::new();

    rig.send("move1");
    assert_eq!(rig.app.state().direction, Direction::Forward);
    assert!(rig.app.state().accelerating);
    assert!(!rig.hw.taillights, "taillights off while moving");

    rig.send("move0");
    let s = rig.app.state();
    assert_eq!(s.direction, Direction::Stopped);
    assert!(!s.accelerating && !s.reversing);
    assert_eq!(
        rig.hw.both_sides(),
        (Some(DriveDirection::Stopped), Some(DriveDirection::Stopped))
    );
    assert!(rig.hw.taillights);
}

#[test]
fn turning_drives_the_sides_against_each_other() {
    let mut rig = Rig::new();
    rig.send("move2");
    assert_eq!(
        rig.hw.both_sides(),
        (Some(DriveDirection::Backward), Some(DriveDirection::Forward))
    );
    rig.send("move3");
    assert_eq!(
        rig.hw.both_sides(),
        (Some(DriveDirection::Forward), Some(DriveDirection::Backward))
    );
}

#[test]
fn speed_sets_level_and_both_duties() {
    let mut rig = Rig::new();
    rig.send("speed200");
    assert_eq!(rig.app.state().speed_level, 200);
    assert_eq!(rig.hw.duty(DriveSide::Left), Some(200));
    assert_eq!(rig.hw.duty(DriveSide::Right), Some(200));
}

#[test]
fn headlights_flip_once_per_toggle() {
    let mut rig = Rig::new();
    rig.send("toggle2");
    assert!(rig.hw.headlights);
    rig.send("toggle2");
    assert!(!rig.hw.headlights);
    rig.send("toggle2");
    assert!(rig.hw.headlights);
}

#[test]
fn horn_follows_activate() {
    let mut rig = Rig::new();
    rig.send("activate1");
    assert!(rig.app.state().honking);
    rig.send("activate0");
    assert!(!rig.app.state().honking);
}

#[test]
fn unknown_payload_changes_nothing() {
    let mut rig = Rig::new();
    rig.send("move1");
    let before = *rig.app.state();
    rig.hw.clear();

    rig.send("xyz9");

    assert_eq!(*rig.app.state(), before);
    assert!(rig.hw.calls.is_empty());
    assert_eq!(rig.app.commands_dropped(), 1);
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::CommandDropped));
}

// ── Obstacle override ─────────────────────────────────────────

#[test]
fn obstacle_takes_over_within_one_tick_and_releases() {
    let mut rig = Rig::new();
    rig.avoidance_on();
    rig.send("move1");

    rig.hw.raw = Ok(RAW_NEAR);
    rig.tick(100);
    let s = *rig.app.state();
    assert!(s.obstacle_override_active);
    assert_eq!(s.direction, Direction::Backward);
    assert!(s.reversing && !s.accelerating);
    assert_eq!(
        rig.hw.both_sides(),
        (Some(DriveDirection::Backward), Some(DriveDirection::Backward))
    );
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::ObstacleDetected { .. })),
        1
    );

    rig.hw.raw = Ok(RAW_FAR);
    rig.tick(349);
    assert!(rig.app.state().obstacle_override_active, "249 ms is too early");

    rig.tick(350);
    let s = *rig.app.state();
    assert!(!s.obstacle_override_active);
    assert!(!s.reversing);
    assert_eq!(s.direction, Direction::Stopped);
    assert!(rig.hw.taillights);
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::OverrideReleased));
}

#[test]
fn new_detection_restarts_the_reversing_window() {
    let mut rig = Rig::new();
    rig.avoidance_on();
    rig.hw.raw = Ok(RAW_NEAR);

    rig.tick(100);
    rig.tick(300);
    assert_eq!(rig.app.state().override_started_ms, 300);

    rig.hw.raw = Ok(RAW_FAR);
    rig.tick(400);
    rig.tick(549);
    assert!(rig.app.state().obstacle_override_active);
    rig.tick(550);
    assert!(!rig.app.state().obstacle_override_active);
}

#[test]
fn operator_move_cancels_the_override() {
    let mut rig = Rig::new();
    rig.avoidance_on();
    rig.hw.raw = Ok(RAW_NEAR);
    rig.tick(100);
    assert!(rig.app.state().obstacle_override_active);

    rig.send("move1");
    let s = *rig.app.state();
    assert!(!s.obstacle_override_active);
    assert_eq!(s.direction, Direction::Forward);
    assert!(s.accelerating && !s.reversing);
}

#[test]
fn monitor_is_idle_while_avoidance_is_off() {
    let mut rig = Rig::new();
    rig.hw.raw = Ok(RAW_NEAR);
    rig.tick(100);
    rig.tick(200);
    assert_eq!(rig.hw.samples, 0);
    assert!(!rig.app.state().obstacle_override_active);
}

#[test]
fn sensor_failures_are_counted_not_fatal() {
    let mut rig = Rig::new();
    rig.avoidance_on();
    rig.hw.raw = Err(SensorError::AdcReadFailed);
    rig.tick(100);
    rig.tick(200);
    let t = rig.app.build_telemetry();
    assert_eq!(t.sensor_failures, 2);
    assert!(!t.override_active);
    assert_eq!(t.last_distance_cm, None);
}

// ── Sound ─────────────────────────────────────────────────────

#[test]
fn horn_plays_while_held_and_stops_on_release() {
    let mut rig = Rig::new();
    rig.send("activate1");
    rig.tick(10);
    assert_eq!(rig.player.current.as_deref(), Some("/horn.wav"));
    assert!(rig.sink.events.contains(&AppEvent::SoundStarted(Asset::Horn)));

    rig.tick(20);
    assert!(rig.player.pumps >= 1);

    rig.send("activate0");
    rig.tick(30);
    assert_eq!(rig.player.current, None);
    assert_eq!(rig.player.stops, 1);
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::SoundStopped));

    rig.tick(40);
    assert_eq!(rig.player.stops, 1, "stop is issued once");
}

#[test]
fn acceleration_wins_from_idle() {
    let mut rig = Rig::new();
    rig.send("activate1");
    rig.send("move1");
    rig.tick(10);
    assert_eq!(rig.player.current.as_deref(), Some("/acceleration.wav"));
    assert_eq!(rig.app.playing(), Some(Asset::Acceleration));
}

#[test]
fn running_clip_is_not_preempted() {
    let mut rig = Rig::new();
    rig.send("activate1");
    rig.tick(10);
    rig.send("move1");
    rig.tick(20);
    assert_eq!(rig.player.current.as_deref(), Some("/horn.wav"));
    assert_eq!(rig.store.opened, vec!["/horn.wav".to_string()]);
}

#[test]
fn playback_continues_while_any_condition_holds() {
    let mut rig = Rig::new();
    rig.send("move1");
    rig.send("activate1");
    rig.tick(10);
    rig.send("move0");
    rig.tick(20);
    assert_eq!(rig.player.stops, 0, "horn still held");
    assert!(rig.player.current.is_some());
}

#[test]
fn finished_clip_loops_without_a_new_event() {
    let mut app = VehicleService::new(VehicleConfig::default(), true);
    let mut hw = MockHardware::new();
    let mut sink = LogSink::new();
    let mut store = MockStore::new();
    let mut player = MockPlayer::with_clip_len(1);

    app.handle_payload(b"activate1", &mut hw, &mut sink);
    app.tick(10, &mut hw, &mut store, &mut player, &mut sink);
    app.tick(20, &mut hw, &mut store, &mut player, &mut sink);
    assert!(player.current.is_none(), "clip ran out");
    app.tick(30, &mut hw, &mut store, &mut player, &mut sink);

    assert_eq!(store.opened.len(), 2);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SoundStarted(_))),
        1
    );
}

#[test]
fn no_storage_means_silence() {
    let mut app = VehicleService::new(VehicleConfig::default(), false);
    let mut hw = MockHardware::new();
    let mut sink = LogSink::new();
    let mut store = MockStore::new();
    let mut player = MockPlayer::new();

    app.handle_payload(b"activate1", &mut hw, &mut sink);
    app.tick(10, &mut hw, &mut store, &mut player, &mut sink);

    assert!(store.opened.is_empty());
    assert!(player.current.is_none());
}

#[test]
fn missing_asset_does_not_stop_the_car() {
    let mut rig = Rig::new();
    rig.store.missing.push("/acceleration.wav");
    rig.send("move1");
    rig.tick(10);
    rig.tick(20);
    assert!(rig.player.current.is_none());
    assert_eq!(rig.app.state().direction, Direction::Forward);
}
