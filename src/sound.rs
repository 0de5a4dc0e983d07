//! Sound arbitration.
//!
//! Three looping assets compete for a single playback voice.  Priority is
//! acceleration, then horn, then reversing, and only decides which clip
//! starts from idle: a running clip is never preempted while any
//! condition is still active.  Playback stops once all three conditions
//! are false.  An asset that fails to start is not retried until its
//! condition has dropped.
//!
//! [`decide`] is pure; [`SoundController`] executes its verdict through
//! the [`AssetStore`] and [`PlaybackEngine`] ports.

use log::{debug, info, warn};

use crate::app::ports::{AssetStore, PlaybackEngine};
use crate::config::VehicleConfig;
use crate::vehicle::VehicleState;

/// A playable sound effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    Acceleration,
    Horn,
    Reversing,
}

impl Asset {
    /// Arbitration order, highest priority first.
    pub const PRIORITY: [Asset; 3] = [Asset::Acceleration, Asset::Horn, Asset::Reversing];

    pub fn path<'a>(&self, config: &'a VehicleConfig) -> &'a str {
        match self {
            Self::Acceleration => &config.acceleration_sound_path,
            Self::Horn => &config.horn_sound_path,
            Self::Reversing => &config.reversing_sound_path,
        }
    }
}

/// Which sound conditions hold this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoundRequest {
    pub accelerating: bool,
    pub honking: bool,
    pub reversing: bool,
}

impl SoundRequest {
    pub fn from_state(state: &VehicleState) -> Self {
        Self {
            accelerating: state.accelerating,
            honking: state.honking,
            reversing: state.reversing,
        }
    }

    pub fn is_active(&self, asset: Asset) -> bool {
        match asset {
            Asset::Acceleration => self.accelerating,
            Asset::Horn => self.honking,
            Asset::Reversing => self.reversing,
        }
    }

    /// Highest-priority active asset.
    pub fn first_active(&self) -> Option<Asset> {
        Asset::PRIORITY.into_iter().find(|a| self.is_active(*a))
    }

    pub fn any(&self) -> bool {
        self.first_active().is_some()
    }

    /// Conditions set here and in `other`.
    pub fn intersect(&self, other: &SoundRequest) -> Self {
        Self {
            accelerating: self.accelerating && other.accelerating,
            honking: self.honking && other.honking,
            reversing: self.reversing && other.reversing,
        }
    }

    /// Conditions set here but not in `other`.
    pub fn without(&self, other: &SoundRequest) -> Self {
        Self {
            accelerating: self.accelerating && !other.accelerating,
            honking: self.honking && !other.honking,
            reversing: self.reversing && !other.reversing,
        }
    }

    fn insert(&mut self, asset: Asset) {
        match asset {
            Asset::Acceleration => self.accelerating = true,
            Asset::Horn => self.honking = true,
            Asset::Reversing => self.reversing = true,
        }
    }
}

/// Verdict of one arbitration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundAction {
    /// Open and begin the asset from its start.
    Start(Asset),
    /// Keep feeding the running clip.
    Continue,
    /// Halt playback.
    Stop,
    Idle,
}

/// Pure arbitration step.
pub fn decide(request: &SoundRequest, running: bool, sound_stopped: bool) -> SoundAction {
    match request.first_active() {
        Some(asset) if !running => SoundAction::Start(asset),
        Some(_) => SoundAction::Continue,
        None if !sound_stopped => SoundAction::Stop,
        None => SoundAction::Idle,
    }
}

/// Something observable happened to playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEvent {
    Started(Asset),
    Stopped,
}

pub struct SoundController {
    config: VehicleConfig,
    enabled: bool,
    sound_stopped: bool,
    playing: Option<Asset>,
    /// Assets that failed to start; skipped until their condition drops.
    refused: SoundRequest,
}

impl SoundController {
    /// `storage_available` comes from the asset store at boot; without it
    /// the controller stays silent for the lifetime of the process.
    pub fn new(config: &VehicleConfig, storage_available: bool) -> Self {
        if !storage_available {
            warn!("asset storage unavailable, sound disabled");
        }
        Self {
            config: config.clone(),
            enabled: storage_available,
            sound_stopped: true,
            playing: None,
            refused: SoundRequest::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Asset most recently started, while playback has not been stopped.
    pub fn playing(&self) -> Option<Asset> {
        self.playing
    }

    /// Run one arbitration pass against `state`.
    pub fn tick<S, P>(
        &mut self,
        state: &VehicleState,
        store: &mut S,
        player: &mut P,
    ) -> Option<SoundEvent>
    where
        S: AssetStore,
        P: PlaybackEngine<S::Stream>,
    {
        if !self.enabled {
            return None;
        }

        let wanted = SoundRequest::from_state(state);
        self.refused = self.refused.intersect(&wanted);
        let request = wanted.without(&self.refused);
        match decide(&request, player.is_running(), self.sound_stopped) {
            SoundAction::Start(asset) => self.start(asset, store, player),
            SoundAction::Continue => {
                if !player.pump() {
                    debug!("{:?} clip ended, restarting next pass", self.playing);
                }
                self.sound_stopped = false;
                None
            }
            SoundAction::Stop => {
                player.stop();
                self.sound_stopped = true;
                self.playing = None;
                Some(SoundEvent::Stopped)
            }
            SoundAction::Idle => None,
        }
    }

    fn start<S, P>(&mut self, asset: Asset, store: &mut S, player: &mut P) -> Option<SoundEvent>
    where
        S: AssetStore,
        P: PlaybackEngine<S::Stream>,
    {
        let path = asset.path(&self.config);
        let result = store
            .open(path)
            .map_err(crate::error::Error::from)
            .and_then(|stream| player.begin(stream).map_err(crate::error::Error::from));

        match result {
            Ok(()) => {
                self.sound_stopped = false;
                let restarted = self.playing == Some(asset);
                self.playing = Some(asset);
                if restarted {
                    None
                } else {
                    info!("playing {}", path);
                    Some(SoundEvent::Started(asset))
                }
            }
            Err(e) => {
                warn!("cannot play {}: {}", path, e);
                self.refused.insert(asset);
                None
            }
        }
    }
}
