//! Vehicle state machine.
//!
//! The machine is split into a **pure** transition step and a thin
//! actuation step:
//!
//! ```text
//!   VehicleState + Command ──▶ transition::apply ──▶ Transition
//!                                                    ├─ state (new VehicleState)
//!                                                    └─ plan  (Actuation intents)
//!
//!   plan ──▶ motion::apply ──▶ DrivePort (pins, PWM)
//! ```
//!
//! Nothing in [`transition`] touches hardware, so every rule can be tested
//! against a constructed [`VehicleState`].

pub mod features;
pub mod motion;
pub mod state;
pub mod transition;

pub use state::VehicleState;

// ---------------------------------------------------------------------------
// Direction codes
// ---------------------------------------------------------------------------

/// Whole-vehicle motion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Stopped,
    Forward,
    Left,
    Right,
    Backward,
}

impl Direction {
    /// Map a `move` command code to a direction.  Unknown codes stop.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Forward,
            2 => Self::Left,
            3 => Self::Right,
            4 => Self::Backward,
            _ => Self::Stopped,
        }
    }
}

/// One of the two independently driven wheel groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveSide {
    Left,
    Right,
}

impl DriveSide {
    pub const BOTH: [DriveSide; 2] = [DriveSide::Left, DriveSide::Right];
}

/// Polarity of a single drive side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveDirection {
    #[default]
    Stopped,
    Forward,
    Backward,
}

/// Digital light circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Headlights,
    Taillights,
}

// ---------------------------------------------------------------------------
// Actuation intents
// ---------------------------------------------------------------------------

/// One hardware action requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    Drive { side: DriveSide, direction: DriveDirection },
    Speed { side: DriveSide, duty: u8 },
    SetOutput { output: Output, on: bool },
    /// Read the current level and write its inverse.
    ToggleOutput(Output),
}

/// Upper bound on intents produced by a single transition (an obstacle
/// override chains two moves plus the interlock stop).
pub const MAX_PLAN_LEN: usize = 16;

/// Ordered list of intents, applied front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActuationPlan {
    steps: heapless::Vec<Actuation, MAX_PLAN_LEN>,
}

impl ActuationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Actuation) {
        if self.steps.push(step).is_err() {
            debug_assert!(false, "actuation plan overflow");
            log::warn!("actuation plan full, dropped {:?}", step);
        }
    }

    pub fn extend(&mut self, other: &ActuationPlan) {
        for step in other.iter() {
            self.push(*step);
        }
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Actuation> {
        self.steps.iter()
    }

    pub fn as_slice(&self) -> &[Actuation] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Result of a pure transition: the next state plus what to do to the pins.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: VehicleState,
    pub plan: ActuationPlan,
}
