//! Pure transition functions.
//!
//! ```text
//!            ┌──────────── move1 ───────────┐
//!            ▼                              │
//!   STOPPED ──move4──▶ BACKWARD        FORWARD
//!     ▲  ▲                 │              │
//!     │  └──── move0 ──────┴──── move0 ───┘
//!     │
//!     │        obstacle ≤ threshold (any state)
//!     │                 │
//!     │                 ▼
//!     └─[250 ms]── OVERRIDE (reversing, operator locked out)
//!                      │
//!                operator move ──▶ stop both sides, clear, apply
//! ```
//!
//! Every function takes the current state by reference and returns a
//! [`Transition`]; nothing here writes to hardware.

use crate::app::commands::Command;
use crate::config::VehicleConfig;

use super::{
    Actuation, ActuationPlan, Direction, DriveSide, Output, Transition, VehicleState, features,
    motion,
};

/// Apply one decoded operator command.
pub fn apply(state: &VehicleState, command: &Command) -> Transition {
    let mut next = *state;
    let mut plan = ActuationPlan::new();

    match *command {
        Command::Move(code) => move_wheels(&mut next, &mut plan, Direction::from_code(code)),
        Command::Activate(code) => features::activate(&mut next, code),
        Command::Toggle(code) => features::toggle(&mut next, &mut plan, code),
        Command::SetSpeed(value) => set_speed(&mut next, &mut plan, value),
    }

    Transition { state: next, plan }
}

/// Seize control after an obstacle: stop, then reverse, and (re)start the
/// release window at `now_ms`.
pub fn engage_override(state: &VehicleState, now_ms: u64) -> Transition {
    let mut next = *state;
    let mut plan = ActuationPlan::new();

    move_wheels(&mut next, &mut plan, Direction::Stopped);
    next.accelerating = false;
    move_wheels(&mut next, &mut plan, Direction::Backward);
    next.reversing = true;
    next.obstacle_override_active = true;
    next.override_started_ms = now_ms;

    Transition { state: next, plan }
}

/// End the reversing window: stop and hand control back to the operator.
pub fn release_override(state: &VehicleState) -> Transition {
    let mut next = *state;
    let mut plan = ActuationPlan::new();

    move_wheels(&mut next, &mut plan, Direction::Stopped);
    next.obstacle_override_active = false;
    next.reversing = false;

    Transition { state: next, plan }
}

/// Actuation that brings the outputs to the power-on state: both sides
/// stopped at `default_speed`, lights off.
pub fn power_on_plan(config: &VehicleConfig) -> ActuationPlan {
    let mut plan = ActuationPlan::new();
    motion::plan_stop(&mut plan);
    for side in DriveSide::BOTH {
        plan.push(Actuation::Speed {
            side,
            duty: config.default_speed,
        });
    }
    for output in [Output::Headlights, Output::Taillights] {
        plan.push(Actuation::SetOutput { output, on: false });
    }
    plan
}

fn move_wheels(state: &mut VehicleState, plan: &mut ActuationPlan, direction: Direction) {
    // Both polarity pins of a bridge must never be high together: after an
    // override the bridge may still be reversing, so stop it first.
    if state.obstacle_override_active {
        motion::plan_stop(plan);
        state.obstacle_override_active = false;
    }

    motion::plan_drive(plan, direction);
    state.direction = direction;

    let taillights_on = direction == Direction::Stopped;
    plan.push(Actuation::SetOutput {
        output: Output::Taillights,
        on: taillights_on,
    });

    match direction {
        Direction::Forward => {
            state.accelerating = true;
            state.reversing = false;
        }
        Direction::Backward => {
            state.accelerating = false;
            state.reversing = true;
        }
        Direction::Left | Direction::Right => {}
        Direction::Stopped => {
            state.accelerating = false;
            state.reversing = false;
        }
    }
}

fn set_speed(state: &mut VehicleState, plan: &mut ActuationPlan, value: u32) {
    let duty = value.min(u32::from(u8::MAX)) as u8;
    for side in DriveSide::BOTH {
        plan.push(Actuation::Speed { side, duty });
    }
    state.speed_level = value;
}
