//! Motion actuator.
//!
//! Maps a whole-vehicle [`Direction`] onto the two drive sides of the
//! differential drive, and applies an [`ActuationPlan`] to a [`DrivePort`].
//!
//! | Direction | Left side | Right side |
//! |-----------|-----------|------------|
//! | Forward   | Forward   | Forward    |
//! | Backward  | Backward  | Backward   |
//! | Left      | Backward  | Forward    |
//! | Right     | Forward   | Backward   |
//! | Stopped   | Stopped   | Stopped    |

use log::debug;

use super::{Actuation, ActuationPlan, Direction, DriveDirection, DriveSide};
use crate::app::ports::DrivePort;

/// Per-side polarity for a whole-vehicle direction, as `(left, right)`.
pub fn side_directions(direction: Direction) -> (DriveDirection, DriveDirection) {
    match direction {
        Direction::Forward => (DriveDirection::Forward, DriveDirection::Forward),
        Direction::Backward => (DriveDirection::Backward, DriveDirection::Backward),
        Direction::Left => (DriveDirection::Backward, DriveDirection::Forward),
        Direction::Right => (DriveDirection::Forward, DriveDirection::Backward),
        Direction::Stopped => (DriveDirection::Stopped, DriveDirection::Stopped),
    }
}

/// Append the drive intents for `direction` to `plan`.
pub fn plan_drive(plan: &mut ActuationPlan, direction: Direction) {
    let (left, right) = side_directions(direction);
    plan.push(Actuation::Drive {
        side: DriveSide::Left,
        direction: left,
    });
    plan.push(Actuation::Drive {
        side: DriveSide::Right,
        direction: right,
    });
}

/// Append a stop of both drive sides to `plan`.
pub fn plan_stop(plan: &mut ActuationPlan) {
    plan_drive(plan, Direction::Stopped);
}

/// Execute a plan against the hardware, front to back.
pub fn apply(plan: &ActuationPlan, hw: &mut impl DrivePort) {
    for step in plan.iter() {
        match *step {
            Actuation::Drive { side, direction } => hw.set_drive_side(side, direction),
            Actuation::Speed { side, duty } => hw.set_drive_speed(side, duty),
            Actuation::SetOutput { output, on } => hw.set_output(output, on),
            Actuation::ToggleOutput(output) => {
                let on = hw.read_output(output);
                hw.set_output(output, !on);
                debug!("{:?} {}", output, if on { "off" } else { "on" });
            }
        }
    }
}
