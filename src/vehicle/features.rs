//! Feature toggler: horn, headlights and the obstacle-avoidance switch.

use log::info;

use super::{Actuation, ActuationPlan, Output, VehicleState};

/// `activate` code that sounds the horn.
pub const ACTIVATE_HORN: u8 = 1;
/// `toggle` code for the obstacle-avoidance feature.
pub const TOGGLE_OBSTACLE_AVOIDANCE: u8 = 1;
/// `toggle` code for the headlights.
pub const TOGGLE_HEADLIGHTS: u8 = 2;

/// Momentary features: the horn is on only while code 1 is held.
pub fn activate(state: &mut VehicleState, code: u8) {
    state.honking = code == ACTIVATE_HORN;
}

/// Latched features.  Headlights have no state flag: the current output
/// level is the state, so the plan asks for a read-and-invert.
pub fn toggle(state: &mut VehicleState, plan: &mut ActuationPlan, code: u8) {
    match code {
        TOGGLE_HEADLIGHTS => plan.push(Actuation::ToggleOutput(Output::Headlights)),
        TOGGLE_OBSTACLE_AVOIDANCE => {
            state.obstacle_avoidance_enabled = !state.obstacle_avoidance_enabled;
            info!(
                "obstacle avoidance {}",
                if state.obstacle_avoidance_enabled { "enabled" } else { "disabled" }
            );
        }
        _ => {}
    }
}
