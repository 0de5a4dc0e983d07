//! Fuzz target: `commands::decode` → `transition::apply`
//!
//! Splits the input on newlines and treats each piece as one operator
//! payload.  Decoding must never panic, and whatever decodes must keep
//! the drive flags exclusive.
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use rccar::app::commands::decode;
use rccar::vehicle::{VehicleState, transition};

fuzz_target!(|data: &[u8]| {
    let mut state = VehicleState::default();

    for payload in data.split(|b| *b == b'\n') {
        let Some(cmd) = decode(payload) else { continue };
        let t = transition::apply(&state, &cmd);
        assert!(t.state.is_consistent(), "{:?} after {:?}", t.state, cmd);
        state = t.state;
    }
});
