//! Fuzz target: `WavPlayer` over arbitrary asset bytes
//!
//! A corrupt file on the SD card must be refused or played out, never
//! panic, and never drive the output past full scale after gain.
//!
//! cargo fuzz run fuzz_wav_header

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use rccar::adapters::audio::{NullPcmOutput, WavPlayer};
use rccar::app::ports::PlaybackEngine;

fuzz_target!(|data: &[u8]| {
    let mut player = WavPlayer::new(NullPcmOutput::default(), 0.15);
    if player.begin(Cursor::new(data.to_vec())).is_err() {
        assert!(!player.is_running());
        return;
    }

    // Every pump consumes input, so this always terminates.
    for _ in 0..=data.len() {
        if !player.pump() {
            break;
        }
    }
    assert!(!player.is_running());
    // 0.15 gain on a 16-bit sample.
    assert!(player.output().peak <= 4916);
});
