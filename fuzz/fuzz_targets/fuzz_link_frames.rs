//! Fuzz target: `QueuedTransport::on_event`
//!
//! Each record is a header byte (FIN bit + opcode nibble), an offset
//! byte, a declared-length byte, then a payload whose length is the next
//! byte.  The queue must stay bounded and only ever hand out payloads
//! that fit a message.
//!
//! cargo fuzz run fuzz_link_frames

#![no_main]

use libfuzzer_sys::fuzz_target;
use rccar::link::{FrameInfo, LinkEvent, MAX_MESSAGE_LEN, Opcode, QueuedTransport, Transport};

fuzz_target!(|data: &[u8]| {
    let mut link: QueuedTransport<8> = QueuedTransport::new();
    let mut rest = data;

    while let [header, offset, total, len, tail @ ..] = rest {
        let len = usize::from(*len).min(tail.len());
        let (payload, next) = tail.split_at(len);
        rest = next;

        let Some(opcode) = Opcode::from_bits(*header) else { continue };
        let frame = FrameInfo {
            fin: header & 0x80 != 0,
            offset: usize::from(*offset),
            total_len: usize::from(*total),
            opcode,
        };
        let queued = link.on_event(LinkEvent::Data { client: 0, frame, payload });
        if queued {
            assert!(frame.carries_command(payload.len()));
        }
        assert!(link.len() <= 8);
    }

    while let Some(msg) = link.poll_message() {
        assert!(msg.len() <= MAX_MESSAGE_LEN);
    }
});
