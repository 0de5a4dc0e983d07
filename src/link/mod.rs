//! Operator link: the boundary between the WebSocket server and the
//! control loop.
//!
//! ```text
//!  WS server task ──LinkEvent──▶ SharedTransport ──poll_message──▶ ControlLoop
//! ```
//!
//! The server side only filters and buffers.  Decoding and applying a
//! command happens on the control loop, one message at a time.

pub mod frame;
pub mod transport;

pub use frame::{FrameInfo, Opcode};
pub use transport::{NullTransport, QueuedTransport, SharedTransport, Transport};

/// Longest payload buffered for the control loop.  The longest valid
/// command is `activate` + one digit; `speed` values need a few more.
pub const MAX_MESSAGE_LEN: usize = 64;

/// One buffered inbound payload.
pub type Message = heapless::Vec<u8, MAX_MESSAGE_LEN>;

/// Something that happened on the WebSocket endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent<'a> {
    Connected { client: u32 },
    Disconnected { client: u32 },
    Data {
        client: u32,
        frame: FrameInfo,
        payload: &'a [u8],
    },
    Pong { client: u32 },
    Error { client: u32 },
}
