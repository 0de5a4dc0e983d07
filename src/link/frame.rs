//! WebSocket frame metadata and the command-frame filter.

/// WebSocket frame opcode, as far as the control link cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    /// Decode the low nibble of the first frame header byte.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x0F {
            0x0 => Some(Self::Continuation),
            0x1 => Some(Self::Text),
            0x2 => Some(Self::Binary),
            0x8 => Some(Self::Close),
            0x9 => Some(Self::Ping),
            0xA => Some(Self::Pong),
            _ => None,
        }
    }
}

/// Header facts about one received data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Final fragment of the message.
    pub fin: bool,
    /// Byte offset of this chunk within the frame.
    pub offset: usize,
    /// Declared length of the whole frame.
    pub total_len: usize,
    pub opcode: Opcode,
}

impl FrameInfo {
    /// A single, unfragmented text frame.
    pub fn text(len: usize) -> Self {
        Self {
            fin: true,
            offset: 0,
            total_len: len,
            opcode: Opcode::Text,
        }
    }

    /// Only a complete text frame delivered in one chunk carries a command.
    pub fn carries_command(&self, received: usize) -> bool {
        self.fin && self.offset == 0 && self.total_len == received && self.opcode == Opcode::Text
    }
}
