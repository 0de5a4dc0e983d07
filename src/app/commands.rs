//! Inbound operator commands and their text wire format.
//!
//! ```text
//!   "move"     + digit    → Move(direction code)
//!   "activate" + digit    → Activate(feature code)
//!   "toggle"   + digit    → Toggle(feature code)
//!   "speed"    + decimal  → SetSpeed(duty)
//! ```
//!
//! Decoding is best-effort and never fails loudly: anything that does not
//! match is dropped by returning `None`.

use core::fmt;

/// Commands that the operator link sends into the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Drive in a direction (0 stop, 1 forward, 2 left, 3 right, 4 backward).
    Move(u8),
    /// Momentary feature (1 = horn on, anything else = horn off).
    Activate(u8),
    /// Latched feature (1 = obstacle avoidance, 2 = headlights).
    Toggle(u8),
    /// PWM duty for both drive sides.
    SetSpeed(u32),
}

impl Command {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::Activate(_) => "activate",
            Self::Toggle(_) => "toggle",
            Self::SetSpeed(_) => "speed",
        }
    }

    /// Integer argument carried by the command.
    pub fn value(&self) -> u32 {
        match *self {
            Self::Move(v) | Self::Activate(v) | Self::Toggle(v) => v as u32,
            Self::SetSpeed(v) => v,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command: {}, value: {}", self.name(), self.value())
    }
}

const SPEED_PREFIX: &[u8] = b"speed";

/// Decode one complete text payload.
pub fn decode(payload: &[u8]) -> Option<Command> {
    if let Some(rest) = payload.strip_prefix(SPEED_PREFIX) {
        return Some(Command::SetSpeed(parse_decimal(rest)));
    }

    let (&last, name) = payload.split_last()?;
    if !last.is_ascii_digit() {
        return None;
    }
    let value = last - b'0';

    match name {
        b"move" => Some(Command::Move(value)),
        b"activate" => Some(Command::Activate(value)),
        b"toggle" => Some(Command::Toggle(value)),
        _ => None,
    }
}

/// Leading-digits parse: optional whitespace and `+`, then digits up to the
/// first non-digit.  No digits (or a sign) yields 0; overflow saturates.
fn parse_decimal(bytes: &[u8]) -> u32 {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let mut digits = &bytes[start..];
    if let Some(rest) = digits.strip_prefix(b"+") {
        digits = rest;
    }

    digits
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u32, |acc, b| {
            acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_command_name() {
        assert_eq!(decode(b"move1"), Some(Command::Move(1)));
        assert_eq!(decode(b"move0"), Some(Command::Move(0)));
        assert_eq!(decode(b"activate1"), Some(Command::Activate(1)));
        assert_eq!(decode(b"toggle2"), Some(Command::Toggle(2)));
    }

    #[test]
    fn speed_takes_full_decimal_remainder() {
        assert_eq!(decode(b"speed200"), Some(Command::SetSpeed(200)));
        assert_eq!(decode(b"speed127"), Some(Command::SetSpeed(127)));
        assert_eq!(decode(b"speed 42"), Some(Command::SetSpeed(42)));
        assert_eq!(decode(b"speed+9"), Some(Command::SetSpeed(9)));
    }

    #[test]
    fn malformed_speed_is_zero() {
        assert_eq!(decode(b"speed"), Some(Command::SetSpeed(0)));
        assert_eq!(decode(b"speedfast"), Some(Command::SetSpeed(0)));
        assert_eq!(decode(b"speed-5"), Some(Command::SetSpeed(0)));
        assert_eq!(decode(b"speed12ab"), Some(Command::SetSpeed(12)));
    }

    #[test]
    fn speed_overflow_saturates() {
        assert_eq!(
            decode(b"speed99999999999999"),
            Some(Command::SetSpeed(u32::MAX))
        );
    }

    #[test]
    fn speed_prefix_is_case_sensitive() {
        assert_eq!(decode(b"Speed200"), None);
    }

    #[test]
    fn unknown_names_are_dropped() {
        assert_eq!(decode(b"xyz9"), None);
        assert_eq!(decode(b"moves1"), None);
        assert_eq!(decode(b"1"), None);
    }

    #[test]
    fn missing_trailing_digit_is_dropped() {
        assert_eq!(decode(b"move"), None);
        assert_eq!(decode(b"movex"), None);
        assert_eq!(decode(b""), None);
    }

    #[test]
    fn display_matches_trace_format() {
        assert_eq!(Command::Move(1).to_string(), "command: move, value: 1");
        assert_eq!(
            Command::SetSpeed(200).to_string(),
            "command: speed, value: 200"
        );
    }
}
