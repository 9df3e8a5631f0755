//! MIDI input parsing
//!
//! Raw bytes arrive from a device thread (or the console) through
//! [`crate::MidiBridge`] and are parsed here on the engine thread.

use crate::types::MidiAddress;
use crate::MidiError;

/// Raw MIDI input event (before mapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiInputEvent {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, cc: u8, value: u8 },
}

impl MidiInputEvent {
    /// Parse raw MIDI bytes into an event
    ///
    /// - Note Off: 0x8n nn vv (n=channel, nn=note, vv=velocity)
    /// - Note On: 0x9n nn vv (velocity 0 is a Note Off)
    /// - Control Change: 0xBn cc vv
    ///
    /// Anything else (pitch bend, aftertouch, sysex, truncated messages) is `None`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;
        if rest.len() < 2 {
            return None;
        }
        let channel = status & 0x0F;
        let (first, second) = (rest[0] & 0x7F, rest[1] & 0x7F);

        match status & 0xF0 {
            0x80 => Some(Self::NoteOff { channel, note: first, velocity: second }),
            0x90 if second == 0 => Some(Self::NoteOff { channel, note: first, velocity: 0 }),
            0x90 => Some(Self::NoteOn { channel, note: first, velocity: second }),
            0xB0 => Some(Self::ControlChange { channel, cc: first, value: second }),
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. } => *channel,
        }
    }

    /// Address of the control that produced this event
    pub fn address(&self) -> MidiAddress {
        match *self {
            Self::NoteOn { channel, note, .. } | Self::NoteOff { channel, note, .. } => {
                MidiAddress::note(channel, note)
            }
            Self::ControlChange { channel, cc, .. } => MidiAddress::cc(channel, cc),
        }
    }

    /// Check if this event comes from `control`
    pub fn matches(&self, control: &MidiAddress) -> bool {
        self.address() == *control
    }

    /// "Press": Note On, or CC above the midpoint
    pub fn is_press(&self) -> bool {
        match self {
            Self::NoteOn { velocity, .. } => *velocity > 0,
            Self::ControlChange { value, .. } => *value > 63,
            Self::NoteOff { .. } => false,
        }
    }

    /// Velocity for notes, value for CC
    pub fn value(&self) -> u8 {
        match self {
            Self::NoteOn { velocity, .. } | Self::NoteOff { velocity, .. } => *velocity,
            Self::ControlChange { value, .. } => *value,
        }
    }
}

/// Parse a whitespace-separated hex byte string such as `"b0 07 7f"`
///
/// An optional `0x` prefix per byte is accepted.
pub fn parse_hex_bytes(text: &str) -> Result<Vec<u8>, MidiError> {
    let bytes = text
        .split_whitespace()
        .map(|token| {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            u8::from_str_radix(digits, 16).map_err(|_| MidiError::InvalidBytes(text.to_string()))
        })
        .collect::<Result<Vec<u8>, MidiError>>()?;

    if bytes.is_empty() {
        return Err(MidiError::InvalidBytes(text.to_string()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_on() {
        let event = MidiInputEvent::parse(&[0x90, 0x3C, 0x7F]).unwrap();
        assert_eq!(event, MidiInputEvent::NoteOn { channel: 0, note: 0x3C, velocity: 0x7F });
        assert!(event.is_press());
    }

    #[test]
    fn test_parse_note_off() {
        let event = MidiInputEvent::parse(&[0x80, 0x3C, 0x40]).unwrap();
        assert_eq!(event, MidiInputEvent::NoteOff { channel: 0, note: 0x3C, velocity: 0x40 });
        assert!(!event.is_press());
    }

    #[test]
    fn test_parse_note_on_zero_velocity() {
        let event = MidiInputEvent::parse(&[0x91, 0x3C, 0x00]).unwrap();
        assert_eq!(event, MidiInputEvent::NoteOff { channel: 1, note: 0x3C, velocity: 0 });
    }

    #[test]
    fn test_parse_cc() {
        let event = MidiInputEvent::parse(&[0xB2, 0x07, 0x64]).unwrap();
        assert_eq!(event, MidiInputEvent::ControlChange { channel: 2, cc: 0x07, value: 0x64 });
        assert_eq!(event.channel(), 2);
        assert_eq!(event.value(), 0x64);
    }

    #[test]
    fn test_parse_ignores_other_messages() {
        assert!(MidiInputEvent::parse(&[]).is_none());
        assert!(MidiInputEvent::parse(&[0xB0, 0x07]).is_none());
        assert!(MidiInputEvent::parse(&[0xE0, 0x00, 0x40]).is_none()); // pitch bend
        assert!(MidiInputEvent::parse(&[0xF8]).is_none()); // clock
    }

    #[test]
    fn test_matches() {
        let event = MidiInputEvent::NoteOn { channel: 0, note: 0x0B, velocity: 127 };
        assert!(event.matches(&MidiAddress::note(0, 0x0B)));
        assert!(!event.matches(&MidiAddress::note(0, 0x0C)));
        assert!(!event.matches(&MidiAddress::cc(0, 0x0B)));

        let cc = MidiInputEvent::ControlChange { channel: 1, cc: 0x13, value: 64 };
        assert!(cc.matches(&MidiAddress::cc(1, 0x13)));
    }

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("b0 07 7f").unwrap(), vec![0xB0, 0x07, 0x7F]);
        assert_eq!(parse_hex_bytes("0x90 0x24 0x40").unwrap(), vec![0x90, 0x24, 0x40]);
        assert!(matches!(parse_hex_bytes("zz"), Err(MidiError::InvalidBytes(_))));
        assert!(parse_hex_bytes("   ").is_err());
    }
}
