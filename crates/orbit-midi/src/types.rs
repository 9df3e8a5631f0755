//! MIDI control addresses

use serde::{Deserialize, Serialize};
use std::fmt;

/// MIDI-specific address (channel + note/CC)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MidiAddress {
    /// Note On/Off message
    Note {
        /// MIDI channel (0-15)
        channel: u8,
        /// Note number (0-127)
        note: u8,
    },
    /// Control Change message
    #[serde(rename = "control_change")]
    CC {
        /// MIDI channel (0-15)
        channel: u8,
        /// CC number (0-127)
        cc: u8,
    },
}

impl MidiAddress {
    pub fn note(channel: u8, note: u8) -> Self {
        Self::Note { channel, note }
    }

    pub fn cc(channel: u8, cc: u8) -> Self {
        Self::CC { channel, cc }
    }

    pub fn channel(&self) -> u8 {
        match self {
            Self::Note { channel, .. } | Self::CC { channel, .. } => *channel,
        }
    }

    /// Encode an outgoing message carrying `value` (0-127)
    ///
    /// Notes become Note On, or Note Off when `value` is 0.
    pub fn encode(&self, value: u8) -> [u8; 3] {
        let value = value.min(127);
        match *self {
            Self::Note { channel, note } if value > 0 => [0x90 | (channel & 0x0F), note, value],
            Self::Note { channel, note } => [0x80 | (channel & 0x0F), note, 0],
            Self::CC { channel, cc } => [0xB0 | (channel & 0x0F), cc, value],
        }
    }
}

impl fmt::Display for MidiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Note { channel, note } => write!(f, "Note ch={} note={:#04x}", channel, note),
            Self::CC { channel, cc } => write!(f, "CC ch={} cc={:#04x}", channel, cc),
        }
    }
}
