//! Feedback output
//!
//! Parameter changes are turned into MIDI messages for feedback-enabled
//! controls (LED rings, motor faders). A [`FeedbackChangeTracker`] keeps the
//! last value sent per control so repeated values are not resent.

use crate::types::MidiAddress;
use crate::MidiError;
use flume::Sender;
use std::collections::HashMap;

/// Change tracker for feedback output
///
/// Remembers last-sent values per control address to avoid redundant sends.
#[derive(Debug, Default)]
pub struct FeedbackChangeTracker {
    last_values: HashMap<MidiAddress, u8>,
}

impl FeedbackChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(value)` if the value changed (should send), `None` if unchanged.
    pub fn update(&mut self, address: &MidiAddress, value: u8) -> Option<u8> {
        if self.last_values.get(address) == Some(&value) {
            None
        } else {
            self.last_values.insert(*address, value);
            Some(value)
        }
    }

    /// Forget everything; the next update for each address sends again
    pub fn clear(&mut self) {
        self.last_values.clear();
    }

    /// All tracked addresses (for clearing LEDs on disconnect)
    pub fn tracked_addresses(&self) -> impl Iterator<Item = &MidiAddress> {
        self.last_values.keys()
    }
}

/// Destination of outgoing MIDI bytes
pub trait MidiSink {
    fn send(&self, message: &[u8]) -> Result<(), MidiError>;
}

/// Sink that hands messages to an output thread over a channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Vec<u8>>,
}

impl ChannelSink {
    pub fn new(tx: Sender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

impl MidiSink for ChannelSink {
    fn send(&self, message: &[u8]) -> Result<(), MidiError> {
        self.tx
            .try_send(message.to_vec())
            .map_err(|e| MidiError::OutputError(e.to_string()))
    }
}
