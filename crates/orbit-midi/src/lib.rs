//! MIDI control surface for orbit
//!
//! This crate provides:
//! - MIDI message parsing ([`MidiInputEvent`])
//! - YAML device profiles binding notes/CCs to registry parameters
//! - A [`MidiSurface`] controller that writes to and gets feedback from the registry
//! - A channel bridge from the device thread to the engine thread
//!
//! # Architecture
//!
//! ```text
//! device thread ──bytes──▶ MidiBridge (flume) ──drain()──▶ MidiSurface ──▶ ParameterRegistry
//!                                                              ▲                  │
//!                                  MidiSink ◀──feedback bytes──┘◀──on_parameter_changed
//! ```
//!
//! The registry is single-threaded, so the device callback never touches it
//! directly; it only pushes raw bytes into the bridge.

mod config;
mod feedback;
mod input;
mod normalize;
mod surface;
mod types;

pub use config::{
    default_midi_config_path, load_midi_config, normalize_port_name, port_matches, save_midi_config,
    DeviceProfile, EncoderMode, MappingBehavior, MidiConfig, ParameterMapping,
};
pub use feedback::{ChannelSink, FeedbackChangeTracker, MidiSink};
pub use input::{parse_hex_bytes, MidiInputEvent};
pub use normalize::{denormalize_to_midi, encoder_to_delta, normalize_cc_value};
pub use surface::MidiSurface;
pub use types::MidiAddress;

use flume::{Receiver, Sender};

/// Error type for MIDI operations
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("No MIDI device profile matches port '{0}'")]
    NoDeviceFound(String),

    #[error("Invalid MIDI byte string '{0}'")]
    InvalidBytes(String),

    #[error("MIDI output error: {0}")]
    OutputError(String),
}

/// Sending half of the bridge, for the device thread
#[derive(Debug, Clone)]
pub struct MidiInputSender {
    tx: Sender<Vec<u8>>,
}

impl MidiInputSender {
    /// Queue raw bytes without blocking; drops the message when the queue is full
    pub fn send(&self, data: &[u8]) -> bool {
        if self.tx.try_send(data.to_vec()).is_err() {
            log::warn!("MIDI: Message channel full, dropping message");
            return false;
        }
        true
    }
}

/// Bounded queue of raw MIDI input between threads
pub struct MidiBridge {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl MidiBridge {
    pub fn new() -> Self {
        let (tx, rx) = flume::bounded(256);
        Self { tx, rx }
    }

    /// Handle for a producer thread
    pub fn sender(&self) -> MidiInputSender {
        MidiInputSender { tx: self.tx.clone() }
    }

    /// Feed everything queued so far to `surface`; returns the number of messages
    ///
    /// Call on the thread that owns the registry.
    pub fn drain(&self, surface: &MidiSurface) -> usize {
        let mut count = 0;
        for data in self.rx.try_iter() {
            surface.handle_bytes(&data);
            count += 1;
        }
        count
    }
}

impl Default for MidiBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::{ParameterDef, ParameterRegistry};
    use std::rc::Rc;

    #[test]
    fn test_bridge_carries_bytes_across_threads() {
        let registry = Rc::new(ParameterRegistry::new());
        registry
            .add_or_update_parameter(ParameterDef::new("volume", 0.0, 1.0))
            .unwrap();
        let (out_tx, _out_rx) = flume::unbounded();
        let surface = MidiSurface::connect(&registry, DeviceProfile::generic(), ChannelSink::new(out_tx));

        let bridge = MidiBridge::new();
        let sender = bridge.sender();
        std::thread::spawn(move || {
            sender.send(&[0xB0, 0x07, 0x7F]);
            sender.send(&[0xF8]);
        })
        .join()
        .unwrap();

        assert_eq!(bridge.drain(&surface), 2);
        assert_eq!(registry.raw_value("volume"), Some(1.0));
        assert_eq!(bridge.drain(&surface), 0);
    }

    #[test]
    fn test_sender_drops_when_full() {
        let bridge = MidiBridge::new();
        let sender = bridge.sender();
        for _ in 0..256 {
            assert!(sender.send(&[0xB0, 1, 1]));
        }
        assert!(!sender.send(&[0xB0, 1, 1]));
    }
}
