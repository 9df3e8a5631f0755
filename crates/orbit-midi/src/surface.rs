//! MIDI control surface as a registry controller
//!
//! Inbound events are mapped through the device profile and written to the
//! registry as normalized values under the mapping's priority. Value changes
//! of feedback-enabled parameters are sent back to the matching controls.

use crate::config::{DeviceProfile, EncoderMode, MappingBehavior, ParameterMapping};
use crate::feedback::{FeedbackChangeTracker, MidiSink};
use crate::input::MidiInputEvent;
use crate::normalize::{denormalize_to_midi, encoder_to_delta, normalize_cc_value};
use crate::types::MidiAddress;
use orbit_core::{Controller, ControllerId, ParameterRegistry, Priority};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct MidiSurface {
    id: ControllerId,
    registry: Rc<ParameterRegistry>,
    profile: DeviceProfile,
    sink: Box<dyn MidiSink>,
    tracker: RefCell<FeedbackChangeTracker>,
}

impl MidiSurface {
    /// Create the surface and subscribe it to every mapped parameter
    ///
    /// A parameter mapped by several controls is subscribed once, with the
    /// highest priority among them. Feedback for the current state goes out
    /// before this returns.
    pub fn connect(
        registry: &Rc<ParameterRegistry>,
        profile: DeviceProfile,
        sink: impl MidiSink + 'static,
    ) -> Rc<Self> {
        let surface = Rc::new(Self {
            id: ControllerId::next(),
            registry: registry.clone(),
            profile,
            sink: Box::new(sink),
            tracker: RefCell::new(FeedbackChangeTracker::new()),
        });

        let mut priorities: Vec<(&str, Priority)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for mapping in &surface.profile.mappings {
            match index.get(mapping.parameter.as_str()) {
                Some(&i) => {
                    if mapping.priority.outranks(priorities[i].1) {
                        priorities[i].1 = mapping.priority;
                    }
                }
                None => {
                    index.insert(mapping.parameter.as_str(), priorities.len());
                    priorities.push((mapping.parameter.as_str(), mapping.priority));
                }
            }
        }
        for (name, priority) in &priorities {
            registry.subscribe(&surface, name, *priority);
        }

        log::info!(
            "MIDI: Surface '{}' connected ({} mappings, {} parameters)",
            surface.profile.name,
            surface.profile.mappings.len(),
            priorities.len()
        );
        surface
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Parse raw bytes and dispatch; unparseable input is ignored
    pub fn handle_bytes(&self, data: &[u8]) -> usize {
        match MidiInputEvent::parse(data) {
            Some(event) => self.handle_event(&event),
            None => {
                log::trace!("MIDI: Ignoring message {:02x?}", data);
                0
            }
        }
    }

    /// Apply every mapping bound to the event's control; returns how many matched
    pub fn handle_event(&self, event: &MidiInputEvent) -> usize {
        let mut handled = 0;
        for mapping in self.profile.mappings.iter().filter(|m| event.matches(&m.control)) {
            self.apply(mapping, event);
            handled += 1;
        }
        if handled == 0 {
            log::trace!("MIDI: No mapping for {}", event.address());
        }
        handled
    }

    fn apply(&self, mapping: &ParameterMapping, event: &MidiInputEvent) {
        let name = mapping.parameter.as_str();
        let target = match mapping.behavior {
            MappingBehavior::Absolute => match *event {
                MidiInputEvent::ControlChange { value, .. } => normalize_cc_value(value, mapping.deadzone),
                MidiInputEvent::NoteOn { velocity, .. } => f64::from(velocity) / 127.0,
                MidiInputEvent::NoteOff { .. } => 0.0,
            },
            MappingBehavior::Relative => {
                let mode = mapping.encoder_mode.unwrap_or(EncoderMode::Relative);
                let delta = encoder_to_delta(event.value(), mode);
                if delta == 0 {
                    return;
                }
                let Some(current) = self.current(name) else {
                    return;
                };
                (current + f64::from(delta) * mapping.step).clamp(0.0, 1.0)
            }
            MappingBehavior::Toggle => {
                if !event.is_press() {
                    return;
                }
                let Some(current) = self.current(name) else {
                    return;
                };
                if current >= 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
            MappingBehavior::Reset => {
                if event.is_press() {
                    log::debug!("MIDI: {} resets '{}'", mapping.control, name);
                    self.registry.set_to_middle(name);
                }
                return;
            }
        };

        let outcome = self
            .registry
            .set_normalized_value(name, target, Some(self.id), mapping.priority);
        log::trace!(
            "MIDI: {} -> '{}' = {:.3} ({:?})",
            mapping.control,
            name,
            target,
            outcome
        );

        // Own writes are not echoed back unless the parameter is bidirectional
        if outcome.is_accepted() && self.registry.is_bidirectional(name) == Some(false) {
            let moved = match *event {
                MidiInputEvent::ControlChange { value, .. }
                    if mapping.feedback && mapping.behavior == MappingBehavior::Absolute =>
                {
                    // The control already sits where the user put it
                    self.tracker.borrow_mut().update(&mapping.control, value);
                    Some(&mapping.control)
                }
                _ => None,
            };
            self.send_feedback_except(name, moved);
        }
    }

    /// Current normalized value, pulled into `[0, 1]`
    fn current(&self, name: &str) -> Option<f64> {
        match self.registry.normalized_value(name) {
            Some(value) => Some(value.clamp(0.0, 1.0)),
            None => {
                log::warn!("MIDI: Mapped parameter '{}' does not exist", name);
                None
            }
        }
    }

    fn send_feedback(&self, name: &str) {
        self.send_feedback_except(name, None);
    }

    /// Send feedback for `name` to every feedback control other than `skip`
    fn send_feedback_except(&self, name: &str, skip: Option<&MidiAddress>) {
        let Some(normalized) = self.registry.normalized_value(name) else {
            return;
        };
        let value = denormalize_to_midi(normalized);

        let targets = self
            .profile
            .mappings
            .iter()
            .filter(|m| m.feedback && m.parameter == name && Some(&m.control) != skip);
        for mapping in targets {
            let changed = self.tracker.borrow_mut().update(&mapping.control, value);
            if let Some(value) = changed {
                log::debug!("MIDI: Feedback {} val={}", mapping.control, value);
                if let Err(e) = self.sink.send(&mapping.control.encode(value)) {
                    log::warn!("MIDI: Failed to send feedback: {}", e);
                }
            }
        }
    }

    /// Turn off every control that has received feedback
    pub fn clear_feedback(&self) {
        let addresses: Vec<_> = self.tracker.borrow().tracked_addresses().copied().collect();
        for address in &addresses {
            if let Err(e) = self.sink.send(&address.encode(0)) {
                log::warn!("MIDI: Failed to clear {}: {}", address, e);
            }
        }
        self.tracker.borrow_mut().clear();
        log::info!("MIDI: Cleared feedback on {} controls", addresses.len());
    }
}

impl Controller for MidiSurface {
    fn id(&self) -> ControllerId {
        self.id
    }

    // Feedback works in normalized space, so `value` (output-transformed) is not used
    fn on_parameter_changed(&self, name: &str, _value: f64) {
        self.send_feedback(name);
    }

    fn on_range_changed(&self, name: &str, _min: f64, _max: f64) {
        self.send_feedback(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::ChannelSink;
    use flume::Receiver;
    use orbit_core::{ManualClock, ParameterDef, WriteOutcome};

    fn setup(profile: DeviceProfile) -> (Rc<ParameterRegistry>, ManualClock, Rc<MidiSurface>, Receiver<Vec<u8>>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let clock = ManualClock::new();
        let registry = Rc::new(ParameterRegistry::with_clock(clock.clone()));
        registry
            .add_or_update_parameter(ParameterDef::new("volume", 0.0, 100.0))
            .unwrap();
        registry
            .add_or_update_parameter(ParameterDef::new("rate", 0.0, 1.0).seed(0.5))
            .unwrap();
        let (tx, rx) = flume::unbounded();
        let surface = MidiSurface::connect(&registry, profile, ChannelSink::new(tx));
        (registry, clock, surface, rx)
    }

    fn profile(mappings: Vec<ParameterMapping>) -> DeviceProfile {
        DeviceProfile {
            name: "Test".to_string(),
            port_match: "test".to_string(),
            learned_port_name: None,
            mappings,
        }
    }

    fn drain(rx: &Receiver<Vec<u8>>) -> Vec<Vec<u8>> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_absolute_cc_sets_normalized_value() {
        let (registry, _clock, surface, _rx) =
            setup(profile(vec![ParameterMapping::absolute(MidiAddress::cc(0, 7), "volume")]));

        assert_eq!(surface.handle_bytes(&[0xB0, 0x07, 0x7F]), 1);
        assert_eq!(registry.raw_value("volume"), Some(100.0));
        assert_eq!(surface.handle_bytes(&[0xB0, 0x07, 0x00]), 1);
        assert_eq!(registry.raw_value("volume"), Some(0.0));
        // Other channel, other CC, garbage
        assert_eq!(surface.handle_bytes(&[0xB1, 0x07, 0x7F]), 0);
        assert_eq!(surface.handle_bytes(&[0xB0, 0x08, 0x7F]), 0);
        assert_eq!(surface.handle_bytes(&[0xE0, 0x00]), 0);
        assert_eq!(registry.raw_value("volume"), Some(0.0));
    }

    #[test]
    fn test_writes_carry_surface_identity_and_priority() {
        let (registry, _clock, surface, _rx) =
            setup(profile(vec![ParameterMapping::absolute(MidiAddress::cc(0, 7), "volume")]));
        surface.handle_bytes(&[0xB0, 0x07, 0x40]);
        let info = registry.parameter("volume").unwrap();
        assert_eq!(info.last_controller, Some(surface.id()));
        assert_eq!(info.last_priority, Priority::CONTROL_SURFACE);
    }

    #[test]
    fn test_surface_outranks_ui_inside_window() {
        let (registry, clock, surface, _rx) =
            setup(profile(vec![ParameterMapping::absolute(MidiAddress::cc(0, 7), "volume")]));
        let ui = Some(ControllerId::next());

        clock.set_millis(0);
        surface.handle_bytes(&[0xB0, 0x07, 0x7F]);
        clock.set_millis(20);
        assert_eq!(
            registry.set_normalized_value("volume", 0.1, ui, Priority::UI),
            WriteOutcome::Rejected
        );
        assert_eq!(registry.raw_value("volume"), Some(100.0));
    }

    #[test]
    fn test_relative_encoder_steps() {
        let mapping = ParameterMapping {
            behavior: MappingBehavior::Relative,
            encoder_mode: Some(EncoderMode::Relative),
            step: 0.1,
            ..ParameterMapping::absolute(MidiAddress::cc(0, 16), "rate")
        };
        let (registry, clock, surface, _rx) = setup(profile(vec![mapping]));

        surface.handle_bytes(&[0xB0, 16, 1]);
        assert!((registry.normalized_value("rate").unwrap() - 0.6).abs() < 1e-9);
        clock.set_millis(10);
        surface.handle_bytes(&[0xB0, 16, 66]); // two ticks CCW
        assert!((registry.normalized_value("rate").unwrap() - 0.4).abs() < 1e-9);
        clock.set_millis(20);
        surface.handle_bytes(&[0xB0, 16, 63]); // large CW turn saturates
        assert_eq!(registry.normalized_value("rate"), Some(1.0));
    }

    #[test]
    fn test_toggle_flips_on_press_only() {
        let mapping = ParameterMapping {
            behavior: MappingBehavior::Toggle,
            ..ParameterMapping::absolute(MidiAddress::note(0, 37), "rate")
        };
        let (registry, clock, surface, _rx) = setup(profile(vec![mapping]));

        surface.handle_bytes(&[0x90, 37, 127]);
        assert_eq!(registry.normalized_value("rate"), Some(0.0));
        clock.set_millis(10);
        surface.handle_bytes(&[0x80, 37, 0]);
        assert_eq!(registry.normalized_value("rate"), Some(0.0));
        clock.set_millis(20);
        surface.handle_bytes(&[0x90, 37, 100]);
        assert_eq!(registry.normalized_value("rate"), Some(1.0));
    }

    #[test]
    fn test_reset_snaps_to_middle() {
        let mapping = ParameterMapping {
            behavior: MappingBehavior::Reset,
            ..ParameterMapping::absolute(MidiAddress::note(0, 36), "volume")
        };
        let (registry, _clock, surface, _rx) = setup(profile(vec![mapping]));
        registry.set_raw_value("volume", 90.0, None, Priority::HIGHEST);

        surface.handle_bytes(&[0x90, 36, 127]);
        assert_eq!(registry.raw_value("volume"), Some(50.0));
    }

    #[test]
    fn test_feedback_follows_other_writers() {
        let mapping = ParameterMapping::absolute(MidiAddress::cc(0, 7), "volume").with_feedback();
        let (registry, clock, _surface, rx) = setup(profile(vec![mapping]));
        // Initial state on connect
        assert_eq!(drain(&rx), vec![vec![0xB0, 0x07, 0]]);

        let ui = Some(ControllerId::next());
        registry.set_normalized_value("volume", 0.5, ui, Priority::UI);
        assert_eq!(drain(&rx), vec![vec![0xB0, 0x07, 64]]);

        // Different raw value, same MIDI value: nothing resent
        clock.set_millis(10);
        registry.set_normalized_value("volume", 0.501, ui, Priority::UI);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_own_writes_do_not_echo_unless_bidirectional() {
        let mapping = ParameterMapping::absolute(MidiAddress::cc(0, 7), "volume").with_feedback();
        let (registry, clock, surface, rx) = setup(profile(vec![mapping]));
        drain(&rx);

        surface.handle_bytes(&[0xB0, 0x07, 100]);
        assert!(drain(&rx).is_empty());

        registry
            .add_or_update_parameter(ParameterDef::new("volume", 0.0, 100.0).bidirectional(true))
            .unwrap();
        drain(&rx);
        clock.set_millis(100);
        surface.handle_bytes(&[0xB0, 0x07, 100]);
        assert_eq!(drain(&rx), vec![vec![0xB0, 0x07, 100]]);
    }

    #[test]
    fn test_feedback_after_own_move_tracks_control_position() {
        let mapping = ParameterMapping::absolute(MidiAddress::cc(0, 7), "volume").with_feedback();
        let (registry, clock, surface, rx) = setup(profile(vec![mapping]));
        assert_eq!(drain(&rx), vec![vec![0xB0, 0x07, 0]]);

        surface.handle_bytes(&[0xB0, 0x07, 0x7F]);
        assert_eq!(registry.raw_value("volume"), Some(100.0));
        assert!(drain(&rx).is_empty());

        // Back to the value last sent before the fader moved
        clock.set_millis(200);
        let ui = Some(ControllerId::next());
        assert_eq!(
            registry.set_normalized_value("volume", 0.0, ui, Priority::UI),
            WriteOutcome::Applied
        );
        assert_eq!(drain(&rx), vec![vec![0xB0, 0x07, 0]]);
    }

    #[test]
    fn test_own_move_updates_other_feedback_controls() {
        let fader = ParameterMapping::absolute(MidiAddress::cc(0, 7), "volume").with_feedback();
        let ring = ParameterMapping::absolute(MidiAddress::cc(0, 17), "volume").with_feedback();
        let (_registry, _clock, surface, rx) = setup(profile(vec![fader, ring]));
        drain(&rx);

        surface.handle_bytes(&[0xB0, 0x07, 0x7F]);
        assert_eq!(drain(&rx), vec![vec![0xB0, 17, 127]]);
    }

    #[test]
    fn test_toggle_press_lights_led() {
        let mapping = ParameterMapping {
            behavior: MappingBehavior::Toggle,
            feedback: true,
            ..ParameterMapping::absolute(MidiAddress::note(0, 37), "rate")
        };
        let (registry, clock, surface, rx) = setup(profile(vec![mapping]));
        assert_eq!(drain(&rx), vec![vec![0x90, 37, 64]]);

        surface.handle_bytes(&[0x90, 37, 127]);
        assert_eq!(registry.normalized_value("rate"), Some(0.0));
        assert_eq!(drain(&rx), vec![vec![0x80, 37, 0]]);

        clock.set_millis(10);
        surface.handle_bytes(&[0x90, 37, 127]);
        assert_eq!(drain(&rx), vec![vec![0x90, 37, 127]]);
    }

    #[test]
    fn test_range_change_resends_feedback() {
        let mapping = ParameterMapping::absolute(MidiAddress::cc(0, 7), "volume").with_feedback();
        let (registry, _clock, _surface, rx) = setup(profile(vec![mapping]));
        registry.set_raw_value("volume", 50.0, None, Priority::UI);
        drain(&rx);

        registry.set_range("volume", 0.0, 200.0).unwrap();
        assert_eq!(drain(&rx), vec![vec![0xB0, 0x07, 32]]);
    }

    #[test]
    fn test_note_feedback_and_clear() {
        let mapping = ParameterMapping {
            behavior: MappingBehavior::Toggle,
            feedback: true,
            ..ParameterMapping::absolute(MidiAddress::note(0, 37), "rate")
        };
        let (registry, _clock, surface, rx) = setup(profile(vec![mapping]));
        assert_eq!(drain(&rx), vec![vec![0x90, 37, 64]]);

        registry.set_normalized_value("rate", 1.0, None, Priority::UI);
        assert_eq!(drain(&rx), vec![vec![0x90, 37, 127]]);

        surface.clear_feedback();
        assert_eq!(drain(&rx), vec![vec![0x80, 37, 0]]);
    }

    #[test]
    fn test_shared_parameter_subscribed_once_with_best_priority() {
        let fader = ParameterMapping {
            priority: Priority(4),
            ..ParameterMapping::absolute(MidiAddress::cc(0, 7), "volume")
        };
        let reset = ParameterMapping {
            behavior: MappingBehavior::Reset,
            priority: Priority(2),
            ..ParameterMapping::absolute(MidiAddress::note(0, 36), "volume")
        };
        let (registry, _clock, surface, _rx) = setup(profile(vec![fader, reset]));
        let subs = registry.parameter("volume").unwrap().subscribers;
        assert_eq!(subs, vec![(surface.id(), Priority(2))]);
    }

    #[test]
    fn test_unknown_mapped_parameter_is_created_on_connect() {
        let (registry, _clock, surface, _rx) =
            setup(profile(vec![ParameterMapping::absolute(MidiAddress::cc(0, 9), "brand_new")]));
        assert_eq!(registry.range("brand_new"), Some((0.0, 1.0)));
        surface.handle_bytes(&[0xB0, 9, 127]);
        assert_eq!(registry.raw_value("brand_new"), Some(1.0));
    }
}
