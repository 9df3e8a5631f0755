//! MIDI configuration schema and loader
//!
//! Stored as YAML next to the other orbit config files.
//! Default location: `{config_dir}/orbit/midi.yaml`
//!
//! ```yaml
//! devices:
//!   - name: "Studio Knobs"
//!     port_match: "knobs"
//!     mappings:
//!       - control: { type: control_change, channel: 0, cc: 7 }
//!         parameter: volume
//!         feedback: true
//!       - control: { type: control_change, channel: 0, cc: 16 }
//!         parameter: lfo_rate
//!         behavior: relative
//!         encoder_mode: relative
//!         step: 0.01
//! ```

use crate::types::MidiAddress;
use crate::MidiError;
use orbit_core::config::{default_config_path, load_config, save_config};
use orbit_core::Priority;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root MIDI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Device profiles (matched by port name)
    pub devices: Vec<DeviceProfile>,
}

impl MidiConfig {
    /// First profile whose port name matches `port`
    pub fn profile_for_port(&self, port: &str) -> Result<&DeviceProfile, MidiError> {
        self.devices
            .iter()
            .find(|profile| port_matches(port, profile))
            .ok_or_else(|| MidiError::NoDeviceFound(port.to_string()))
    }
}

/// Configuration for one controller device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Human-readable device name
    pub name: String,

    /// Port name substring to match (case-insensitive)
    /// Used as fallback when learned_port_name doesn't match
    pub port_match: String,

    /// Exact port name (normalized, without hardware ID) for precise matching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learned_port_name: Option<String>,

    /// Control-to-parameter mappings
    #[serde(default)]
    pub mappings: Vec<ParameterMapping>,
}

impl DeviceProfile {
    /// Built-in profile for a generic 8-knob controller
    ///
    /// CC 7 drives `volume` with feedback, CC 1-3 drive the orbit axes, CC 16
    /// is a relative encoder on `lfo_rate`, note 36 resets `volume` and note 37
    /// toggles `lfo_depth`.
    pub fn generic() -> Self {
        let mut mappings = vec![ParameterMapping::absolute(MidiAddress::cc(0, 7), "volume").with_feedback()];
        for (cc, axis) in [(1, "orbit_x"), (2, "orbit_y"), (3, "orbit_z")] {
            let mut mapping = ParameterMapping::absolute(MidiAddress::cc(0, cc), axis).with_feedback();
            mapping.deadzone = Some(2);
            mappings.push(mapping);
        }
        mappings.push(ParameterMapping {
            behavior: MappingBehavior::Relative,
            encoder_mode: Some(EncoderMode::Relative),
            step: 0.01,
            ..ParameterMapping::absolute(MidiAddress::cc(0, 16), "lfo_rate")
        });
        mappings.push(ParameterMapping {
            behavior: MappingBehavior::Reset,
            ..ParameterMapping::absolute(MidiAddress::note(0, 36), "volume")
        });
        mappings.push(ParameterMapping {
            behavior: MappingBehavior::Toggle,
            feedback: true,
            ..ParameterMapping::absolute(MidiAddress::note(0, 37), "lfo_depth")
        });

        Self {
            name: "Generic".to_string(),
            port_match: String::new(),
            learned_port_name: None,
            mappings,
        }
    }
}

/// Binding of one physical control to one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMapping {
    /// MIDI note or CC
    pub control: MidiAddress,

    /// Parameter name in the registry
    pub parameter: String,

    #[serde(default)]
    pub behavior: MappingBehavior,

    /// Arbitration priority of writes from this control
    #[serde(default = "default_priority")]
    pub priority: Priority,

    /// Center deadzone in MIDI units (absolute CC only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadzone: Option<u8>,

    /// How to interpret CC values for relative behavior
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoder_mode: Option<EncoderMode>,

    /// Normalized change per encoder tick (relative behavior)
    #[serde(default = "default_step")]
    pub step: f64,

    /// Send the parameter's value back to this control
    #[serde(default)]
    pub feedback: bool,
}

fn default_priority() -> Priority {
    Priority::CONTROL_SURFACE
}

fn default_step() -> f64 {
    1.0 / 127.0
}

impl ParameterMapping {
    /// Absolute mapping with default priority and no feedback
    pub fn absolute(control: MidiAddress, parameter: &str) -> Self {
        Self {
            control,
            parameter: parameter.to_string(),
            behavior: MappingBehavior::Absolute,
            priority: default_priority(),
            deadzone: None,
            encoder_mode: None,
            step: default_step(),
            feedback: false,
        }
    }

    pub fn with_feedback(mut self) -> Self {
        self.feedback = true;
        self
    }
}

/// What a control does to its parameter
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MappingBehavior {
    /// Knob/fader position (or note velocity) sets the normalized value
    #[default]
    Absolute,
    /// Encoder ticks nudge the normalized value by `step`
    Relative,
    /// Each press flips between 0.0 and 1.0
    Toggle,
    /// Press snaps the parameter to the middle of its range
    Reset,
}

/// Encoder interpretation mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EncoderMode {
    /// Absolute value (0-127), 64 = no change
    Absolute,
    /// Relative: 1-63 = clockwise, 65-127 = counter-clockwise
    Relative,
    /// Relative with 64 as center: <64 = CCW, >64 = CW
    RelativeSigned,
}

/// Default MIDI config file path
///
/// Returns: `{config_dir}/orbit/midi.yaml`
pub fn default_midi_config_path() -> PathBuf {
    default_config_path("midi.yaml")
}

/// Load MIDI configuration; missing or invalid files yield no devices
pub fn load_midi_config(path: &Path) -> MidiConfig {
    let config: MidiConfig = load_config(path);
    log::info!("load_midi_config: {} device profile(s)", config.devices.len());
    for device in &config.devices {
        log::info!(
            "  - {} (port_match: '{}', {} mappings)",
            device.name,
            device.port_match,
            device.mappings.len()
        );
    }
    config
}

/// Save MIDI configuration, creating parent directories
pub fn save_midi_config(config: &MidiConfig, path: &Path) -> anyhow::Result<()> {
    save_config(config, path)
}

/// Normalize a MIDI port name by removing hardware-specific identifiers
///
/// ALSA port names include dynamic IDs that change between systems/reconnections:
///
/// 1. Bracketed hardware IDs: `[hw:3,0,0]`
/// 2. ALSA sequencer client:port IDs: trailing `28:0`
///
/// Examples:
/// - "nanoKONTROL2 MIDI 1 [hw:3,0,0]" -> "nanoKONTROL2 MIDI 1"
/// - "nanoKONTROL2:nanoKONTROL2 MIDI 1 28:0" -> "nanoKONTROL2:nanoKONTROL2 MIDI 1"
pub fn normalize_port_name(name: &str) -> String {
    let mut result = name.trim();

    if let Some(bracket_pos) = result.rfind('[') {
        result = result[..bracket_pos].trim();
    }

    if let Some(last_space) = result.rfind(' ') {
        let suffix = &result[last_space + 1..];
        let is_client_port = suffix
            .split_once(':')
            .map(|(client, port)| {
                !client.is_empty()
                    && !port.is_empty()
                    && client.chars().all(|c| c.is_ascii_digit())
                    && port.chars().all(|c| c.is_ascii_digit())
            })
            .unwrap_or(false);
        if is_client_port {
            result = result[..last_space].trim();
        }
    }

    result.to_string()
}

/// Check if a port name matches a profile
///
/// Tries an exact (case-insensitive) match against `learned_port_name`
/// first, then a substring match against `port_match`. Both sides are
/// normalized. An empty `port_match` matches any port.
pub fn port_matches(actual_port: &str, profile: &DeviceProfile) -> bool {
    let normalized_actual = normalize_port_name(actual_port);

    if let Some(ref learned) = profile.learned_port_name {
        if normalized_actual.eq_ignore_ascii_case(&normalize_port_name(learned)) {
            return true;
        }
    }

    let normalized_port_match = normalize_port_name(&profile.port_match);
    normalized_actual
        .to_lowercase()
        .contains(&normalized_port_match.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert!(MidiConfig::default().devices.is_empty());
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
devices:
  - name: "Studio Knobs"
    port_match: "knobs"
    mappings:
      - control:
          type: control_change
          channel: 0
          cc: 7
        parameter: volume
        feedback: true
      - control:
          type: control_change
          channel: 0
          cc: 16
        parameter: lfo_rate
        behavior: relative
        encoder_mode: relative_signed
        step: 0.05
        priority: 2
      - control:
          type: note
          channel: 0
          note: 36
        parameter: volume
        behavior: reset
"#;
        let config: MidiConfig = serde_yaml::from_str(yaml).unwrap();
        let device = &config.devices[0];
        assert_eq!(device.mappings.len(), 3);

        let volume = &device.mappings[0];
        assert_eq!(volume.control, MidiAddress::cc(0, 7));
        assert_eq!(volume.behavior, MappingBehavior::Absolute);
        assert_eq!(volume.priority, Priority::CONTROL_SURFACE);
        assert!(volume.feedback);

        let rate = &device.mappings[1];
        assert_eq!(rate.behavior, MappingBehavior::Relative);
        assert_eq!(rate.encoder_mode, Some(EncoderMode::RelativeSigned));
        assert_eq!(rate.priority, Priority(2));
        assert_eq!(rate.step, 0.05);

        assert_eq!(device.mappings[2].behavior, MappingBehavior::Reset);
        assert!(!device.mappings[2].feedback);
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("midi.yaml");
        let config = MidiConfig {
            devices: vec![DeviceProfile::generic()],
        };
        save_midi_config(&config, &path).unwrap();
        assert_eq!(load_midi_config(&path), config);
    }

    #[test]
    fn test_normalize_port_name() {
        assert_eq!(
            normalize_port_name("nanoKONTROL2 MIDI 1 [hw:3,0,0]"),
            "nanoKONTROL2 MIDI 1"
        );
        assert_eq!(
            normalize_port_name("nanoKONTROL2:nanoKONTROL2 MIDI 1 28:0"),
            "nanoKONTROL2:nanoKONTROL2 MIDI 1"
        );
        assert_eq!(normalize_port_name("  Plain Port  "), "Plain Port");
        // Not a client:port pair
        assert_eq!(normalize_port_name("Device A:B"), "Device A:B");
    }

    #[test]
    fn test_port_matches() {
        let learned = DeviceProfile {
            name: "Knobs".to_string(),
            port_match: "nothing-like-it".to_string(),
            learned_port_name: Some("Knobs:Knobs MIDI 1 [hw:1,0,0]".to_string()),
            mappings: Vec::new(),
        };
        assert!(port_matches("knobs:knobs midi 1 20:0", &learned));
        assert!(!port_matches("Other MIDI 1", &learned));

        let substring = DeviceProfile {
            port_match: "KNOBS".to_string(),
            learned_port_name: None,
            ..learned.clone()
        };
        assert!(port_matches("My Knobs MIDI 1 [hw:2,0,0]", &substring));
        assert!(port_matches("anything", &DeviceProfile::generic()));
    }

    #[test]
    fn test_profile_for_port() {
        let config = MidiConfig {
            devices: vec![DeviceProfile {
                name: "Knobs".to_string(),
                port_match: "knobs".to_string(),
                learned_port_name: None,
                mappings: Vec::new(),
            }],
        };
        assert_eq!(config.profile_for_port("Knobs MIDI 1").unwrap().name, "Knobs");
        assert!(matches!(
            config.profile_for_port("Pads"),
            Err(MidiError::NoDeviceFound(_))
        ));
    }
}
