//! Player configuration for orbit-player
//!
//! Stored as YAML next to the other orbit config files.
//! Default location: `{config_dir}/orbit/player.yaml`

use orbit_core::config::default_config_path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Engine tick period in milliseconds (MIDI drain + LFO advance)
    pub tick_ms: u64,
    /// MIDI port name used to pick a device profile from `midi.yaml`
    /// (none = first profile, or the built-in generic one)
    pub midi_port: Option<String>,
    pub sensor: SensorConfig,
    pub lfos: Vec<LfoConfig>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 20,
            midi_port: None,
            sensor: SensorConfig::default(),
            lfos: vec![LfoConfig::default()],
        }
    }
}

/// Motion sensor section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Parameters driven by the x, y and z readings
    pub axes: [String; 3],
    /// Multiplier applied to every reading before it is written
    pub gain: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            axes: ["orbit_x".to_string(), "orbit_y".to_string(), "orbit_z".to_string()],
            gain: 1.0,
        }
    }
}

/// LFO waveform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
}

/// One automation LFO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LfoConfig {
    /// Parameter the LFO writes to
    pub target: String,
    /// Parameter holding the rate in Hz
    pub rate_param: String,
    /// Parameter holding the depth (0-1)
    pub depth_param: String,
    pub waveform: Waveform,
}

impl Default for LfoConfig {
    fn default() -> Self {
        Self {
            target: "orbit_z".to_string(),
            rate_param: "lfo_rate".to_string(),
            depth_param: "lfo_depth".to_string(),
            waveform: Waveform::Sine,
        }
    }
}

/// Get the default player config path
///
/// Returns: `{config_dir}/orbit/player.yaml`
pub fn default_player_config_path() -> PathBuf {
    default_config_path("player.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::config::{load_config, save_config};

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
tick_ms: 5
lfos:
  - target: volume
    waveform: triangle
"#;
        let config: PlayerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tick_ms, 5);
        assert_eq!(config.sensor, SensorConfig::default());
        assert_eq!(config.lfos.len(), 1);
        assert_eq!(config.lfos[0].target, "volume");
        assert_eq!(config.lfos[0].rate_param, "lfo_rate");
        assert_eq!(config.lfos[0].waveform, Waveform::Triangle);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.yaml");
        let mut config = PlayerConfig::default();
        config.midi_port = Some("Knobs MIDI 1".to_string());
        save_config(&config, &path).unwrap();
        let loaded: PlayerConfig = load_config(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_path() {
        assert!(default_player_config_path().ends_with("orbit/player.yaml"));
    }
}
