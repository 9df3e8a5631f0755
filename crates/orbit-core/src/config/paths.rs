//! Standard locations of orbit configuration files

use std::path::PathBuf;

/// Per-user orbit config directory
///
/// Returns: `{config_dir}/orbit` (e.g. `~/.config/orbit` on Linux), falling
/// back to `./orbit` when the platform has no config dir.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orbit")
}

/// Default path of a config file, e.g. `default_config_path("midi.yaml")`
pub fn default_config_path(filename: &str) -> PathBuf {
    config_dir().join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_ends_with_orbit() {
        assert!(config_dir().ends_with("orbit"));
    }

    #[test]
    fn test_config_path_includes_filename() {
        let path = default_config_path("parameters.yaml");
        assert!(path.ends_with("orbit/parameters.yaml"));
    }
}
