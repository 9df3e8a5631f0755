//! Configuration for orbit applications
//!
//! - Generic YAML config loading/saving
//! - Standard config file locations
//! - Parameter definitions ([`ParametersConfig`])
//!
//! # Usage
//!
//! ```ignore
//! use orbit_core::config::{load_config, default_config_path, ParametersConfig};
//!
//! let params: ParametersConfig = load_config(&default_config_path("parameters.yaml"));
//! params.register(&registry);
//! ```

mod io;
mod parameters;
mod paths;

pub use io::{load_config, save_config};
pub use parameters::{ParameterConfig, ParametersConfig};
pub use paths::{config_dir, default_config_path};
