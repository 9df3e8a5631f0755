//! Parameter definitions loaded from `parameters.yaml`
//!
//! ```yaml
//! parameters:
//!   - name: volume
//!     min: 0.0
//!     max: 1.0
//!     seed: 0.8
//!     bidirectional: true
//!     curve:
//!       type: logarithmic
//!   - name: orbit_x
//!     min: -1.0
//!     max: 1.0
//! ```

use crate::error::ParameterResult;
use crate::parameter::ParameterDef;
use crate::registry::ParameterRegistry;
use crate::transform::Curve;
use serde::{Deserialize, Serialize};

/// One parameter entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    pub name: String,
    pub min: f64,
    pub max: f64,
    /// Controller-domain seed; goes through the curve's forward transform
    #[serde(default)]
    pub seed: f64,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub curve: Curve,
}

impl ParameterConfig {
    pub fn new(name: &str, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
            seed: 0.0,
            bidirectional: false,
            curve: Curve::Linear,
        }
    }

    /// Build the registry definition, rejecting unusable curves
    pub fn to_def(&self) -> ParameterResult<ParameterDef> {
        self.curve.validate()?;
        Ok(ParameterDef::new(self.name.clone(), self.min, self.max)
            .curve(&self.curve)
            .seed(self.seed)
            .bidirectional(self.bidirectional))
    }
}

/// Top-level `parameters.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParametersConfig {
    pub parameters: Vec<ParameterConfig>,
}

impl Default for ParametersConfig {
    fn default() -> Self {
        let mut volume = ParameterConfig::new("volume", 0.0, 1.0);
        volume.seed = 0.8;
        volume.bidirectional = true;
        volume.curve = Curve::Logarithmic;

        let mut lfo_rate = ParameterConfig::new("lfo_rate", 0.05, 10.0);
        lfo_rate.seed = 0.5;

        let mut lfo_depth = ParameterConfig::new("lfo_depth", 0.0, 1.0);
        lfo_depth.seed = 0.5;

        Self {
            parameters: vec![
                volume,
                ParameterConfig::new("orbit_x", -1.0, 1.0),
                ParameterConfig::new("orbit_y", -1.0, 1.0),
                ParameterConfig::new("orbit_z", -1.0, 1.0),
                lfo_rate,
                lfo_depth,
            ],
        }
    }
}

impl ParametersConfig {
    /// Register every entry with `registry`
    ///
    /// Stops at the first invalid entry; entries before it stay registered.
    pub fn register(&self, registry: &ParameterRegistry) -> ParameterResult<()> {
        for param in &self.parameters {
            registry.add_or_update_parameter(param.to_def()?)?;
        }
        log::info!("Parameters: Registered {} parameters from config", self.parameters.len());
        Ok(())
    }
}
