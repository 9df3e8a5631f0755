//! Parameter data model
//!
//! [`ParameterDef`] is what callers hand to the registry; the registry keeps
//! its own [`Parameter`] records and only ever hands out [`ParameterInfo`]
//! snapshots, so observers cannot mutate state behind its back.

use crate::arbitration::Incumbent;
use crate::controller::Controller;
use crate::range::{clamp, normalize};
use crate::transform::{Curve, TransformFn};
use crate::types::{ControllerId, Priority};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Weak;
use std::time::Duration;

/// Descriptive scale tag
///
/// Purely informational for observers (e.g. how a widget should draw its
/// ticks); the transforms themselves are supplied explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    #[default]
    Linear,
    Logarithmic,
    Decibel,
    Exponential,
    SquareRoot,
    Cubic,
    Sine,
    InverseSine,
    Piecewise,
    Custom(String),
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::Linear => write!(f, "linear"),
            Scale::Logarithmic => write!(f, "logarithmic"),
            Scale::Decibel => write!(f, "decibel"),
            Scale::Exponential => write!(f, "exponential"),
            Scale::SquareRoot => write!(f, "square_root"),
            Scale::Cubic => write!(f, "cubic"),
            Scale::Sine => write!(f, "sine"),
            Scale::InverseSine => write!(f, "inverse_sine"),
            Scale::Piecewise => write!(f, "piecewise"),
            Scale::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Definition passed to [`crate::ParameterRegistry::add_or_update_parameter`]
///
/// ```ignore
/// let volume = ParameterDef::new("volume", 0.0, 2.0)
///     .seed(0.8)
///     .curve(&Curve::Logarithmic)
///     .bidirectional(true);
/// ```
#[derive(Debug, Clone)]
pub struct ParameterDef {
    pub name: String,
    /// Seed fed through the input transform to compute the initial raw value
    pub seed: f64,
    pub min: f64,
    pub max: f64,
    pub bidirectional: bool,
    pub scale: Scale,
    pub input_transform: TransformFn,
    pub output_transform: TransformFn,
}

impl ParameterDef {
    /// Linear, non-bidirectional definition seeded at 0
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            seed: 0.0,
            min,
            max,
            bidirectional: false,
            scale: Scale::Linear,
            input_transform: TransformFn::identity(),
            output_transform: TransformFn::identity(),
        }
    }

    pub fn seed(mut self, seed: f64) -> Self {
        self.seed = seed;
        self
    }

    pub fn bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    pub fn scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    /// Use a stock curve: forward as input transform, inverse as output
    /// transform, and the curve's scale tag
    pub fn curve(mut self, curve: &Curve) -> Self {
        let pair = curve.pair();
        self.scale = curve.scale();
        self.input_transform = pair.forward;
        self.output_transform = pair.inverse;
        self
    }

    /// Use arbitrary input/output transforms
    pub fn transforms(mut self, input: TransformFn, output: TransformFn) -> Self {
        self.input_transform = input;
        self.output_transform = output;
        self
    }
}

/// Registered observer of one parameter
#[derive(Debug, Clone)]
pub(crate) struct Subscriber {
    pub id: ControllerId,
    pub controller: Weak<dyn Controller>,
    pub priority: Priority,
}

/// Registry-owned parameter record
#[derive(Debug)]
pub(crate) struct Parameter {
    pub name: String,
    pub raw_value: f64,
    pub normalized_value: f64,
    pub min: f64,
    pub max: f64,
    pub scale: Scale,
    pub input_transform: TransformFn,
    pub output_transform: TransformFn,
    pub is_bidirectional: bool,
    pub subscribers: Vec<Subscriber>,
    pub last_priority: Priority,
    pub last_update: Option<Duration>,
    pub last_controller: Option<ControllerId>,
}

impl Parameter {
    /// Range `[0, 1]`, value 0, linear, non-bidirectional
    pub fn with_defaults(name: &str) -> Self {
        Self::from_def(ParameterDef::new(name, 0.0, 1.0))
    }

    pub fn from_def(def: ParameterDef) -> Self {
        let raw_value = clamp(def.input_transform.apply(def.seed), def.min, def.max);
        Self {
            normalized_value: normalize(raw_value, def.min, def.max),
            raw_value,
            name: def.name,
            min: def.min,
            max: def.max,
            scale: def.scale,
            input_transform: def.input_transform,
            output_transform: def.output_transform,
            is_bidirectional: def.bidirectional,
            subscribers: Vec::new(),
            last_priority: Priority::LOWEST,
            last_update: None,
            last_controller: None,
        }
    }

    /// Store a new raw value (clamped), returning whether it changed
    pub fn store_raw(&mut self, candidate: f64) -> bool {
        let clamped = clamp(candidate, self.min, self.max);
        let changed = clamped != self.raw_value;
        self.raw_value = clamped;
        self.normalized_value = normalize(clamped, self.min, self.max);
        changed
    }

    pub fn output_value(&self) -> f64 {
        self.output_transform.apply(self.raw_value)
    }

    pub fn incumbent(&self) -> Incumbent {
        Incumbent {
            last_update: self.last_update,
            last_priority: self.last_priority,
            last_controller: self.last_controller,
        }
    }

    pub fn info(&self) -> ParameterInfo {
        ParameterInfo {
            name: self.name.clone(),
            raw_value: self.raw_value,
            normalized_value: self.normalized_value,
            output_value: self.output_value(),
            min: self.min,
            max: self.max,
            scale: self.scale.clone(),
            bidirectional: self.is_bidirectional,
            subscribers: self.subscribers.iter().map(|s| (s.id, s.priority)).collect(),
            last_priority: self.last_priority,
            last_update: self.last_update,
            last_controller: self.last_controller,
        }
    }
}

/// Read-only snapshot of a parameter for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    pub raw_value: f64,
    pub normalized_value: f64,
    /// Value observers receive (output transform applied)
    pub output_value: f64,
    pub min: f64,
    pub max: f64,
    pub scale: Scale,
    pub bidirectional: bool,
    /// Subscribers in delivery order
    pub subscribers: Vec<(ControllerId, Priority)>,
    pub last_priority: Priority,
    pub last_update: Option<Duration>,
    pub last_controller: Option<ControllerId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Parameter::with_defaults("x");
        assert_eq!((p.min, p.max), (0.0, 1.0));
        assert_eq!(p.raw_value, 0.0);
        assert!(!p.is_bidirectional);
        assert_eq!(p.last_priority, Priority::LOWEST);
        assert!(p.last_update.is_none());
    }

    #[test]
    fn test_seed_goes_through_input_transform_and_clamps() {
        let p = Parameter::from_def(
            ParameterDef::new("gain", 0.0, 1.0).curve(&Curve::Logarithmic).seed(1.0),
        );
        // forward(1.0) ~ 1.995 clamps to max
        assert_eq!(p.raw_value, 1.0);
        assert_eq!(p.normalized_value, 1.0);
        assert_eq!(p.scale, Scale::Logarithmic);
    }

    #[test]
    fn test_store_raw_reports_change() {
        let mut p = Parameter::from_def(ParameterDef::new("p", 0.0, 100.0));
        assert!(p.store_raw(150.0));
        assert_eq!(p.raw_value, 100.0);
        assert!(!p.store_raw(120.0));
        assert!(p.store_raw(25.0));
        assert_eq!(p.normalized_value, 0.25);
    }

    #[test]
    fn test_scale_display() {
        assert_eq!(Scale::SquareRoot.to_string(), "square_root");
        assert_eq!(Scale::Custom("steps".into()).to_string(), "steps");
    }
}
