//! Observer contract implemented by every collaborator
//!
//! UI widgets, MIDI surfaces, sensors and automation sources all talk to the
//! registry through this one trait. Only value changes are mandatory; range
//! and scale notifications default to no-ops.
//!
//! Callbacks run synchronously inside the registry call that caused them. The
//! registry holds no internal borrow while calling out, so a callback may read
//! from or write to the registry again.

use crate::parameter::Scale;
use crate::types::ControllerId;

pub trait Controller {
    /// Stable identity used for echo suppression and arbitration
    fn id(&self) -> ControllerId;

    /// A parameter's value changed; `value` has the output transform applied
    fn on_parameter_changed(&self, name: &str, value: f64);

    /// A parameter's raw range changed
    fn on_range_changed(&self, _name: &str, _min: f64, _max: f64) {}

    /// A parameter's scale tag changed
    fn on_scale_changed(&self, _name: &str, _scale: &Scale) {}
}
