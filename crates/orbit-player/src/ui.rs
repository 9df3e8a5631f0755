//! UI widget controller
//!
//! Stands in for a slider on screen: it remembers what it should display and
//! writes drags as normalized values at UI priority.

use orbit_core::{Controller, ControllerId, ParameterRegistry, Priority, WriteOutcome};
use std::cell::Cell;
use std::rc::Rc;

pub struct UiWidget {
    id: ControllerId,
    parameter: String,
    registry: Rc<ParameterRegistry>,
    /// Last value received from the registry (output transform applied)
    displayed: Cell<f64>,
    range: Cell<(f64, f64)>,
}

impl UiWidget {
    /// Create a widget bound to `parameter` and subscribe it
    pub fn attach(registry: &Rc<ParameterRegistry>, parameter: &str) -> Rc<Self> {
        let widget = Rc::new(Self {
            id: ControllerId::next(),
            parameter: parameter.to_string(),
            registry: registry.clone(),
            displayed: Cell::new(0.0),
            range: Cell::new(registry.range(parameter).unwrap_or((0.0, 1.0))),
        });
        registry.subscribe(&widget, parameter, Priority::UI);
        widget
    }

    /// User dragged the slider to `normalized`
    pub fn drag(&self, normalized: f64) -> WriteOutcome {
        self.registry
            .set_normalized_value(&self.parameter, normalized, Some(self.id), Priority::UI)
    }

    pub fn displayed(&self) -> f64 {
        self.displayed.get()
    }

    pub fn range(&self) -> (f64, f64) {
        self.range.get()
    }
}

impl Controller for UiWidget {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn on_parameter_changed(&self, name: &str, value: f64) {
        if name == self.parameter {
            self.displayed.set(value);
        }
    }

    fn on_range_changed(&self, name: &str, min: f64, max: f64) {
        if name == self.parameter {
            self.range.set((min, max));
        }
    }
}
