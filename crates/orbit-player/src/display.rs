//! Log display controller and parameter table

use orbit_core::{Controller, ControllerId, ParameterInfo, ParameterRegistry, Priority};
use std::fmt::Write;
use std::rc::Rc;

/// Logs every value change of every parameter it watches
pub struct LogDisplay {
    id: ControllerId,
}

impl LogDisplay {
    /// Subscribe to every parameter currently registered
    pub fn attach(registry: &Rc<ParameterRegistry>) -> Rc<Self> {
        let display = Rc::new(Self { id: ControllerId::next() });
        for info in registry.list_parameters() {
            registry.subscribe(&display, &info.name, Priority::LOWEST);
        }
        display
    }
}

impl Controller for LogDisplay {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn on_parameter_changed(&self, name: &str, value: f64) {
        log::debug!("Display: {} = {:.4}", name, value);
    }

    fn on_range_changed(&self, name: &str, min: f64, max: f64) {
        log::info!("Display: {} range [{}, {}]", name, min, max);
    }
}

/// Plain-text table of parameter snapshots for the `list` command
pub fn render_table(parameters: &[ParameterInfo]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:>10} {:>6} {:>10} {:>10} {:<12} {:>5} {:>6}",
        "name", "raw", "norm", "min", "max", "scale", "subs", "owner"
    );
    for p in parameters {
        let owner = p
            .last_controller
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<14} {:>10.4} {:>6.3} {:>10} {:>10} {:<12} {:>5} {:>6}",
            p.name,
            p.raw_value,
            p.normalized_value,
            p.min,
            p.max,
            p.scale.to_string(),
            p.subscribers.len(),
            owner
        );
    }
    out
}
