//! Motion sensor controller
//!
//! Writes x/y/z readings to three parameters in the sensor's own units
//! through the controller-value path.

use crate::config::SensorConfig;
use orbit_core::{Controller, ControllerId, ParameterRegistry, Priority, WriteOutcome};
use std::rc::Rc;

pub struct SensorInput {
    id: ControllerId,
    registry: Rc<ParameterRegistry>,
    axes: [String; 3],
    gain: f64,
}

impl SensorInput {
    pub fn attach(registry: &Rc<ParameterRegistry>, config: &SensorConfig) -> Rc<Self> {
        let sensor = Rc::new(Self {
            id: ControllerId::next(),
            registry: registry.clone(),
            axes: config.axes.clone(),
            gain: config.gain,
        });
        for axis in &sensor.axes {
            registry.subscribe(&sensor, axis, Priority::SENSOR);
        }
        sensor
    }

    /// Push one reading; returns the outcome per axis
    pub fn push(&self, reading: [f64; 3]) -> [WriteOutcome; 3] {
        let mut outcomes = [WriteOutcome::UnknownParameter; 3];
        for (i, (axis, value)) in self.axes.iter().zip(reading).enumerate() {
            outcomes[i] =
                self.registry
                    .set_controller_value(axis, value * self.gain, Some(self.id), Priority::SENSOR);
        }
        log::trace!("Sensor: {:?} -> {:?}", reading, outcomes);
        outcomes
    }
}

impl Controller for SensorInput {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn on_parameter_changed(&self, name: &str, value: f64) {
        log::trace!("Sensor: '{}' moved to {:.3} by another source", name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::{ManualClock, ParameterDef};

    #[test]
    fn test_push_writes_all_axes() {
        let clock = ManualClock::new();
        let registry = Rc::new(ParameterRegistry::with_clock(clock.clone()));
        for axis in ["orbit_x", "orbit_y", "orbit_z"] {
            registry
                .add_or_update_parameter(ParameterDef::new(axis, -1.0, 1.0))
                .unwrap();
        }
        let config = SensorConfig {
            gain: 0.5,
            ..SensorConfig::default()
        };
        let sensor = SensorInput::attach(&registry, &config);

        let outcomes = sensor.push([1.0, -4.0, 0.0]);
        assert_eq!(
            outcomes,
            [WriteOutcome::Applied, WriteOutcome::Applied, WriteOutcome::Unchanged]
        );
        assert_eq!(registry.raw_value("orbit_x"), Some(0.5));
        assert_eq!(registry.raw_value("orbit_y"), Some(-1.0));

        // UI loses against the sensor inside the window
        clock.set_millis(10);
        let ui = Some(ControllerId::next());
        assert_eq!(
            registry.set_raw_value("orbit_x", 0.9, ui, Priority::UI),
            WriteOutcome::Rejected
        );
    }
}
