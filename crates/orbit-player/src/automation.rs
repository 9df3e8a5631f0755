//! LFO automation controller
//!
//! Sweeps a target parameter at the lowest priority, so any human or sensor
//! input inside the simultaneity window wins. Rate and depth are themselves
//! parameters; the LFO subscribes to them and picks up changes from any
//! controller.

use crate::config::{LfoConfig, Waveform};
use orbit_core::{Controller, ControllerId, ParameterRegistry, Priority, WriteOutcome};
use std::cell::Cell;
use std::f64::consts::TAU;
use std::rc::Rc;
use std::time::Duration;

pub struct Lfo {
    id: ControllerId,
    registry: Rc<ParameterRegistry>,
    config: LfoConfig,
    /// Position within the cycle, 0.0-1.0
    phase: Cell<f64>,
    rate_hz: Cell<f64>,
    depth: Cell<f64>,
}

impl Lfo {
    pub fn attach(registry: &Rc<ParameterRegistry>, config: LfoConfig) -> Rc<Self> {
        let lfo = Rc::new(Self {
            id: ControllerId::next(),
            registry: registry.clone(),
            config,
            phase: Cell::new(0.0),
            rate_hz: Cell::new(0.0),
            depth: Cell::new(0.0),
        });
        // Subscribing delivers the current rate and depth immediately
        registry.subscribe(&lfo, &lfo.config.rate_param, Priority::AUTOMATION);
        registry.subscribe(&lfo, &lfo.config.depth_param, Priority::AUTOMATION);
        log::info!(
            "LFO: {:?} on '{}' (rate {:.2} Hz, depth {:.2})",
            lfo.config.waveform,
            lfo.config.target,
            lfo.rate_hz.get(),
            lfo.depth.get()
        );
        lfo
    }

    /// Advance by `dt` and write the new position to the target
    pub fn tick(&self, dt: Duration) -> WriteOutcome {
        let phase = (self.phase.get() + self.rate_hz.get() * dt.as_secs_f64()).rem_euclid(1.0);
        self.phase.set(phase);
        let value = 0.5 + 0.5 * self.depth.get() * shape(self.config.waveform, phase);
        self.registry
            .set_normalized_value(&self.config.target, value, Some(self.id), Priority::AUTOMATION)
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz.get()
    }

    pub fn depth(&self) -> f64 {
        self.depth.get()
    }
}

/// Bipolar waveform value (-1..1) at `phase` (0..1)
fn shape(waveform: Waveform, phase: f64) -> f64 {
    match waveform {
        Waveform::Sine => (phase * TAU).sin(),
        Waveform::Triangle => {
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        }
    }
}

impl Controller for Lfo {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn on_parameter_changed(&self, name: &str, value: f64) {
        if name == self.config.rate_param {
            self.rate_hz.set(value.max(0.0));
        } else if name == self.config.depth_param {
            self.depth.set(value.clamp(0.0, 1.0));
        }
    }
}
