//! Engine thread state
//!
//! Owns the registry and every controller attached to it. Everything here
//! lives on one thread; other threads reach it only through the command
//! channel and the MIDI bridge.

use crate::automation::Lfo;
use crate::config::PlayerConfig;
use crate::console::Command;
use crate::display::{render_table, LogDisplay};
use crate::sensor::SensorInput;
use crate::ui::UiWidget;
use orbit_core::ParameterRegistry;
use orbit_midi::{DeviceProfile, MidiBridge, MidiInputSender, MidiSink, MidiSurface};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Engine {
    registry: Rc<ParameterRegistry>,
    surface: Rc<MidiSurface>,
    bridge: MidiBridge,
    sensor: Rc<SensorInput>,
    lfos: Vec<Rc<Lfo>>,
    /// Created on first use per parameter
    widgets: RefCell<HashMap<String, Rc<UiWidget>>>,
    _display: Rc<LogDisplay>,
}

impl Engine {
    /// Attach all controllers to an already populated registry
    pub fn new(
        registry: Rc<ParameterRegistry>,
        config: &PlayerConfig,
        profile: DeviceProfile,
        midi_out: impl MidiSink + 'static,
    ) -> Self {
        let display = LogDisplay::attach(&registry);
        let surface = MidiSurface::connect(&registry, profile, midi_out);
        let sensor = SensorInput::attach(&registry, &config.sensor);
        let lfos = config
            .lfos
            .iter()
            .cloned()
            .map(|lfo| Lfo::attach(&registry, lfo))
            .collect();

        Self {
            registry,
            surface,
            bridge: MidiBridge::new(),
            sensor,
            lfos,
            widgets: RefCell::new(HashMap::new()),
            _display: display,
        }
    }

    pub fn registry(&self) -> &Rc<ParameterRegistry> {
        &self.registry
    }

    /// Producer handle for raw MIDI input
    pub fn midi_sender(&self) -> MidiInputSender {
        self.bridge.sender()
    }

    fn widget(&self, parameter: &str) -> Rc<UiWidget> {
        if let Some(widget) = self.widgets.borrow().get(parameter) {
            return widget.clone();
        }
        let widget = UiWidget::attach(&self.registry, parameter);
        self.widgets
            .borrow_mut()
            .insert(parameter.to_string(), widget.clone());
        widget
    }

    pub fn execute(&self, command: Command) -> Flow {
        match command {
            Command::Ui { parameter, normalized } => {
                if !self.registry.contains(&parameter) {
                    log::warn!("Player: No parameter '{}'", parameter);
                    return Flow::Continue;
                }
                let outcome = self.widget(&parameter).drag(normalized);
                log::info!("Player: ui {} {} -> {:?}", parameter, normalized, outcome);
            }
            Command::Midi(bytes) => {
                self.surface.handle_bytes(&bytes);
            }
            Command::Sensor(reading) => {
                self.sensor.push(reading);
            }
            Command::Middle(parameter) => {
                self.registry.set_to_middle(&parameter);
            }
            Command::Range { parameter, min, max } => {
                if let Err(e) = self.registry.set_range(&parameter, min, max) {
                    log::warn!("Player: {}", e);
                }
            }
            Command::List => {
                print!("{}", render_table(&self.registry.list_parameters()));
            }
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Drain queued MIDI input and advance automation by `dt`
    pub fn tick(&self, dt: Duration) {
        self.bridge.drain(&self.surface);
        for lfo in &self.lfos {
            lfo.tick(dt);
        }
    }

    pub fn shutdown(&self) {
        self.surface.clear_feedback();
        log::info!("Player: Engine stopped");
    }
}
