//! Orbit Player - console host for the parameter registry
//!
//! This is the main entry point. It:
//! 1. Loads parameter, MIDI and player config from `{config_dir}/orbit/`
//! 2. Builds the registry and attaches UI, MIDI, sensor, LFO and display controllers
//! 3. Reads commands from stdin on a separate thread and runs the engine loop
//!
//! ## Command line flags
//!
//! - `--port <name>`: pick the MIDI device profile matching this port name
//! - `--write-defaults`: write default config files that don't exist yet, then exit

mod automation;
mod config;
mod console;
mod display;
mod engine;
mod sensor;
mod ui;

use anyhow::{Context, Result};
use config::{default_player_config_path, PlayerConfig};
use engine::{Engine, Flow};
use orbit_core::config::{default_config_path, load_config, save_config, ParametersConfig};
use orbit_core::ParameterRegistry;
use orbit_midi::{
    default_midi_config_path, load_midi_config, save_midi_config, ChannelSink, DeviceProfile, MidiConfig,
};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Pick the device profile for this session
fn select_profile(midi: &MidiConfig, port: Option<&str>) -> DeviceProfile {
    match port {
        Some(port) => match midi.profile_for_port(port) {
            Ok(profile) => profile.clone(),
            Err(e) => {
                log::warn!("MIDI: {}, using generic profile", e);
                DeviceProfile::generic()
            }
        },
        None => midi.devices.first().cloned().unwrap_or_else(|| {
            log::info!("MIDI: No device profiles configured, using generic profile");
            DeviceProfile::generic()
        }),
    }
}

fn write_defaults() -> Result<()> {
    let parameters_path = default_config_path("parameters.yaml");
    if !parameters_path.exists() {
        save_config(&ParametersConfig::default(), &parameters_path)?;
    }
    let midi_path = default_midi_config_path();
    if !midi_path.exists() {
        let midi = MidiConfig {
            devices: vec![DeviceProfile::generic()],
        };
        save_midi_config(&midi, &midi_path)?;
    }
    let player_path = default_player_config_path();
    if !player_path.exists() {
        save_config(&PlayerConfig::default(), &player_path)?;
    }
    println!("Config written to {:?}", orbit_core::config::config_dir());
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let port = args
        .iter()
        .position(|arg| arg == "--port")
        .and_then(|i| args.get(i + 1))
        .cloned();

    // Set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if args.iter().any(|arg| arg == "--write-defaults") {
        return write_defaults();
    }

    log::info!("orbit-player starting up");

    let player_config: PlayerConfig = load_config(&default_player_config_path());
    let parameters: ParametersConfig = load_config(&default_config_path("parameters.yaml"));
    let midi_config = load_midi_config(&default_midi_config_path());
    let port = port.or_else(|| player_config.midi_port.clone());
    let profile = select_profile(&midi_config, port.as_deref());

    let registry = Rc::new(ParameterRegistry::new());
    parameters
        .register(&registry)
        .context("Invalid parameter definition in parameters.yaml")?;

    // Feedback bytes go to an output thread, as they would to a device
    let (midi_out_tx, midi_out_rx) = flume::bounded::<Vec<u8>>(256);
    let output_thread = std::thread::Builder::new()
        .name("midi-out".to_string())
        .spawn(move || {
            for message in midi_out_rx.iter() {
                log::info!("[MIDI OUT] {:02X?}", message);
            }
        })
        .context("Failed to spawn MIDI output thread")?;

    let engine = Engine::new(registry, &player_config, profile, ChannelSink::new(midi_out_tx));

    let (command_tx, command_rx) = flume::unbounded();
    // Detached: blocked on stdin until the process exits
    let _console = console::spawn_stdin_reader(command_tx, engine.midi_sender())?;

    println!("orbit-player ready. Commands: ui, midi, sensor, middle, range, list, quit");

    let tick = Duration::from_millis(player_config.tick_ms.max(1));
    let mut last_tick = Instant::now();
    loop {
        match command_rx.recv_timeout(tick) {
            Ok(command) => {
                if engine.execute(command) == Flow::Quit {
                    break;
                }
            }
            Err(flume::RecvTimeoutError::Timeout) => {}
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        if now.duration_since(last_tick) >= tick {
            engine.tick(now.duration_since(last_tick));
            last_tick = now;
        }
    }

    engine.shutdown();
    drop(engine);
    if output_thread.join().is_err() {
        log::warn!("MIDI output thread panicked");
    }
    log::info!("orbit-player stopped");
    Ok(())
}
