//! Console input
//!
//! One command per line on stdin:
//!
//! ```text
//! ui <param> <normalized>     drag a UI widget
//! midi <hex bytes...>         inject raw MIDI (e.g. `midi b0 07 40`)
//! sensor <x> <y> <z>          push a sensor reading
//! middle <param>              snap to the middle of the range
//! range <param> <min> <max>   change a parameter's range
//! list                        print all parameters
//! quit                        exit
//! ```
//!
//! The reader runs on its own thread. MIDI bytes go straight into the MIDI
//! bridge like a device callback would; everything else is sent to the engine
//! thread over a flume channel.

use anyhow::{anyhow, bail, Context, Result};
use flume::Sender;
use orbit_midi::{parse_hex_bytes, MidiInputSender};
use std::io::BufRead;
use std::thread::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ui { parameter: String, normalized: f64 },
    Midi(Vec<u8>),
    Sensor([f64; 3]),
    Middle(String),
    Range { parameter: String, min: f64, max: f64 },
    List,
    Quit,
}

fn number(token: Option<&str>, what: &str) -> Result<f64> {
    let token = token.ok_or_else(|| anyhow!("missing {}", what))?;
    token
        .parse::<f64>()
        .with_context(|| format!("invalid {} '{}'", what, token))
}

fn name(token: Option<&str>) -> Result<String> {
    token
        .map(str::to_string)
        .ok_or_else(|| anyhow!("missing parameter name"))
}

/// Parse one console line; `Ok(None)` for blank lines and comments
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let Some(verb) = tokens.next() else {
        return Ok(None);
    };

    let command = match verb {
        "ui" => Command::Ui {
            parameter: name(tokens.next())?,
            normalized: number(tokens.next(), "normalized value")?,
        },
        "midi" => {
            let rest = tokens.collect::<Vec<_>>().join(" ");
            return Ok(Some(Command::Midi(parse_hex_bytes(&rest)?)));
        }
        "sensor" => Command::Sensor([
            number(tokens.next(), "x")?,
            number(tokens.next(), "y")?,
            number(tokens.next(), "z")?,
        ]),
        "middle" => Command::Middle(name(tokens.next())?),
        "range" => Command::Range {
            parameter: name(tokens.next())?,
            min: number(tokens.next(), "min")?,
            max: number(tokens.next(), "max")?,
        },
        "list" => Command::List,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{}'", other),
    };

    if let Some(extra) = tokens.next() {
        bail!("unexpected argument '{}'", extra);
    }
    Ok(Some(command))
}

/// Route a parsed command: MIDI to the bridge, the rest to the engine
///
/// Returns `false` once the engine side is gone.
fn route(command: Command, commands: &Sender<Command>, midi: &MidiInputSender) -> bool {
    match command {
        Command::Midi(bytes) => {
            midi.send(&bytes);
            true
        }
        other => commands.send(other).is_ok(),
    }
}

/// Read commands from `input` until EOF or `quit`; EOF sends `Quit`
pub fn read_commands(input: impl BufRead, commands: &Sender<Command>, midi: &MidiInputSender) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Console: Failed to read input: {}", e);
                break;
            }
        };
        match parse_command(&line) {
            Ok(Some(command)) => {
                let quit = command == Command::Quit;
                if !route(command, commands, midi) || quit {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("error: {:#}", e),
        }
    }
    let _ = commands.send(Command::Quit);
}

/// Spawn the stdin reader thread
pub fn spawn_stdin_reader(commands: Sender<Command>, midi: MidiInputSender) -> Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            read_commands(stdin.lock(), &commands, &midi);
        })
        .context("Failed to spawn console thread")
}
