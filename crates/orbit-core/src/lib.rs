//! Orbit Core - parameter synchronization engine
//!
//! A registry of named, range-bound parameters that any number of controllers
//! (UI widgets, MIDI surfaces, sensors, automation) write to and observe.
//!
//! - [`registry::ParameterRegistry`] owns all state and is the only mutator
//! - [`arbitration::decide`] resolves near-simultaneous writes from different sources
//! - [`controller::Controller`] is the observer contract every collaborator implements
//! - [`transform::Curve`] provides the stock forward/inverse transform pairs
//!
//! # Architecture
//!
//! ```text
//! UI / MIDI / sensor / LFO ──set_*──▶ ParameterRegistry ──decide()──▶ commit
//!                                             │
//!                                             └──fanout──▶ Controller::on_parameter_changed
//! ```
//!
//! The registry is single-threaded (`Rc` + `RefCell`). Producers living on
//! other threads hand their events to the owning thread through a channel.

pub mod arbitration;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod parameter;
pub mod range;
pub mod registry;
pub mod transform;
pub mod types;

pub use arbitration::{decide, AcceptReason, Decision, Incumbent, WriteAttempt, SIMULTANEOUS_WINDOW};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::Controller;
pub use error::{ParameterError, ParameterResult};
pub use parameter::{ParameterDef, ParameterInfo, Scale};
pub use range::{clamp, denormalize, normalize};
pub use registry::{ParameterRegistry, WriteOutcome};
pub use transform::{ControlPoint, Curve, PiecewiseLinear, TransformFn, TransformPair};
pub use types::{ControllerId, Priority};
