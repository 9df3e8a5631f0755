//! Parameter registry and subscription fanout
//!
//! The registry is the single source of truth for parameter state. It is
//! constructed by the application and handed to every controller as an
//! `Rc<ParameterRegistry>`; all methods take `&self`.
//!
//! Write paths:
//! - authoritative: [`ParameterRegistry::add_or_update_parameter`],
//!   [`ParameterRegistry::set_to_middle`], [`ParameterRegistry::set_range`]
//!   never consult arbitration
//! - contended: [`ParameterRegistry::set_raw_value`],
//!   [`ParameterRegistry::set_normalized_value`],
//!   [`ParameterRegistry::set_controller_value`] go through [`decide`]
//!
//! Fanout happens after the internal borrow is released, so callbacks may
//! call back into the registry.

use crate::arbitration::{decide, Decision, WriteAttempt};
use crate::clock::{Clock, SystemClock};
use crate::controller::Controller;
use crate::error::{ParameterError, ParameterResult};
use crate::parameter::{Parameter, ParameterDef, ParameterInfo, Scale, Subscriber};
use crate::range::{clamp, denormalize, is_valid_range, normalize};
use crate::types::{ControllerId, Priority};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Result of a contended write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Accepted, value changed, observers notified
    Applied,
    /// Accepted, but the clamped value equals the stored one; bookkeeping only
    Unchanged,
    /// Lost arbitration; dropped
    Rejected,
    /// No parameter with that name; nothing happened
    UnknownParameter,
}

impl WriteOutcome {
    /// Whether arbitration let the write through
    pub fn is_accepted(self) -> bool {
        matches!(self, WriteOutcome::Applied | WriteOutcome::Unchanged)
    }
}

/// Pending notification, computed from post-mutation state
#[derive(Debug, Clone)]
enum Notification {
    Value { value: f64, skip: Option<ControllerId> },
    Range { min: f64, max: f64 },
    Scale(Scale),
}

type Targets = Vec<(ControllerId, Rc<dyn Controller>)>;

/// Parameters in registration order, indexed by name
#[derive(Default)]
struct ParameterTable {
    slots: Vec<Parameter>,
    by_name: HashMap<String, usize>,
}

impl ParameterTable {
    fn get(&self, name: &str) -> Option<&Parameter> {
        self.by_name.get(name).map(|&i| &self.slots[i])
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        match self.by_name.get(name) {
            Some(&i) => Some(&mut self.slots[i]),
            None => None,
        }
    }

    fn insert(&mut self, parameter: Parameter) -> usize {
        let index = self.slots.len();
        self.by_name.insert(parameter.name.clone(), index);
        self.slots.push(parameter);
        index
    }

    /// Existing parameter, or a fresh one with default range/value
    fn entry(&mut self, name: &str) -> &mut Parameter {
        let index = match self.by_name.get(name) {
            Some(&i) => i,
            None => {
                log::debug!("Parameters: Creating '{}' with default range [0, 1]", name);
                self.insert(Parameter::with_defaults(name))
            }
        };
        &mut self.slots[index]
    }
}

/// Live subscribers of a parameter; drops entries whose controller is gone
fn live_targets(parameter: &mut Parameter) -> Targets {
    let mut targets = Vec::with_capacity(parameter.subscribers.len());
    parameter.subscribers.retain(|s| match s.controller.upgrade() {
        Some(controller) => {
            targets.push((s.id, controller));
            true
        }
        None => {
            log::debug!(
                "Parameters: Dropping subscriber {} of '{}' (controller gone)",
                s.id,
                parameter.name
            );
            false
        }
    });
    targets
}

/// Shared registry of named, range-bound parameters
pub struct ParameterRegistry {
    table: RefCell<ParameterTable>,
    clock: Box<dyn Clock>,
}

impl ParameterRegistry {
    /// Registry on the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }

    /// Registry on a caller-supplied clock (e.g. [`crate::ManualClock`])
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            table: RefCell::new(ParameterTable::default()),
            clock: Box::new(clock),
        }
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Create a parameter, or reset an existing one in place
    ///
    /// The raw value is `clamp(input_transform(seed))`. Existing parameters get
    /// range and scale notifications when those changed, and always a value
    /// notification. Arbitration is not consulted and bookkeeping is untouched.
    pub fn add_or_update_parameter(&self, def: ParameterDef) -> ParameterResult<()> {
        if !is_valid_range(def.min, def.max) {
            return Err(ParameterError::InvalidRange {
                name: def.name,
                min: def.min,
                max: def.max,
            });
        }

        let name = def.name.clone();
        let mut table = self.table.borrow_mut();
        let (notifications, targets) = match table.get_mut(&name) {
            Some(p) => {
                let range_changed = p.min != def.min || p.max != def.max;
                let scale_changed = p.scale != def.scale;
                p.min = def.min;
                p.max = def.max;
                p.scale = def.scale;
                p.is_bidirectional = def.bidirectional;
                p.input_transform = def.input_transform;
                p.output_transform = def.output_transform;
                p.raw_value = clamp(p.input_transform.apply(def.seed), p.min, p.max);
                p.normalized_value = normalize(p.raw_value, p.min, p.max);

                let mut notifications = Vec::with_capacity(3);
                if range_changed {
                    notifications.push(Notification::Range { min: p.min, max: p.max });
                }
                notifications.push(Notification::Value {
                    value: p.output_value(),
                    skip: None,
                });
                if scale_changed {
                    notifications.push(Notification::Scale(p.scale.clone()));
                }
                log::debug!(
                    "Parameters: Updated '{}' range=[{}, {}] raw={:.4}",
                    name,
                    p.min,
                    p.max,
                    p.raw_value
                );
                (notifications, live_targets(p))
            }
            None => {
                let p = Parameter::from_def(def);
                log::debug!(
                    "Parameters: Registered '{}' range=[{}, {}] raw={:.4} scale={}",
                    name,
                    p.min,
                    p.max,
                    p.raw_value,
                    p.scale
                );
                table.insert(p);
                // A brand-new parameter has nobody to tell yet
                (Vec::new(), Vec::new())
            }
        };
        drop(table);

        self.dispatch(&name, &targets, &notifications);
        Ok(())
    }

    /// Change a parameter's range at runtime
    ///
    /// Notifies every subscriber and recomputes the normalized value. The raw
    /// value is not re-clamped until the next write. Returns `Ok(false)` for an
    /// unknown name.
    pub fn set_range(&self, name: &str, min: f64, max: f64) -> ParameterResult<bool> {
        if !is_valid_range(min, max) {
            return Err(ParameterError::InvalidRange {
                name: name.to_string(),
                min,
                max,
            });
        }

        let mut table = self.table.borrow_mut();
        let Some(p) = table.get_mut(name) else {
            log::warn!("Parameters: set_range on unknown parameter '{}' ignored", name);
            return Ok(false);
        };
        if p.min == min && p.max == max {
            return Ok(true);
        }
        p.min = min;
        p.max = max;
        p.normalized_value = normalize(p.raw_value, min, max);
        let targets = live_targets(p);
        drop(table);

        self.dispatch(name, &targets, &[Notification::Range { min, max }]);
        Ok(true)
    }

    /// Change a parameter's scale tag; returns `false` for an unknown name
    pub fn set_scale(&self, name: &str, scale: Scale) -> bool {
        let mut table = self.table.borrow_mut();
        let Some(p) = table.get_mut(name) else {
            log::warn!("Parameters: set_scale on unknown parameter '{}' ignored", name);
            return false;
        };
        if p.scale == scale {
            return true;
        }
        p.scale = scale.clone();
        let targets = live_targets(p);
        drop(table);

        self.dispatch(name, &targets, &[Notification::Scale(scale)]);
        true
    }

    // ── Subscription ──────────────────────────────────────────────────────

    /// Subscribe `controller` to `name`, creating the parameter if needed
    ///
    /// Subscribing again updates the priority in place. The controller gets
    /// one value notification with the current state before this returns.
    /// The registry keeps only a weak reference.
    pub fn subscribe<C: Controller + 'static>(&self, controller: &Rc<C>, name: &str, priority: Priority) {
        let handle: Rc<dyn Controller> = controller.clone();
        self.subscribe_dyn(&handle, name, priority);
    }

    /// [`Self::subscribe`] for controllers already behind `Rc<dyn Controller>`
    pub fn subscribe_dyn(&self, handle: &Rc<dyn Controller>, name: &str, priority: Priority) {
        let id = handle.id();

        let value = {
            let mut table = self.table.borrow_mut();
            let p = table.entry(name);
            match p.subscribers.iter_mut().find(|s| s.id == id) {
                Some(existing) => {
                    existing.priority = priority;
                    existing.controller = Rc::downgrade(handle);
                }
                None => p.subscribers.push(Subscriber {
                    id,
                    controller: Rc::downgrade(handle),
                    priority,
                }),
            }
            log::debug!(
                "Parameters: {} subscribed to '{}' (priority {})",
                id,
                name,
                priority
            );
            p.output_value()
        };

        handle.on_parameter_changed(name, value);
    }

    /// Remove `controller` from `name`'s subscribers; `false` if it was not there
    pub fn unsubscribe(&self, controller: ControllerId, name: &str) -> bool {
        let mut table = self.table.borrow_mut();
        let Some(p) = table.get_mut(name) else {
            log::warn!("Parameters: unsubscribe from unknown parameter '{}' ignored", name);
            return false;
        };
        let before = p.subscribers.len();
        p.subscribers.retain(|s| s.id != controller);
        if p.subscribers.len() == before {
            log::warn!("Parameters: {} is not subscribed to '{}'", controller, name);
            return false;
        }
        true
    }

    // ── Contended writes ──────────────────────────────────────────────────

    /// Write a raw candidate (input transform applied, then clamped)
    pub fn set_raw_value(
        &self,
        name: &str,
        raw: f64,
        source: Option<ControllerId>,
        priority: Priority,
    ) -> WriteOutcome {
        self.contended_write(name, source, priority, "set_raw_value", |p| {
            p.input_transform.apply(raw)
        })
    }

    /// Write a canonical `[0, 1]` value (denormalized, input transform applied, clamped)
    pub fn set_normalized_value(
        &self,
        name: &str,
        normalized: f64,
        source: Option<ControllerId>,
        priority: Priority,
    ) -> WriteOutcome {
        self.contended_write(name, source, priority, "set_normalized_value", |p| {
            p.input_transform.apply(denormalize(normalized, p.min, p.max))
        })
    }

    /// Write a value in the controller's native domain
    ///
    /// The input transform turns it into the raw candidate, which then goes
    /// through the same arbitration and commit as [`Self::set_raw_value`].
    /// Not equivalent to [`Self::set_normalized_value`] unless the input
    /// transform is linear.
    pub fn set_controller_value(
        &self,
        name: &str,
        controller_value: f64,
        source: Option<ControllerId>,
        priority: Priority,
    ) -> WriteOutcome {
        self.contended_write(name, source, priority, "set_controller_value", |p| {
            p.input_transform.apply(controller_value)
        })
    }

    fn contended_write(
        &self,
        name: &str,
        source: Option<ControllerId>,
        priority: Priority,
        op: &str,
        candidate: impl FnOnce(&Parameter) -> f64,
    ) -> WriteOutcome {
        let now = self.clock.now();
        let mut table = self.table.borrow_mut();
        let Some(p) = table.get_mut(name) else {
            log::warn!("Parameters: {} on unknown parameter '{}' ignored", op, name);
            return WriteOutcome::UnknownParameter;
        };

        let attempt = WriteAttempt { source, priority };
        match decide(now, &attempt, &p.incumbent()) {
            Decision::Reject => {
                log::trace!(
                    "Parameters: '{}' write from {:?} (priority {}) lost to {:?} (priority {})",
                    name,
                    source,
                    priority,
                    p.last_controller,
                    p.last_priority
                );
                return WriteOutcome::Rejected;
            }
            Decision::Accept(reason) => {
                log::trace!("Parameters: '{}' write from {:?} accepted ({:?})", name, source, reason);
            }
        }

        let raw = candidate(p);
        let changed = p.store_raw(raw);
        p.last_priority = priority;
        p.last_controller = source;
        p.last_update = Some(now);
        if !changed {
            return WriteOutcome::Unchanged;
        }

        let skip = if p.is_bidirectional { None } else { source };
        let notification = Notification::Value {
            value: p.output_value(),
            skip,
        };
        let targets = live_targets(p);
        drop(table);

        self.dispatch(name, &targets, &[notification]);
        WriteOutcome::Applied
    }

    // ── Authoritative reset ───────────────────────────────────────────────

    /// Snap to the middle of the range and notify every subscriber
    ///
    /// Bypasses arbitration and echo suppression. Returns `false` for an
    /// unknown name.
    pub fn set_to_middle(&self, name: &str) -> bool {
        let mut table = self.table.borrow_mut();
        let Some(p) = table.get_mut(name) else {
            log::warn!("Parameters: set_to_middle on unknown parameter '{}' ignored", name);
            return false;
        };
        p.raw_value = (p.min + p.max) / 2.0;
        p.normalized_value = 0.5;
        let notification = Notification::Value {
            value: p.output_value(),
            skip: None,
        };
        let targets = live_targets(p);
        drop(table);

        self.dispatch(name, &targets, &[notification]);
        true
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn raw_value(&self, name: &str) -> Option<f64> {
        self.table.borrow().get(name).map(|p| p.raw_value)
    }

    pub fn normalized_value(&self, name: &str) -> Option<f64> {
        self.table.borrow().get(name).map(|p| p.normalized_value)
    }

    /// Raw value with the output transform applied
    pub fn output_value(&self, name: &str) -> Option<f64> {
        self.table.borrow().get(name).map(Parameter::output_value)
    }

    pub fn range(&self, name: &str) -> Option<(f64, f64)> {
        let range = self.table.borrow().get(name).map(|p| (p.min, p.max));
        if range.is_none() {
            log::warn!("Parameters: range of unknown parameter '{}' requested", name);
        }
        range
    }

    pub fn scale(&self, name: &str) -> Option<Scale> {
        let scale = self.table.borrow().get(name).map(|p| p.scale.clone());
        if scale.is_none() {
            log::warn!("Parameters: scale of unknown parameter '{}' requested", name);
        }
        scale
    }

    /// Whether writers hear their own accepted writes on `name`
    pub fn is_bidirectional(&self, name: &str) -> Option<bool> {
        self.table.borrow().get(name).map(|p| p.is_bidirectional)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.borrow().get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.table.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of one parameter
    pub fn parameter(&self, name: &str) -> Option<ParameterInfo> {
        self.table.borrow().get(name).map(Parameter::info)
    }

    /// Snapshots of all parameters in registration order
    pub fn list_parameters(&self) -> Vec<ParameterInfo> {
        self.table.borrow().slots.iter().map(Parameter::info).collect()
    }

    // ── Fanout ────────────────────────────────────────────────────────────

    fn dispatch(&self, name: &str, targets: &Targets, notifications: &[Notification]) {
        for notification in notifications {
            for (id, controller) in targets {
                match notification {
                    Notification::Value { value, skip } => {
                        if *skip == Some(*id) {
                            continue;
                        }
                        controller.on_parameter_changed(name, *value);
                    }
                    Notification::Range { min, max } => controller.on_range_changed(name, *min, *max),
                    Notification::Scale(scale) => controller.on_scale_changed(name, scale),
                }
            }
        }
    }
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParameterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterRegistry")
            .field("parameters", &self.len())
            .finish()
    }
}
