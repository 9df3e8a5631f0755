//! Identity and priority types shared by every controller

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTROLLER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a controller
///
/// Used for echo suppression, unsubscription and the "same controller" check
/// during arbitration. Allocate one per controller instance with [`ControllerId::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ControllerId(u64);

impl ControllerId {
    /// Allocate a fresh, process-unique id
    pub fn next() -> Self {
        Self(NEXT_CONTROLLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value (for logging)
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Contention rank of a write source. Lower value wins.
///
/// Priority only matters inside the simultaneity window; it never affects
/// notification order. The constants are conventions, not an enforced set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub u32);

impl Priority {
    /// Highest possible priority
    pub const HIGHEST: Priority = Priority(0);
    /// Hardware control surfaces (faders, knobs)
    pub const CONTROL_SURFACE: Priority = Priority(1);
    /// Motion / orientation sensors
    pub const SENSOR: Priority = Priority(3);
    /// Mouse and touch widgets
    pub const UI: Priority = Priority(5);
    /// Lowest possible priority; also the value used when a caller omits one
    pub const LOWEST: Priority = Priority(u32::MAX);
    /// Background automation (LFOs)
    pub const AUTOMATION: Priority = Priority::LOWEST;

    /// Whether `self` beats `other` (strictly numerically smaller)
    pub fn outranks(self, other: Priority) -> bool {
        self.0 < other.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::LOWEST
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Priority::LOWEST {
            write!(f, "lowest")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
