//! Arbitration of contended writes
//!
//! Every write through the contended path is compared against the parameter's
//! incumbent (the last accepted write). A write is accepted when:
//!
//! - the simultaneity window has elapsed since the incumbent, or
//! - it outranks the incumbent (strictly lower priority number), or
//! - it comes from the incumbent's own controller (continuous drags keep going)
//!
//! Only the single incumbent is consulted, never the set of all writes inside
//! the window, so the outcome of three or more near-simultaneous sources
//! depends on arrival order.

use crate::types::{ControllerId, Priority};
use std::time::Duration;

/// Writes closer together than this are treated as simultaneous
pub const SIMULTANEOUS_WINDOW: Duration = Duration::from_millis(50);

/// State of the last accepted write
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Incumbent {
    /// Time of the last accepted write; `None` before the first one
    pub last_update: Option<Duration>,
    pub last_priority: Priority,
    pub last_controller: Option<ControllerId>,
}

impl Default for Incumbent {
    fn default() -> Self {
        Self {
            last_update: None,
            last_priority: Priority::LOWEST,
            last_controller: None,
        }
    }
}

/// A write asking to be accepted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteAttempt {
    pub source: Option<ControllerId>,
    pub priority: Priority,
}

/// Why a write was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptReason {
    /// No accepted write within the window
    WindowElapsed,
    /// Outranks the incumbent
    HigherPriority,
    /// Same source as the incumbent
    SameController,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept(AcceptReason),
    Reject,
}

impl Decision {
    pub fn is_accepted(self) -> bool {
        matches!(self, Decision::Accept(_))
    }
}

/// Decide whether `attempt` may overwrite `incumbent` at time `now`
pub fn decide(now: Duration, attempt: &WriteAttempt, incumbent: &Incumbent) -> Decision {
    let simultaneous = incumbent
        .last_update
        .map(|last| now.saturating_sub(last) < SIMULTANEOUS_WINDOW)
        .unwrap_or(false);

    if !simultaneous {
        return Decision::Accept(AcceptReason::WindowElapsed);
    }
    if attempt.priority.outranks(incumbent.last_priority) {
        return Decision::Accept(AcceptReason::HigherPriority);
    }
    // Two anonymous writes count as the same source
    if attempt.source == incumbent.last_controller {
        return Decision::Accept(AcceptReason::SameController);
    }
    Decision::Reject
}
