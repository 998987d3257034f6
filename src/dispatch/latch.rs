//! # Edge/Debounce Tracker
//!
//! Turns level-triggered input conditions into single-shot activation
//! events.
//!
//! Each discrete action owns one latch slot in a [`LatchSet`]. An action
//! fires on the idle-to-latched edge, stays silent while held, and re-arms
//! when its physical input is released. Releasing is decided by the input
//! alone, never by the shift mode, so changing modes mid-press neither
//! repeats the old action nor swallows the new one.

use std::collections::HashSet;

use tracing::debug;

use super::bindings::ActionId;
use crate::config::DebounceStrategy;

/// Actions currently latched, awaiting release.
#[derive(Debug, Clone, Default)]
pub struct LatchSet {
    latched: HashSet<ActionId>,
}

impl LatchSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_latched(&self, action: ActionId) -> bool {
        self.latched.contains(&action)
    }

    /// Sets the latch. Returns false if it was already set.
    pub fn latch(&mut self, action: ActionId) -> bool {
        self.latched.insert(action)
    }

    /// Clears the latch. Returns false if it was not set.
    pub fn release(&mut self, action: ActionId) -> bool {
        self.latched.remove(&action)
    }

    pub fn clear_all(&mut self) {
        self.latched.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.latched.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latched.is_empty()
    }
}

/// Raw condition of an action's input this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Input physically let go
    Released,
    /// Input neither released nor triggering this action (for example held
    /// while another shift mode is active)
    Holding,
    /// Input active and bound to this action in the current mode
    Triggered,
}

/// Outcome of observing one action for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Dispatch the action now
    Activated,
    /// Latch cleared this cycle
    Released,
    /// Suppressed repeat
    Held,
    /// Nothing to do
    Idle,
    /// Would activate, but the caller could not dispatch this cycle
    Deferred,
}

/// Applies a [`DebounceStrategy`] over a [`LatchSet`].
#[derive(Debug, Clone)]
pub struct EdgeTracker {
    latches: LatchSet,
    /// Absorbed actions stay silent until released, whatever the strategy
    absorbed: LatchSet,
    strategy: DebounceStrategy,
}

impl EdgeTracker {
    #[must_use]
    pub fn new(strategy: DebounceStrategy) -> Self {
        Self {
            latches: LatchSet::new(),
            absorbed: LatchSet::new(),
            strategy,
        }
    }

    #[must_use]
    pub fn latches(&self) -> &LatchSet {
        &self.latches
    }

    #[must_use]
    pub fn strategy(&self) -> DebounceStrategy {
        self.strategy
    }

    /// Advances the latch of `action` for one cycle.
    ///
    /// `admit` says whether the caller is able to dispatch right now. A
    /// triggered action that is not admitted stays unlatched and reports
    /// [`Edge::Deferred`], so it fires on a later cycle instead of being
    /// lost.
    pub fn observe(&mut self, action: ActionId, condition: Condition, admit: bool) -> Edge {
        match condition {
            Condition::Released => {
                let absorbed = self.absorbed.release(action);
                if self.latches.release(action) || absorbed {
                    debug!("Latch released: {}", action);
                    Edge::Released
                } else {
                    Edge::Idle
                }
            }
            Condition::Holding => {
                if self.latches.is_latched(action) {
                    Edge::Held
                } else {
                    Edge::Idle
                }
            }
            Condition::Triggered => {
                if self.absorbed.is_latched(action) {
                    return Edge::Held;
                }
                let latched = self.latches.is_latched(action);
                if latched && self.strategy == DebounceStrategy::Latched {
                    return Edge::Held;
                }
                if !admit {
                    return Edge::Deferred;
                }
                if !latched {
                    debug!("Latch set: {}", action);
                    self.latches.latch(action);
                }
                Edge::Activated
            }
        }
    }

    /// Records an activation that must not dispatch, such as inputs seen
    /// while the camera is booting. Returns true if the latch was newly set.
    pub fn absorb(&mut self, action: ActionId) -> bool {
        self.absorbed.latch(action);
        self.latches.latch(action)
    }

    pub fn reset(&mut self) {
        self.latches.clear_all();
        self.absorbed.clear_all();
    }
}
