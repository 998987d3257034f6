//! # Rate Governor
//!
//! Keeps the serial transport from being overrun.
//!
//! Each command category remembers when it last dispatched; a category is
//! ready again once the minimum interval has elapsed. After power-on, every
//! category is blocked until the settle window closes. Times are passed in
//! by the caller so the governor is deterministic under test.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Command categories with independent rate clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Pan-tilt drive, relative steps and stop
    Movement,
    /// Zoom drive and zoom stop
    Zoom,
    /// Preset and exposure commands
    Discrete,
    /// Power and port reset
    Power,
}

/// Per-category dispatch clock with a power-on blackout window.
#[derive(Debug, Clone)]
pub struct RateGovernor {
    min_interval: Duration,
    settle: Duration,
    last: HashMap<Category, Instant>,
    settle_until: Option<Instant>,
}

impl RateGovernor {
    /// Creates a governor.
    ///
    /// # Arguments
    ///
    /// * `min_interval` - Minimum time between two commands of one category
    /// * `settle` - Blackout after power-on
    #[must_use]
    pub fn new(min_interval: Duration, settle: Duration) -> Self {
        Self {
            min_interval,
            settle,
            last: HashMap::new(),
            settle_until: None,
        }
    }

    /// Returns true if a command of `category` may be sent at `now`.
    #[must_use]
    pub fn ready(&self, category: Category, now: Instant) -> bool {
        if self.is_settling(now) {
            return false;
        }
        match self.last.get(&category) {
            Some(&last) => now.saturating_duration_since(last) >= self.min_interval,
            None => true,
        }
    }

    /// Records that a command of `category` was dispatched at `now`.
    pub fn record(&mut self, category: Category, now: Instant) {
        self.last.insert(category, now);
    }

    /// Opens the power-on settle window starting at `now`.
    pub fn begin_settle(&mut self, now: Instant) {
        self.settle_until = Some(now + self.settle);
    }

    /// Returns true while the settle window is open.
    #[must_use]
    pub fn is_settling(&self, now: Instant) -> bool {
        self.settle_until.is_some_and(|until| now < until)
    }

    /// Closes the settle window if it has elapsed.
    ///
    /// Returns true exactly once, on the first call after the window ends.
    pub fn end_settle(&mut self, now: Instant) -> bool {
        match self.settle_until {
            Some(until) if now >= until => {
                self.settle_until = None;
                true
            }
            _ => false,
        }
    }

    /// Abandons an open settle window.
    pub fn cancel_settle(&mut self) {
        self.settle_until = None;
    }

    /// Time left in the settle window.
    #[must_use]
    pub fn settle_remaining(&self, now: Instant) -> Duration {
        self.settle_until
            .map_or(Duration::ZERO, |until| until.saturating_duration_since(now))
    }

    /// Forgets every clock. Used when a new session starts.
    pub fn reset(&mut self) {
        self.last.clear();
        self.settle_until = None;
    }
}
