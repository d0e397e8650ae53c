//! What the device is believed to show, per physical line.
//!
//! The cache has no locking of its own. The synchronizer owns it next to the
//! device link, behind one lock, and writes to it only after the device
//! confirmed a command.

use std::collections::HashMap;

use ledbridge_domain::id::PhysicalLine;
use ledbridge_domain::output::LineState;
use ledbridge_domain::time::{Timestamp, now};

#[derive(Debug, Clone, Copy)]
struct Entry {
    state: LineState,
    /// `None` for seeded entries that were never confirmed by a round-trip.
    confirmed_at: Option<Timestamp>,
}

/// Last confirmed state of each line.
#[derive(Debug, Default)]
pub struct StateCache {
    entries: HashMap<PhysicalLine, Entry>,
}

impl StateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known state of `line`, or `None` when unknown.
    #[must_use]
    pub fn observed(&self, line: PhysicalLine) -> Option<LineState> {
        self.entries.get(&line).map(|entry| entry.state)
    }

    /// When the current state of `line` was confirmed by the device.
    #[must_use]
    pub fn confirmed_at(&self, line: PhysicalLine) -> Option<Timestamp> {
        self.entries.get(&line).and_then(|entry| entry.confirmed_at)
    }

    /// Overwrite the state of `line` after a confirmed acknowledgement.
    pub fn record(&mut self, line: PhysicalLine, state: LineState) {
        self.entries.insert(
            line,
            Entry {
                state,
                confirmed_at: Some(now()),
            },
        );
    }

    /// Set a state known without a round-trip (the device's reset state).
    pub fn seed(&mut self, line: PhysicalLine, state: LineState) {
        self.entries.insert(
            line,
            Entry {
                state,
                confirmed_at: None,
            },
        );
    }

    /// Forget everything, e.g. when the device was reset by a reconnect.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
