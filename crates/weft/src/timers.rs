//! Timer bookkeeping for an application container.
//!
//! Timers run as local tasks; the container keeps their join handles so they can be
//! aborted individually or all at once on destroy.

use core::fmt;
use std::collections::HashMap;

use tokio::task::JoinHandle;

/// Identifies a timer started through an [`App`](crate::App).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerKind {
    Interval,
    Timeout,
}

#[derive(Default)]
pub(crate) struct TimerSet {
    next_id: u64,
    intervals: HashMap<TimerId, JoinHandle<()>>,
    timeouts: HashMap<TimerId, JoinHandle<()>>,
}

impl TimerSet {
    pub(crate) fn allocate(&mut self) -> TimerId {
        self.next_id = self.next_id.saturating_add(1);
        TimerId(self.next_id)
    }

    pub(crate) fn track(&mut self, id: TimerId, kind: TimerKind, handle: JoinHandle<()>) {
        let table = match kind {
            TimerKind::Interval => &mut self.intervals,
            TimerKind::Timeout => &mut self.timeouts,
        };
        if let Some(previous) = table.insert(id, handle) {
            previous.abort();
        }
    }

    /// Forgets a timeout that has fired. Its task is finishing on its own.
    pub(crate) fn finish_timeout(&mut self, id: TimerId) {
        self.timeouts.remove(&id);
    }

    /// Aborts one timer. Returns false if it is unknown, already fired or of the other kind.
    pub(crate) fn cancel(&mut self, id: TimerId, kind: TimerKind) -> bool {
        let table = match kind {
            TimerKind::Interval => &mut self.intervals,
            TimerKind::Timeout => &mut self.timeouts,
        };
        table.remove(&id).is_some_and(|handle| {
            handle.abort();
            true
        })
    }

    /// Aborts every timer, returning how many were live.
    pub(crate) fn cancel_all(&mut self) -> usize {
        let count = self.len();
        for (_, handle) in self.intervals.drain().chain(self.timeouts.drain()) {
            handle.abort();
        }
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.intervals.len() + self.timeouts.len()
    }
}
