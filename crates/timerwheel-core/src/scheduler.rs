//! Delayed fire-and-forget actions.
//!
//! The commit sequence never sleeps or spawns; it asks a [`Scheduler`] to run
//! a closure later. Tests and the CLI use [`ManualScheduler`], whose virtual
//! clock only moves when told to.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

pub type ScheduledAction = Box<dyn FnOnce()>;

pub trait Scheduler {
    /// Run `action` once, no earlier than `delay` from now. No cancellation.
    fn schedule_after(&self, delay: Duration, action: ScheduledAction);
}

/// Runs every action synchronously, ignoring the delay.
#[derive(Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule_after(&self, _delay: Duration, action: ScheduledAction) {
        action();
    }
}

struct Pending {
    due: Duration,
    seq: u64,
    action: ScheduledAction,
}

/// Deterministic scheduler driven by [`advance`](ManualScheduler::advance).
///
/// Actions with equal deadlines run in the order they were scheduled.
/// An action may schedule further actions; those run in the same `advance`
/// call if they fall due within it.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_seq: Cell<u64>,
    queue: RefCell<VecDeque<Pending>>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now.get())
            .field("pending", &self.pending())
            .finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since construction.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Earliest deadline still queued.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.borrow().iter().map(|p| p.due).min()
    }

    /// Move the clock forward by `by`, running everything that falls due.
    /// Returns the number of actions run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut ran = 0;
        while let Some(pending) = self.pop_due(target) {
            self.now.set(pending.due.max(self.now.get()));
            (pending.action)();
            ran += 1;
        }
        self.now.set(target);
        ran
    }

    /// Advance until the queue is empty.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(due) = self.next_due() {
            let by = due.saturating_sub(self.now.get());
            ran += self.advance(by);
        }
        ran
    }

    /// Removed under a short borrow so the action can schedule more work.
    fn pop_due(&self, target: Duration) -> Option<Pending> {
        let mut queue = self.queue.borrow_mut();
        let index = queue
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;
        queue.remove(index)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, action: ScheduledAction) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.queue.borrow_mut().push_back(Pending {
            due: self.now.get() + delay,
            seq,
            action,
        });
    }
}
