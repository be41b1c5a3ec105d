//! Countdown ticker.
//!
//! A one-second decrementer with pub/sub. Like the rest of the core it owns
//! no thread: the embedder calls [`CountdownTicker::tick`] once a second from
//! the same logical thread that calls [`CountdownTicker::extend`], which keeps
//! all mutation serialized without a lock.
//!
//! ## State Transitions
//!
//! ```text
//! new() -> Running -> dispose() -> Disposed (terminal)
//! ```
//!
//! The ticker is a cheap handle; clones share the same countdown.
//!
//! Embedders without their own clock can hand the ticker a [`Scheduler`] via
//! [`CountdownTicker::start`]; it then re-arms a one-second action for itself
//! while time remains, and again after an `extend` revives it from zero.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::events::Event;
use crate::scheduler::Scheduler;

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickerState {
    Running,
    Disposed,
}

type Listener = Rc<dyn Fn(u64)>;

struct TickerInner {
    remaining_secs: u64,
    state: TickerState,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
    driver: Option<Rc<dyn Scheduler>>,
    armed: bool,
}

#[derive(Clone)]
pub struct CountdownTicker {
    inner: Rc<RefCell<TickerInner>>,
}

/// Handle returned by [`CountdownTicker::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug)]
pub struct Subscription {
    inner: Weak<RefCell<TickerInner>>,
    id: u64,
}

impl Subscription {
    /// Remove the listener. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .borrow_mut()
                .listeners
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for TickerInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerInner")
            .field("remaining_secs", &self.remaining_secs)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .field("driven", &self.driver.is_some())
            .field("armed", &self.armed)
            .finish()
    }
}

impl std::fmt::Debug for CountdownTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.inner.borrow(), f)
    }
}

impl CountdownTicker {
    /// Start counting down from `start_secs`, floored at 0.
    pub fn new(start_secs: i64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TickerInner {
                remaining_secs: start_secs.max(0) as u64,
                state: TickerState::Running,
                listeners: Vec::new(),
                next_listener_id: 1,
                driver: None,
                armed: false,
            })),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn remaining_secs(&self) -> u64 {
        self.inner.borrow().remaining_secs
    }

    pub fn state(&self) -> TickerState {
        self.inner.borrow().state
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// One-second step. Decrements while time remains; emits on change.
    pub fn tick(&self) -> Option<Event> {
        let remaining = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != TickerState::Running || inner.remaining_secs == 0 {
                return None;
            }
            inner.remaining_secs -= 1;
            inner.remaining_secs
        };
        self.emit(remaining);

        if remaining == 0 {
            tracing::info!("countdown elapsed");
            Some(Event::CountdownElapsed { at: Utc::now() })
        } else {
            Some(Event::CountdownTicked {
                remaining_secs: remaining,
                at: Utc::now(),
            })
        }
    }

    /// Add signed seconds, flooring at 0. Always notifies, even when the
    /// value did not change. `None` once disposed.
    pub fn extend(&self, by_secs: i64) -> Option<Event> {
        let remaining = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != TickerState::Running {
                return None;
            }
            let next = (inner.remaining_secs as i64).saturating_add(by_secs).max(0);
            inner.remaining_secs = next as u64;
            inner.remaining_secs
        };
        tracing::debug!(by_secs, remaining, "countdown extended");
        self.emit(remaining);
        self.arm();
        Some(Event::TimerExtended {
            delta_secs: by_secs,
            remaining_secs: remaining,
            at: Utc::now(),
        })
    }

    /// Register `listener`; it is called with the current value before this
    /// returns, then on every change.
    ///
    /// After disposal the listener still receives the current value once but
    /// is not retained.
    pub fn subscribe(&self, listener: impl Fn(u64) + 'static) -> Subscription {
        let listener: Listener = Rc::new(listener);
        let (id, remaining) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            if inner.state == TickerState::Running {
                inner.listeners.push((id, Rc::clone(&listener)));
            }
            (id, inner.remaining_secs)
        };
        listener(remaining);
        Subscription {
            inner: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Let `scheduler` drive the one-second step. `false` if the ticker is
    /// disposed or already driven.
    pub fn start(&self, scheduler: Rc<dyn Scheduler>) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state != TickerState::Running || inner.driver.is_some() {
                return false;
            }
            inner.driver = Some(scheduler);
        }
        self.arm();
        true
    }

    /// Stop the countdown and drop every listener. `None` if already disposed.
    pub fn dispose(&self) -> Option<Event> {
        let (listeners, driver, remaining) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == TickerState::Disposed {
                return None;
            }
            inner.state = TickerState::Disposed;
            (
                std::mem::take(&mut inner.listeners),
                inner.driver.take(),
                inner.remaining_secs,
            )
        };
        // Captured state may touch the ticker when dropped.
        drop(listeners);
        drop(driver);
        Some(Event::CountdownDisposed {
            remaining_secs: remaining,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Listeners are snapshotted first so they may call back into the ticker.
    /// One removed by an earlier listener in the same round is skipped.
    fn emit(&self, remaining: u64) {
        let listeners: Vec<(u64, Listener)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(id, l)| (*id, Rc::clone(l)))
            .collect();
        for (id, listener) in listeners {
            let still_subscribed = self
                .inner
                .borrow()
                .listeners
                .iter()
                .any(|(current, _)| *current == id);
            if still_subscribed {
                listener(remaining);
            }
        }
    }

    /// Queue the next driven step unless one is queued or nothing remains.
    fn arm(&self) {
        let scheduler = {
            let mut inner = self.inner.borrow_mut();
            if inner.armed || inner.state != TickerState::Running || inner.remaining_secs == 0 {
                return;
            }
            let Some(scheduler) = inner.driver.clone() else {
                return;
            };
            inner.armed = true;
            scheduler
        };
        let weak = Rc::downgrade(&self.inner);
        scheduler.schedule_after(
            TICK_PERIOD,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let ticker = CountdownTicker { inner };
                ticker.inner.borrow_mut().armed = false;
                ticker.tick();
                ticker.arm();
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use std::cell::Cell;

    fn recorder() -> (Rc<RefCell<Vec<u64>>>, impl Fn(u64) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |v| sink.borrow_mut().push(v))
    }

    #[test]
    fn negative_start_floors_at_zero() {
        let ticker = CountdownTicker::new(-30);
        assert_eq!(ticker.remaining_secs(), 0);
        assert_eq!(ticker.state(), TickerState::Running);
    }

    #[test]
    fn tick_decrements_and_stops_at_zero() {
        let ticker = CountdownTicker::new(2);
        assert!(matches!(ticker.tick(), Some(Event::CountdownTicked { remaining_secs: 1, .. })));
        assert!(matches!(ticker.tick(), Some(Event::CountdownElapsed { .. })));
        assert!(ticker.tick().is_none());
        assert_eq!(ticker.remaining_secs(), 0);
    }

    #[test]
    fn extend_floors_at_zero() {
        let ticker = CountdownTicker::new(1800);
        ticker.extend(-1900);
        assert_eq!(ticker.remaining_secs(), 0);
        ticker.extend(90);
        assert_eq!(ticker.remaining_secs(), 90);
    }

    #[test]
    fn subscribe_emits_immediately_then_on_change() {
        let ticker = CountdownTicker::new(10);
        let (seen, listener) = recorder();
        let _sub = ticker.subscribe(listener);
        assert_eq!(*seen.borrow(), vec![10]);
        ticker.tick();
        ticker.extend(5);
        assert_eq!(*seen.borrow(), vec![10, 9, 14]);
    }

    #[test]
    fn extend_notifies_even_without_change() {
        let ticker = CountdownTicker::new(0);
        let (seen, listener) = recorder();
        let _sub = ticker.subscribe(listener);
        ticker.extend(-60);
        assert_eq!(*seen.borrow(), vec![0, 0]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let ticker = CountdownTicker::new(10);
        let (seen, listener) = recorder();
        let sub = ticker.subscribe(listener);
        sub.unsubscribe();
        sub.unsubscribe();
        ticker.tick();
        assert_eq!(*seen.borrow(), vec![10]);
        assert_eq!(ticker.listener_count(), 0);
    }

    #[test]
    fn listener_removed_mid_round_gets_no_further_calls() {
        let ticker = CountdownTicker::new(10);
        let (seen, listener) = recorder();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&victim);
        let _remover = ticker.subscribe(move |v| {
            if v == 9 {
                if let Some(sub) = slot.borrow().as_ref() {
                    sub.unsubscribe();
                }
            }
        });
        *victim.borrow_mut() = Some(ticker.subscribe(listener));

        ticker.tick();
        ticker.tick();
        assert_eq!(*seen.borrow(), vec![10]);
        assert_eq!(ticker.listener_count(), 1);
    }

    #[test]
    fn dispose_tolerates_listener_state_touching_ticker_on_drop() {
        struct ReadsOnDrop(CountdownTicker, Rc<Cell<Option<u64>>>);
        impl Drop for ReadsOnDrop {
            fn drop(&mut self) {
                self.1.set(Some(self.0.remaining_secs()));
            }
        }

        let ticker = CountdownTicker::new(42);
        let read = Rc::new(Cell::new(None));
        let guard = ReadsOnDrop(ticker.clone(), Rc::clone(&read));
        let _sub = ticker.subscribe(move |_| {
            let _ = guard.0.state();
        });

        assert!(ticker.dispose().is_some());
        assert_eq!(read.get(), Some(42));
    }

    #[test]
    fn started_ticker_counts_down_on_scheduler() {
        let scheduler = Rc::new(ManualScheduler::new());
        let ticker = CountdownTicker::new(3);
        let (seen, listener) = recorder();
        let _sub = ticker.subscribe(listener);

        assert!(ticker.start(scheduler.clone()));
        assert!(!ticker.start(scheduler.clone()));

        scheduler.advance(Duration::from_millis(999));
        assert_eq!(ticker.remaining_secs(), 3);
        scheduler.advance(Duration::from_millis(1));
        assert_eq!(ticker.remaining_secs(), 2);

        // Stops re-arming at zero.
        assert_eq!(scheduler.run_until_idle(), 2);
        assert_eq!(*seen.borrow(), vec![3, 2, 1, 0]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn extend_revives_a_started_ticker_at_zero() {
        let scheduler = Rc::new(ManualScheduler::new());
        let ticker = CountdownTicker::new(1);
        ticker.start(scheduler.clone());
        scheduler.run_until_idle();
        assert_eq!(ticker.remaining_secs(), 0);

        ticker.extend(2);
        assert_eq!(scheduler.pending(), 1);
        scheduler.run_until_idle();
        assert_eq!(ticker.remaining_secs(), 0);
        assert_eq!(scheduler.now(), Duration::from_secs(3));
    }

    #[test]
    fn listener_extending_mid_tick_does_not_double_arm() {
        let scheduler = Rc::new(ManualScheduler::new());
        let ticker = CountdownTicker::new(2);
        let handle = ticker.clone();
        let _sub = ticker.subscribe(move |v| {
            if v == 1 {
                handle.extend(1);
            }
        });
        ticker.start(scheduler.clone());

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(ticker.remaining_secs(), 2);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn dispose_stops_a_started_ticker() {
        let scheduler = Rc::new(ManualScheduler::new());
        let ticker = CountdownTicker::new(5);
        ticker.start(scheduler.clone());
        scheduler.advance(Duration::from_secs(1));
        ticker.dispose();

        scheduler.run_until_idle();
        assert_eq!(ticker.remaining_secs(), 4);
        assert!(!ticker.start(scheduler.clone()));
    }

    #[test]
    fn dispose_is_terminal() {
        let ticker = CountdownTicker::new(10);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let _sub = ticker.subscribe(move |_| counter.set(counter.get() + 1));

        assert!(ticker.dispose().is_some());
        assert!(ticker.dispose().is_none());
        assert!(ticker.tick().is_none());
        assert!(ticker.extend(60).is_none());
        assert_eq!(ticker.remaining_secs(), 10);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn listener_may_reenter_ticker() {
        let ticker = CountdownTicker::new(3);
        let handle = ticker.clone();
        let _sub = ticker.subscribe(move |v| {
            if v == 2 {
                handle.extend(10);
            }
        });
        ticker.tick();
        assert_eq!(ticker.remaining_secs(), 12);
    }
}
