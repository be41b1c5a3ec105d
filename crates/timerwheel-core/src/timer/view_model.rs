//! Glue between a [`CountdownTicker`] and a presentation layer.
//!
//! Construct once and hand it to the view; the view reads or subscribes and
//! never rebuilds it.

use std::cell::Cell;
use std::rc::Rc;

use super::countdown::{CountdownTicker, Subscription};
use crate::events::Event;

#[derive(Debug, Clone)]
pub struct TimerViewModel {
    ticker: CountdownTicker,
    remaining_secs: Rc<Cell<u64>>,
    own_subscription: Rc<Subscription>,
}

impl TimerViewModel {
    /// Start a countdown of `start_minutes`.
    pub fn new(start_minutes: i64) -> Self {
        Self::from_ticker(CountdownTicker::new(start_minutes.saturating_mul(60)))
    }

    pub fn from_ticker(ticker: CountdownTicker) -> Self {
        let remaining_secs = Rc::new(Cell::new(ticker.remaining_secs()));
        let cache = Rc::clone(&remaining_secs);
        // Registered first, so the cache is current before any later listener runs.
        let own_subscription = Rc::new(ticker.subscribe(move |secs| cache.set(secs)));
        Self {
            ticker,
            remaining_secs,
            own_subscription,
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs.get()
    }

    /// Zero-padded `MM:SS`.
    pub fn time_string(&self) -> String {
        format_clock(self.remaining_secs.get())
    }

    pub fn ticker(&self) -> &CountdownTicker {
        &self.ticker
    }

    /// Add (or remove, when negative) whole minutes.
    pub fn extend(&self, minutes: i64) -> Option<Event> {
        self.ticker.extend(minutes.saturating_mul(60))
    }

    pub fn tick(&self) -> Option<Event> {
        self.ticker.tick()
    }

    /// Emits the current value immediately, then every change.
    pub fn subscribe(&self, listener: impl Fn(u64) + 'static) -> Subscription {
        self.ticker.subscribe(listener)
    }

    pub fn dispose(&self) -> Option<Event> {
        self.own_subscription.unsubscribe();
        self.ticker.dispose()
    }
}

/// `MM:SS`; minutes keep growing past 99 rather than wrapping.
pub fn format_clock(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(1800), "30:00");
        assert_eq!(format_clock(6000), "100:00");
    }

    #[test]
    fn default_thirty_minutes() {
        let vm = TimerViewModel::new(30);
        assert_eq!(vm.remaining_secs(), 1800);
        assert_eq!(vm.time_string(), "30:00");
    }

    #[test]
    fn extend_is_in_minutes() {
        let vm = TimerViewModel::new(1);
        vm.extend(2);
        assert_eq!(vm.remaining_secs(), 180);
        vm.extend(-10);
        assert_eq!(vm.remaining_secs(), 0);
        assert_eq!(vm.time_string(), "00:00");
    }

    #[test]
    fn subscriber_sees_fresh_time_string() {
        let vm = TimerViewModel::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let reader = vm.clone();
        let _sub = vm.subscribe(move |_| sink.borrow_mut().push(reader.time_string()));
        vm.tick();
        assert_eq!(*seen.borrow(), vec!["01:00".to_string(), "00:59".to_string()]);
    }

    #[test]
    fn dispose_stops_updates() {
        let vm = TimerViewModel::new(1);
        assert!(vm.dispose().is_some());
        assert!(vm.tick().is_none());
        assert_eq!(vm.remaining_secs(), 60);
    }
}
