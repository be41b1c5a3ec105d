//! Integration tests for the commit sequence with an asynchronous authorizer.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use timerwheel_core::effects::{AuthorizationCallback, Authorizer, WheelSurface};
use timerwheel_core::{
    Collaborators, CommitPhase, CommitRequest, CommitTiming, Event, ManualScheduler,
    TimerViewModel, WheelConfig, WheelController,
};

/// Holds callbacks until the test resolves them.
#[derive(Default)]
struct DeferredAuthorizer {
    requests: RefCell<Vec<CommitRequest>>,
    callbacks: RefCell<Vec<AuthorizationCallback>>,
}

impl DeferredAuthorizer {
    fn resolve_next(&self, approved: bool) {
        let callback = self.callbacks.borrow_mut().remove(0);
        callback(approved);
    }
}

impl Authorizer for DeferredAuthorizer {
    fn request(&self, request: CommitRequest, on_result: AuthorizationCallback) {
        self.requests.borrow_mut().push(request);
        self.callbacks.borrow_mut().push(on_result);
    }
}

#[derive(Default)]
struct RecordingSurface {
    calls: RefCell<Vec<String>>,
}

impl WheelSurface for RecordingSurface {
    fn snap_back(&self) {
        self.calls.borrow_mut().push("snap_back".into());
    }
    fn start_confirm_bar(&self, duration_ms: u64) {
        self.calls.borrow_mut().push(format!("confirm_bar:{duration_ms}"));
    }
    fn fade_overlay(&self, duration_ms: u64) {
        self.calls.borrow_mut().push(format!("fade:{duration_ms}"));
    }
    fn flash_timer(&self, duration_ms: u64) {
        self.calls.borrow_mut().push(format!("flash:{duration_ms}"));
    }
}

struct Harness {
    ctl: WheelController,
    scheduler: Rc<ManualScheduler>,
    authorizer: Rc<DeferredAuthorizer>,
    surface: Rc<RecordingSurface>,
}

fn harness(config: WheelConfig, start_minutes: i64) -> Harness {
    let scheduler = Rc::new(ManualScheduler::new());
    let authorizer = Rc::new(DeferredAuthorizer::default());
    let surface = Rc::new(RecordingSurface::default());
    let collab = Collaborators::new(scheduler.clone(), authorizer.clone()).with_surface(surface.clone());
    let ctl = WheelController::new(
        config,
        CommitTiming::default(),
        TimerViewModel::new(start_minutes),
        collab,
    );
    Harness {
        ctl,
        scheduler,
        authorizer,
        surface,
    }
}

fn drag(ctl: &WheelController, angles: &[f64]) {
    for angle in angles {
        ctl.pointer_moved(*angle);
    }
}

#[test]
fn authorization_fires_once_after_confirm_window() {
    let h = harness(WheelConfig::default(), 30);
    drag(&h.ctl, &[0.0, 20.0, 40.0, 60.0]);
    h.ctl.pointer_released();

    assert!(h.authorizer.requests.borrow().is_empty());
    h.scheduler.advance(Duration::from_secs(2));
    assert_eq!(
        *h.authorizer.requests.borrow(),
        vec![CommitRequest {
            minutes: 4,
            cost: 1.4,
        }]
    );
    assert_eq!(h.ctl.phase(), CommitPhase::Authorizing);

    // Waiting longer does not re-request.
    h.scheduler.advance(Duration::from_secs(60));
    assert_eq!(h.authorizer.requests.borrow().len(), 1);
}

#[test]
fn approval_extends_by_exact_minutes() {
    let h = harness(WheelConfig::default(), 30);
    drag(&h.ctl, &[0.0, 20.0, 40.0, 60.0]);
    h.ctl.pointer_released();
    h.scheduler.advance(Duration::from_secs(2));

    h.authorizer.resolve_next(true);
    h.scheduler.run_until_idle();

    assert_eq!(h.ctl.timer().remaining_secs(), 1800 + 4 * 60);
    assert_eq!(h.ctl.phase(), CommitPhase::Idle);
    assert!(h.ctl.view().overlay.is_none());
    assert_eq!(
        *h.surface.calls.borrow(),
        vec!["snap_back", "confirm_bar:2000", "flash:600", "fade:400"]
    );
}

#[test]
fn decline_leaves_timer_unchanged() {
    let h = harness(WheelConfig::default(), 30);
    drag(&h.ctl, &[0.0, -20.0, -40.0]);
    h.ctl.pointer_released();
    h.scheduler.advance(Duration::from_secs(2));
    h.authorizer.resolve_next(false);
    h.scheduler.run_until_idle();

    assert_eq!(h.ctl.timer().remaining_secs(), 1800);
    assert_eq!(h.ctl.committed_minutes(), 0);
    assert_eq!(h.ctl.phase(), CommitPhase::Idle);
}

#[test]
fn removing_time_floors_at_zero() {
    let h = harness(WheelConfig::default(), 1);
    // -3 minutes against a one minute countdown.
    drag(&h.ctl, &[0.0, -20.0, -40.0]);
    h.ctl.pointer_released();
    h.scheduler.advance(Duration::from_secs(2));
    h.authorizer.resolve_next(true);
    h.scheduler.run_until_idle();
    assert_eq!(h.ctl.timer().remaining_secs(), 0);
    assert_eq!(h.ctl.view().time, "00:00");
}

#[test]
fn countdown_keeps_running_during_commit() {
    let h = harness(WheelConfig::default(), 30);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = h.ctl.timer().subscribe(move |secs| sink.borrow_mut().push(secs));

    drag(&h.ctl, &[0.0, 15.0]);
    h.ctl.pointer_released();
    h.ctl.timer().tick();
    h.scheduler.advance(Duration::from_secs(2));
    h.ctl.timer().tick();
    h.authorizer.resolve_next(true);
    h.scheduler.run_until_idle();

    assert_eq!(*seen.borrow(), vec![1800, 1799, 1798, 1858]);
}

#[test]
fn new_gesture_waits_for_pending_authorization() {
    let h = harness(WheelConfig::default(), 30);
    drag(&h.ctl, &[0.0, 15.0]);
    h.ctl.pointer_released();
    h.scheduler.advance(Duration::from_secs(2));

    // A second drag while authorizing is dropped entirely.
    drag(&h.ctl, &[0.0, 45.0, 90.0]);
    assert!(h.ctl.pointer_released().is_none());
    h.scheduler.run_until_idle();
    assert_eq!(h.authorizer.requests.borrow().len(), 1);
    assert_eq!(h.ctl.committed_minutes(), 1);

    h.authorizer.resolve_next(false);
    drag(&h.ctl, &[0.0, 30.0]);
    assert_eq!(h.ctl.committed_minutes(), 2);
}

#[test]
fn events_describe_a_declined_commit() {
    let h = harness(WheelConfig::default(), 30);
    drag(&h.ctl, &[0.0, 15.0]);
    h.ctl.pointer_released();
    h.scheduler.advance(Duration::from_secs(2));
    h.authorizer.resolve_next(false);

    let events = h.ctl.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::AuthorizationResolved { minutes: 1, approved: false, .. })));
    assert!(matches!(events.last(), Some(Event::SessionReset { .. })));
    assert!(!events.iter().any(|e| matches!(e, Event::TimerExtended { .. })));
}

#[test]
fn dropping_controller_abandons_pending_commit() {
    let h = harness(WheelConfig::default(), 30);
    let timer = h.ctl.timer().clone();
    drag(&h.ctl, &[0.0, 15.0]);
    h.ctl.pointer_released();
    drop(h.ctl);
    h.scheduler.run_until_idle();
    assert!(h.authorizer.requests.borrow().is_empty());
    assert_eq!(timer.remaining_secs(), 1800);
}

#[test]
fn cancelled_gesture_commits_like_a_release() {
    let h = harness(WheelConfig::default(), 30);
    drag(&h.ctl, &[0.0, 15.0, 30.0]);

    assert_eq!(
        h.ctl.pointer_cancelled(),
        Some(CommitRequest {
            minutes: 2,
            cost: 0.7,
        })
    );
    assert_eq!(h.ctl.phase(), CommitPhase::Confirming);
    h.scheduler.advance(Duration::from_secs(2));
    assert_eq!(h.authorizer.requests.borrow().len(), 1);
}

#[test]
fn cancelled_gesture_at_zero_resets_without_authorizing() {
    let h = harness(WheelConfig::default(), 30);
    drag(&h.ctl, &[0.0, 5.0]);

    assert!(h.ctl.pointer_cancelled().is_none());
    h.scheduler.run_until_idle();
    assert!(h.authorizer.requests.borrow().is_empty());
    assert_eq!(h.ctl.phase(), CommitPhase::Idle);
    assert!(h.ctl.view().overlay.is_none());

    // The next gesture takes a fresh reference sample.
    drag(&h.ctl, &[90.0, 105.0]);
    assert_eq!(h.ctl.committed_minutes(), 1);
}
