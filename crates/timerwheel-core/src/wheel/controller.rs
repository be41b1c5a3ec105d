//! Wheel controller: the commit protocol around a [`DialInterpreter`].
//!
//! ## Commit sequence
//!
//! ```text
//! Idle --release(m != 0)--> Confirming --confirm window--> Authorizing
//! Authorizing --approved--> Celebrating --fade + flash--> Idle (timer extended)
//! Authorizing --declined--> Idle (overlay reset, timer untouched)
//! ```
//!
//! Only one commit is in flight at a time. While the phase is not `Idle`,
//! pointer samples are dropped and releases are ignored, so two releases in
//! quick succession can never produce two authorization requests.
//!
//! All collaborators are invoked with no internal borrow held, so a
//! synchronous scheduler or authorizer may call straight back in.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::config::{CommitTiming, WheelConfig};
use super::interpreter::{pointer_angle, CommitRequest, DialInterpreter, Release, SampleOutcome};
use super::pricing::{cost_label, minutes_label};
use crate::effects::{Authorizer, Feedback, NoFeedback, NoSurface, WheelSurface};
use crate::events::Event;
use crate::scheduler::Scheduler;
use crate::timer::TimerViewModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPhase {
    Idle,
    /// Confirm bar draining; authorization not yet requested.
    Confirming,
    /// Waiting on the authorizer.
    Authorizing,
    Celebrating,
}

/// Everything the controller calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub scheduler: Rc<dyn Scheduler>,
    pub authorizer: Rc<dyn Authorizer>,
    pub feedback: Rc<dyn Feedback>,
    pub surface: Rc<dyn WheelSurface>,
}

impl Collaborators {
    /// Silent feedback and surface; add them with the `with_*` builders.
    pub fn new(scheduler: Rc<dyn Scheduler>, authorizer: Rc<dyn Authorizer>) -> Self {
        Self {
            scheduler,
            authorizer,
            feedback: Rc::new(NoFeedback),
            surface: Rc::new(NoSurface),
        }
    }

    pub fn with_feedback(mut self, feedback: Rc<dyn Feedback>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_surface(mut self, surface: Rc<dyn WheelSurface>) -> Self {
        self.surface = surface;
        self
    }
}

/// Render model for the dial. Rendering is a pure function of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialView {
    pub rotation_degrees: f64,
    /// `None` shows the idle reset glyph.
    pub overlay: Option<OverlayView>,
    pub phase: CommitPhase,
    pub remaining_secs: u64,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayView {
    pub minutes: i64,
    pub minutes_label: String,
    pub cost_label: String,
    /// Confirm bar is draining.
    pub confirming: bool,
}

#[derive(Debug)]
struct ControllerState {
    interpreter: DialInterpreter,
    phase: CommitPhase,
    pending: Option<CommitRequest>,
    /// Scheduled celebration steps still outstanding.
    celebration_steps: u8,
    events: Vec<Event>,
}

struct Shared {
    state: RefCell<ControllerState>,
    timing: CommitTiming,
    timer: TimerViewModel,
    collab: Collaborators,
}

/// Owns one dial and drives its commit sequence.
///
/// Construct once per mounted widget; the presentation layer reads
/// [`view`](Self::view) and never rebuilds the controller.
pub struct WheelController {
    shared: Rc<Shared>,
}

impl WheelController {
    pub fn new(
        config: WheelConfig,
        timing: CommitTiming,
        timer: TimerViewModel,
        collab: Collaborators,
    ) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(ControllerState {
                    interpreter: DialInterpreter::new(config),
                    phase: CommitPhase::Idle,
                    pending: None,
                    celebration_steps: 0,
                    events: Vec::new(),
                }),
                timing,
                timer,
                collab,
            }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> CommitPhase {
        self.shared.state.borrow().phase
    }

    pub fn committed_minutes(&self) -> i64 {
        self.shared.state.borrow().interpreter.committed_minutes()
    }

    /// Request currently in flight, if any.
    pub fn pending(&self) -> Option<CommitRequest> {
        self.shared.state.borrow().pending
    }

    pub fn config(&self) -> WheelConfig {
        self.shared.state.borrow().interpreter.config().clone()
    }

    pub fn timer(&self) -> &TimerViewModel {
        &self.shared.timer
    }

    pub fn view(&self) -> DialView {
        let st = self.shared.state.borrow();
        let interp = &st.interpreter;
        let minutes = interp.committed_minutes();
        let overlay = (interp.overlay_visible() && minutes != 0).then(|| OverlayView {
            minutes,
            minutes_label: minutes_label(minutes),
            cost_label: cost_label(minutes, interp.config().cost_per_minute),
            confirming: st.phase == CommitPhase::Confirming,
        });
        DialView {
            rotation_degrees: interp.rotation_degrees(),
            overlay,
            phase: st.phase,
            remaining_secs: self.shared.timer.remaining_secs(),
            time: self.shared.timer.time_string(),
        }
    }

    pub fn snapshot(&self) -> Event {
        let st = self.shared.state.borrow();
        Event::StateSnapshot {
            remaining_secs: self.shared.timer.remaining_secs(),
            time: self.shared.timer.time_string(),
            minutes: st.interpreter.committed_minutes(),
            overlay_visible: st.interpreter.overlay_visible(),
            phase: st.phase,
            at: Utc::now(),
        }
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&self) -> Vec<Event> {
        std::mem::take(&mut self.shared.state.borrow_mut().events)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Feed an absolute pointer angle in degrees.
    pub fn pointer_moved(&self, angle_degrees: f64) -> SampleOutcome {
        let (outcome, style, tick_sound) = {
            let mut st = self.shared.state.borrow_mut();
            if st.phase != CommitPhase::Idle {
                return SampleOutcome::Suspended;
            }
            let outcome = st.interpreter.apply_sample(angle_degrees);
            let now = Utc::now();
            match outcome {
                SampleOutcome::Reference { angle_degrees } => {
                    st.events.push(Event::GestureStarted { angle_degrees, at: now });
                }
                SampleOutcome::Accepted {
                    minutes,
                    snap_index,
                    ticked: true,
                    ..
                } => {
                    st.events.push(Event::DialTicked {
                        snap_index,
                        minutes,
                        at: now,
                    });
                }
                SampleOutcome::Discarded { minutes } => {
                    tracing::debug!(minutes, angle_degrees, "sample discarded at bound");
                    st.events.push(Event::SampleDiscarded { minutes, at: now });
                }
                _ => {}
            }
            let config = st.interpreter.config();
            (outcome, config.haptic_style(), config.tick_sound_enabled)
        };

        if let SampleOutcome::Accepted {
            rotation_degrees,
            ticked,
            ..
        } = outcome
        {
            self.shared.collab.surface.rotate_to(rotation_degrees);
            if ticked {
                self.shared.collab.feedback.tick(style);
                if tick_sound {
                    self.shared.collab.feedback.tick_sound();
                }
            }
        }
        outcome
    }

    /// Feed raw pointer coordinates relative to the widget centre.
    pub fn pointer_moved_to(&self, x: f64, y: f64, centre_x: f64, centre_y: f64) -> SampleOutcome {
        self.pointer_moved(pointer_angle(x, y, centre_x, centre_y))
    }

    /// End the gesture. Returns the request when a commit sequence starts.
    pub fn pointer_released(&self) -> Option<CommitRequest> {
        let release = {
            let mut st = self.shared.state.borrow_mut();
            let now = Utc::now();
            if st.phase != CommitPhase::Idle {
                let phase = st.phase;
                tracing::debug!(?phase, "release ignored while commit in flight");
                st.events.push(Event::CommitIgnored { phase, at: now });
                return None;
            }
            let release = st.interpreter.release();
            match release {
                Release::Idle => {
                    st.events.push(Event::GestureReleased { minutes: 0, at: now });
                    st.events.push(Event::SessionReset { at: now });
                }
                Release::Commit(request) => {
                    st.phase = CommitPhase::Confirming;
                    st.pending = Some(request);
                    st.events.push(Event::GestureReleased {
                        minutes: request.minutes,
                        at: now,
                    });
                    st.events.push(Event::CommitScheduled {
                        minutes: request.minutes,
                        cost: request.cost,
                        confirm_window_ms: self.shared.timing.confirm_window_ms,
                        at: now,
                    });
                }
            }
            release
        };

        let Release::Commit(request) = release else {
            self.shared.collab.surface.rotate_to(0.0);
            return None;
        };

        tracing::info!(
            minutes = request.minutes,
            cost = request.cost,
            confirm_window_ms = self.shared.timing.confirm_window_ms,
            "commit scheduled"
        );
        let surface = &self.shared.collab.surface;
        surface.snap_back();
        surface.start_confirm_bar(self.shared.timing.confirm_window_ms);

        let weak = Rc::downgrade(&self.shared);
        self.shared.collab.scheduler.schedule_after(
            self.shared.timing.confirm_window(),
            Box::new(move || with_shared(&weak, |shared| shared.request_authorization(request))),
        );
        Some(request)
    }

    /// Gesture terminated by the system; handled exactly like a release.
    pub fn pointer_cancelled(&self) -> Option<CommitRequest> {
        self.pointer_released()
    }
}

fn with_shared(weak: &Weak<Shared>, f: impl FnOnce(&Rc<Shared>)) {
    match weak.upgrade() {
        Some(shared) => f(&shared),
        None => tracing::warn!("wheel controller dropped before commit sequence finished"),
    }
}

impl Shared {
    fn request_authorization(self: &Rc<Self>, request: CommitRequest) {
        {
            let mut st = self.state.borrow_mut();
            st.phase = CommitPhase::Authorizing;
            st.events.push(Event::AuthorizationRequested {
                minutes: request.minutes,
                cost: request.cost,
                at: Utc::now(),
            });
        }
        tracing::info!(minutes = request.minutes, cost = request.cost, "authorization requested");

        let weak = Rc::downgrade(self);
        self.collab.authorizer.request(
            request,
            Box::new(move |approved| with_shared(&weak, |shared| shared.resolve(request, approved))),
        );
    }

    fn resolve(self: &Rc<Self>, request: CommitRequest, approved: bool) {
        tracing::info!(minutes = request.minutes, approved, "authorization resolved");
        let config = {
            let mut st = self.state.borrow_mut();
            let now = Utc::now();
            st.events.push(Event::AuthorizationResolved {
                minutes: request.minutes,
                approved,
                at: now,
            });
            if !approved {
                st.interpreter.reset();
                st.phase = CommitPhase::Idle;
                st.pending = None;
                st.events.push(Event::SessionReset { at: now });
                return;
            }
            st.phase = CommitPhase::Celebrating;
            st.celebration_steps = 2;
            st.events.push(Event::CelebrationStarted {
                minutes: request.minutes,
                at: now,
            });
            st.interpreter.config().clone()
        };

        if config.should_play_success_haptic {
            self.collab.feedback.success();
        }
        self.collab.feedback.success_sound();
        self.collab.surface.flash_timer(self.timing.flash_ms);
        self.collab.surface.fade_overlay(self.timing.overlay_fade_ms);

        let weak = Rc::downgrade(self);
        self.collab.scheduler.schedule_after(
            self.timing.overlay_fade(),
            Box::new(move || with_shared(&weak, |shared| shared.finish_overlay_fade())),
        );
        let weak = Rc::downgrade(self);
        self.collab.scheduler.schedule_after(
            self.timing.flash(),
            Box::new(move || with_shared(&weak, |shared| shared.apply_extension(request))),
        );
    }

    fn finish_overlay_fade(&self) {
        let mut st = self.state.borrow_mut();
        st.interpreter.reset();
        st.events.push(Event::SessionReset { at: Utc::now() });
        Self::complete_celebration_step(&mut st);
    }

    fn apply_extension(&self, request: CommitRequest) {
        // Listeners run inside extend(); no borrow may be held here.
        let event = self.timer.extend(request.minutes);
        let mut st = self.state.borrow_mut();
        match event {
            Some(event) => {
                tracing::info!(minutes = request.minutes, remaining = self.timer.remaining_secs(), "timer extended");
                st.events.push(event);
            }
            None => tracing::warn!(minutes = request.minutes, "countdown disposed; extension dropped"),
        }
        Self::complete_celebration_step(&mut st);
    }

    fn complete_celebration_step(st: &mut ControllerState) {
        st.celebration_steps = st.celebration_steps.saturating_sub(1);
        if st.celebration_steps == 0 {
            st.phase = CommitPhase::Idle;
            st.pending = None;
        }
    }
}
