use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wheel::CommitPhase;

/// Every state change in the system produces an Event.
/// Embedders drain them from the controller; the ticker returns them
/// from its commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// First sample of a drag; only establishes the reference angle.
    GestureStarted {
        angle_degrees: f64,
        at: DateTime<Utc>,
    },
    /// The dial crossed a notch boundary.
    DialTicked {
        snap_index: i64,
        minutes: i64,
        at: DateTime<Utc>,
    },
    /// A sample pushed further past a bound and was not accumulated.
    SampleDiscarded {
        minutes: i64,
        at: DateTime<Utc>,
    },
    GestureReleased {
        minutes: i64,
        at: DateTime<Utc>,
    },
    /// The confirm window started; authorization fires when it ends.
    CommitScheduled {
        minutes: i64,
        cost: f64,
        confirm_window_ms: u64,
        at: DateTime<Utc>,
    },
    AuthorizationRequested {
        minutes: i64,
        cost: f64,
        at: DateTime<Utc>,
    },
    AuthorizationResolved {
        minutes: i64,
        approved: bool,
        at: DateTime<Utc>,
    },
    CelebrationStarted {
        minutes: i64,
        at: DateTime<Utc>,
    },
    TimerExtended {
        delta_secs: i64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Overlay hidden and minutes cleared.
    SessionReset {
        at: DateTime<Utc>,
    },
    /// Pointer input arrived while a commit sequence was still in flight.
    CommitIgnored {
        phase: CommitPhase,
        at: DateTime<Utc>,
    },
    CountdownTicked {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownElapsed {
        at: DateTime<Utc>,
    },
    CountdownDisposed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        remaining_secs: u64,
        time: String,
        minutes: i64,
        overlay_visible: bool,
        phase: CommitPhase,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable snake_case name of the variant, used for logging and CLI filters.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::GestureStarted { .. } => "gesture_started",
            Event::DialTicked { .. } => "dial_ticked",
            Event::SampleDiscarded { .. } => "sample_discarded",
            Event::GestureReleased { .. } => "gesture_released",
            Event::CommitScheduled { .. } => "commit_scheduled",
            Event::AuthorizationRequested { .. } => "authorization_requested",
            Event::AuthorizationResolved { .. } => "authorization_resolved",
            Event::CelebrationStarted { .. } => "celebration_started",
            Event::TimerExtended { .. } => "timer_extended",
            Event::SessionReset { .. } => "session_reset",
            Event::CommitIgnored { .. } => "commit_ignored",
            Event::CountdownTicked { .. } => "countdown_ticked",
            Event::CountdownElapsed { .. } => "countdown_elapsed",
            Event::CountdownDisposed { .. } => "countdown_disposed",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}
