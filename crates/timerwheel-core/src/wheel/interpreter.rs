//! Dial interpreter: turns absolute pointer angles into a signed minute delta.
//!
//! Two numbers are tracked separately. The cumulative angle is continuous and
//! drives the visual wheel rotation; the committed minutes are quantized to
//! notches and clamped to the configured bounds. Both are updated by a single
//! transition, [`DialInterpreter::apply_sample`].
//!
//! ## Per-sample transition
//!
//! ```text
//! first sample            -> Reference (no state change)
//! pushing past a bound    -> Discarded (angle frozen, minutes recomputed)
//! otherwise               -> Accepted  (angle advances, tick on notch change)
//! ```
//!
//! The interpreter is pure: it performs no side effects. The
//! [`WheelController`](super::WheelController) turns its outcomes into
//! haptics, surface updates and events.

use serde::{Deserialize, Serialize};

use super::config::WheelConfig;
use super::pricing::cost_for;

/// Angle tracking for one continuous drag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureSession {
    /// Signed, unbounded sum of wrapped per-sample deltas.
    pub cumulative_angle_degrees: f64,
    /// `None` until the first sample of the gesture.
    pub last_sample_angle_degrees: Option<f64>,
    /// Notch index that last fired a tick.
    pub last_snap_index: i64,
}

/// Result of feeding one pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SampleOutcome {
    /// First sample of the gesture; stored as the reference angle.
    Reference { angle_degrees: f64 },
    Accepted {
        minutes: i64,
        rotation_degrees: f64,
        snap_index: i64,
        ticked: bool,
    },
    /// Pinned at a bound and pushed further; the angle did not advance.
    Discarded { minutes: i64 },
    /// A commit sequence is in flight; the sample was dropped.
    Suspended,
}

/// What the caller must do after a release.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Release {
    /// Nothing was dialled; the overlay has been reset.
    Idle,
    /// Start the commit sequence for this request.
    Commit(CommitRequest),
}

/// Minutes and price handed to the authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub minutes: i64,
    pub cost: f64,
}

impl CommitRequest {
    pub fn extension_secs(&self) -> i64 {
        self.minutes * 60
    }
}

/// The per-gesture state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialInterpreter {
    config: WheelConfig,
    session: GestureSession,
    committed_minutes: i64,
    overlay_visible: bool,
}

impl DialInterpreter {
    pub fn new(config: WheelConfig) -> Self {
        Self {
            config,
            session: GestureSession::default(),
            committed_minutes: 0,
            overlay_visible: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    pub fn committed_minutes(&self) -> i64 {
        self.committed_minutes
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Visual wheel rotation; follows the cumulative angle.
    pub fn rotation_degrees(&self) -> f64 {
        self.session.cumulative_angle_degrees
    }

    /// Live cost preview for the committed minutes.
    pub fn preview_cost(&self) -> f64 {
        cost_for(self.committed_minutes, self.config.cost_per_minute)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Feed one absolute pointer angle, in degrees.
    pub fn apply_sample(&mut self, angle_degrees: f64) -> SampleOutcome {
        let Some(last) = self.session.last_sample_angle_degrees.replace(angle_degrees) else {
            return SampleOutcome::Reference { angle_degrees };
        };

        let delta = wrap_delta(angle_degrees - last);
        let tentative = self.session.cumulative_angle_degrees + delta;
        let candidate = self.config.minutes_for_angle(tentative);

        if self.pushes_past_bound(delta) {
            // Angle stays frozen so reversing direction responds immediately.
            self.committed_minutes = candidate;
            self.overlay_visible = true;
            return SampleOutcome::Discarded { minutes: candidate };
        }

        self.session.cumulative_angle_degrees = tentative;

        let snap_index = self.config.snap_index(tentative);
        let ticked =
            snap_index != self.session.last_snap_index && !self.config.is_at_bound(candidate);
        if ticked {
            self.session.last_snap_index = snap_index;
        }

        self.committed_minutes = candidate;
        self.overlay_visible = true;
        SampleOutcome::Accepted {
            minutes: candidate,
            rotation_degrees: tentative,
            snap_index,
            ticked,
        }
    }

    /// End the gesture (pointer-up or termination).
    ///
    /// Angle tracking is torn down unconditionally. A non-zero delta stays
    /// displayed until [`reset`](Self::reset) is called by whoever finishes
    /// the commit sequence.
    pub fn release(&mut self) -> Release {
        self.session = GestureSession::default();
        let minutes = self.committed_minutes;
        if minutes == 0 {
            self.reset();
            return Release::Idle;
        }
        Release::Commit(CommitRequest {
            minutes,
            cost: cost_for(minutes, self.config.cost_per_minute),
        })
    }

    /// Hide the overlay and clear the committed minutes.
    pub fn reset(&mut self) {
        self.committed_minutes = 0;
        self.overlay_visible = false;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn pushes_past_bound(&self, delta: f64) -> bool {
        let current = self.committed_minutes;
        let cfg = &self.config;
        let at_pos = cfg.is_bounded() && current == cfg.max_minutes;
        let at_neg = cfg.is_bounded() && current == -cfg.max_minutes;
        let at_zero_floor = !cfg.allows_negative && current == 0;

        (at_pos && delta > 0.0) || (at_neg && delta < 0.0) || (at_zero_floor && delta < 0.0)
    }
}

/// Normalize a raw angular delta into (-180, +180].
///
/// `atan2` jumps by 360 at its seam; a single correction is enough because
/// both inputs lie in [-180, 180].
pub fn wrap_delta(raw: f64) -> f64 {
    if raw > 180.0 {
        raw - 360.0
    } else if raw <= -180.0 {
        raw + 360.0
    } else {
        raw
    }
}

/// Pointer angle in degrees relative to the widget centre.
pub fn pointer_angle(x: f64, y: f64, centre_x: f64, centre_y: f64) -> f64 {
    (y - centre_y).atan2(x - centre_x).to_degrees()
}
