//! Dial configuration.
//!
//! The first five fields drive the minute accounting. Everything from
//! `ring_line_width` down is cosmetic: the core accepts and carries those
//! values so embedders can read them back, but never interprets them beyond
//! passing haptic styling to [`Feedback`](crate::effects::Feedback).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ValidationError;

/// Immutable per-mount dial configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    /// Minutes represented by one notch.
    #[serde(default = "default_minute_step")]
    pub minute_step: i64,
    /// Degrees of rotation per notch.
    #[serde(default = "default_snap_degree")]
    pub snap_degree: f64,
    #[serde(default = "default_cost_per_minute")]
    pub cost_per_minute: f64,
    #[serde(default = "default_true")]
    pub allows_negative: bool,
    /// 0 = unbounded.
    #[serde(default)]
    pub max_minutes: i64,

    #[serde(default = "default_ring_line_width")]
    pub ring_line_width: f64,
    #[serde(default = "default_ring_gradient")]
    pub ring_gradient: Vec<String>,
    #[serde(default = "default_overlay_bar_width")]
    pub overlay_bar_width: f64,
    #[serde(default = "default_overlay_bar_height")]
    pub overlay_bar_height: f64,
    #[serde(default = "default_true")]
    pub tick_sound_enabled: bool,
    #[serde(default = "default_haptic_sharpness")]
    pub haptic_sharpness: f64,
    #[serde(default = "default_haptic_intensity")]
    pub haptic_intensity: f64,
    #[serde(default = "default_true")]
    pub should_play_success_haptic: bool,
}

/// Durations of the commit sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitTiming {
    /// Delay between release and the authorization request.
    #[serde(default = "default_confirm_window_ms")]
    pub confirm_window_ms: u64,
    #[serde(default = "default_overlay_fade_ms")]
    pub overlay_fade_ms: u64,
    /// The countdown is extended when the flash ends.
    #[serde(default = "default_flash_ms")]
    pub flash_ms: u64,
}

/// Intensity and sharpness handed to the tick haptic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapticStyle {
    pub intensity: f64,
    pub sharpness: f64,
}

fn default_minute_step() -> i64 {
    1
}
fn default_snap_degree() -> f64 {
    15.0
}
fn default_cost_per_minute() -> f64 {
    0.35
}
fn default_true() -> bool {
    true
}
fn default_ring_line_width() -> f64 {
    40.0
}
fn default_ring_gradient() -> Vec<String> {
    vec![
        "rgba(128,128,128,0.4)".to_string(),
        "rgba(128,128,128,0.9)".to_string(),
    ]
}
fn default_overlay_bar_width() -> f64 {
    75.0
}
fn default_overlay_bar_height() -> f64 {
    6.0
}
fn default_haptic_sharpness() -> f64 {
    0.4
}
fn default_haptic_intensity() -> f64 {
    0.6
}
fn default_confirm_window_ms() -> u64 {
    2_000
}
fn default_overlay_fade_ms() -> u64 {
    400
}
fn default_flash_ms() -> u64 {
    600
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            minute_step: default_minute_step(),
            snap_degree: default_snap_degree(),
            cost_per_minute: default_cost_per_minute(),
            allows_negative: true,
            max_minutes: 0,
            ring_line_width: default_ring_line_width(),
            ring_gradient: default_ring_gradient(),
            overlay_bar_width: default_overlay_bar_width(),
            overlay_bar_height: default_overlay_bar_height(),
            tick_sound_enabled: true,
            haptic_sharpness: default_haptic_sharpness(),
            haptic_intensity: default_haptic_intensity(),
            should_play_success_haptic: true,
        }
    }
}

impl Default for CommitTiming {
    fn default() -> Self {
        Self {
            confirm_window_ms: default_confirm_window_ms(),
            overlay_fade_ms: default_overlay_fade_ms(),
            flash_ms: default_flash_ms(),
        }
    }
}

impl CommitTiming {
    pub fn confirm_window(&self) -> Duration {
        Duration::from_millis(self.confirm_window_ms)
    }

    pub fn overlay_fade(&self) -> Duration {
        Duration::from_millis(self.overlay_fade_ms)
    }

    pub fn flash(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }
}

impl WheelConfig {
    /// Bounded dial: `max_minutes` applies.
    pub fn is_bounded(&self) -> bool {
        self.max_minutes > 0
    }

    /// Notch index for a cumulative angle.
    pub fn snap_index(&self, cumulative_degrees: f64) -> i64 {
        (cumulative_degrees / self.snap_degree).round() as i64
    }

    /// Quantized, clamped minutes for a cumulative angle.
    pub fn minutes_for_angle(&self, cumulative_degrees: f64) -> i64 {
        self.clamp_minutes(self.snap_index(cumulative_degrees) * self.minute_step)
    }

    /// Clamp to `[-max, +max]` when bounded, then to `>= 0` when negatives are off.
    pub fn clamp_minutes(&self, minutes: i64) -> i64 {
        let mut mins = minutes;
        if self.is_bounded() {
            mins = mins.clamp(-self.max_minutes, self.max_minutes);
        }
        if !self.allows_negative && mins < 0 {
            mins = 0;
        }
        mins
    }

    /// True when `minutes` sits exactly on a configured limit.
    pub fn is_at_bound(&self, minutes: i64) -> bool {
        (self.is_bounded() && (minutes == self.max_minutes || minutes == -self.max_minutes))
            || (!self.allows_negative && minutes == 0)
    }

    pub fn haptic_style(&self) -> HapticStyle {
        HapticStyle {
            intensity: self.haptic_intensity,
            sharpness: self.haptic_sharpness,
        }
    }

    /// Check the caller contract. The interpreter itself never clamps
    /// these; this runs at the configuration boundary only.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.minute_step < 1 {
            return Err(ValidationError::invalid("minute_step", "must be at least 1"));
        }
        if !self.snap_degree.is_finite() || self.snap_degree <= 0.0 {
            return Err(ValidationError::invalid(
                "snap_degree",
                "must be a finite number greater than 0",
            ));
        }
        if !self.cost_per_minute.is_finite() || self.cost_per_minute < 0.0 {
            return Err(ValidationError::invalid(
                "cost_per_minute",
                "must be a finite number of at least 0",
            ));
        }
        if self.max_minutes < 0 {
            return Err(ValidationError::invalid(
                "max_minutes",
                "must be 0 (unbounded) or positive",
            ));
        }
        Ok(())
    }
}
