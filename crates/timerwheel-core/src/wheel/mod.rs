mod config;
mod controller;
mod interpreter;
mod pricing;

pub use config::{CommitTiming, HapticStyle, WheelConfig};
pub use controller::{Collaborators, CommitPhase, DialView, OverlayView, WheelController};
pub use interpreter::{
    pointer_angle, wrap_delta, CommitRequest, DialInterpreter, GestureSession, Release,
    SampleOutcome,
};
pub use pricing::{cost_for, cost_label, minutes_label, round_cents};
