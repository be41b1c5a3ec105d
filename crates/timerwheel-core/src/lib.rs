//! # Timerwheel Core Library
//!
//! Business logic for a rotary "pay to extend time" dial: the user drags a
//! wheel to add or remove minutes from a running countdown, sees a live cost
//! preview, and on release the time change is committed only after an
//! external payment authorization approves it.
//!
//! ## Architecture
//!
//! - **Dial Interpreter**: a pure per-sample state machine turning pointer
//!   angles into a quantized, bounded, signed minute delta
//! - **Wheel Controller**: the commit sequence around the interpreter
//!   (confirm window, authorization, celebration, rollback)
//! - **Countdown Ticker**: a one-second decrementer with pub/sub, driven by
//!   the caller or by a scheduler, plus a `MM:SS` view model
//! - **Collaborators**: scheduler, authorizer, feedback and surface traits;
//!   the core never sleeps, spawns or renders
//!
//! Everything runs on one logical thread. Timers are delivered through the
//! injected [`Scheduler`]; the embedder either calls `tick()` once a second
//! or hands the ticker a scheduler with `CountdownTicker::start`.
//!
//! ## Key Components
//!
//! - [`DialInterpreter`]: gesture-to-minutes state machine
//! - [`WheelController`]: commit protocol driver
//! - [`CountdownTicker`] / [`TimerViewModel`]: the countdown
//! - [`Config`]: TOML configuration

pub mod effects;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod storage;
pub mod timer;
pub mod wheel;

pub use effects::{Authorizer, AuthorizationCallback, Feedback, ScriptedAuthorizer, WheelSurface};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use scheduler::{ImmediateScheduler, ManualScheduler, Scheduler};
pub use storage::Config;
pub use timer::{format_clock, CountdownTicker, Subscription, TickerState, TimerViewModel};
pub use wheel::{
    cost_for, Collaborators, CommitPhase, CommitRequest, CommitTiming, DialInterpreter, DialView,
    SampleOutcome, WheelConfig, WheelController,
};
