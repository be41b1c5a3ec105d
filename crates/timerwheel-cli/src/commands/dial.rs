use clap::Subcommand;
use std::path::Path;
use std::rc::Rc;
use timerwheel_core::effects::{Authorizer, Feedback};
use timerwheel_core::wheel::{cost_label, minutes_label, HapticStyle};
use timerwheel_core::{
    cost_for, Collaborators, ManualScheduler, ScriptedAuthorizer, TimerViewModel, WheelController,
};

use super::{load_config, CliResult};

#[derive(Subcommand)]
pub enum DialAction {
    /// Replay pointer angles through the dial and run the commit sequence
    Simulate {
        /// Comma-separated absolute pointer angles in degrees
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        samples: Vec<f64>,
        /// Decline the payment instead of approving it
        #[arg(long)]
        decline: bool,
        /// Countdown length before the gesture (defaults to timer.start_minutes)
        #[arg(long, allow_negative_numbers = true)]
        start_minutes: Option<i64>,
        /// Override a config value for this run, e.g. wheel.max_minutes=5
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },
    /// Price a minute delta
    Quote {
        #[arg(long, allow_negative_numbers = true)]
        minutes: i64,
    },
}

/// Logs feedback pulses; a terminal has no haptics.
struct TraceFeedback;

impl Feedback for TraceFeedback {
    fn tick(&self, style: HapticStyle) {
        tracing::debug!(intensity = style.intensity, sharpness = style.sharpness, "tick haptic");
    }

    fn success(&self) {
        tracing::debug!("success haptic");
    }
}

pub fn run(action: DialAction, path: Option<&Path>) -> CliResult {
    match action {
        DialAction::Simulate {
            samples,
            decline,
            start_minutes,
            overrides,
        } => {
            let mut config = load_config(path)?;
            for entry in &overrides {
                let (key, value) = entry
                    .split_once('=')
                    .ok_or_else(|| format!("expected KEY=VALUE, got '{entry}'"))?;
                config.apply(key.trim(), value.trim())?;
            }

            let scheduler = Rc::new(ManualScheduler::new());
            let authorizer: Rc<dyn Authorizer> = if decline {
                Rc::new(ScriptedAuthorizer::declining())
            } else {
                Rc::new(ScriptedAuthorizer::approving())
            };
            let collab = Collaborators::new(scheduler.clone(), authorizer)
                .with_feedback(Rc::new(TraceFeedback));
            let timer = TimerViewModel::new(start_minutes.unwrap_or(config.timer.start_minutes));
            let ctl = WheelController::new(config.wheel, config.timing, timer, collab);

            for angle in samples {
                ctl.pointer_moved(angle);
            }
            ctl.pointer_released();
            scheduler.run_until_idle();

            for event in ctl.drain_events() {
                println!("{}", serde_json::to_string(&event)?);
            }
            println!("{}", serde_json::to_string(&ctl.snapshot())?);
        }
        DialAction::Quote { minutes } => {
            let config = load_config(path)?;
            let per_minute = config.wheel.cost_per_minute;
            let quote = serde_json::json!({
                "minutes": minutes,
                "minutes_label": minutes_label(minutes),
                "cost": cost_for(minutes, per_minute),
                "cost_label": cost_label(minutes, per_minute),
            });
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
    }
    Ok(())
}
