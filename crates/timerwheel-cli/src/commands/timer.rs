use clap::Subcommand;
use std::path::Path;
use std::time::Duration;
use timerwheel_core::{format_clock, TimerViewModel};

use super::{load_config, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a live countdown, printing MM:SS on every change
    Run {
        /// Countdown length (defaults to timer.start_minutes)
        #[arg(long)]
        start_minutes: Option<i64>,
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
        #[arg(
            long,
            default_value = "1000",
            hide = true,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval_ms: u64,
    },
    /// Format a number of seconds as MM:SS
    Format {
        seconds: u64,
    },
}

pub fn run(action: TimerAction, path: Option<&Path>) -> CliResult {
    match action {
        TimerAction::Run {
            start_minutes,
            ticks,
            interval_ms,
        } => {
            let config = load_config(path)?;
            let start = start_minutes.unwrap_or(config.timer.start_minutes);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            runtime.block_on(countdown(start, ticks, Duration::from_millis(interval_ms)));
        }
        TimerAction::Format { seconds } => {
            println!("{}", format_clock(seconds));
        }
    }
    Ok(())
}

async fn countdown(start_minutes: i64, max_ticks: Option<u64>, period: Duration) {
    let vm = TimerViewModel::new(start_minutes);
    let reader = vm.clone();
    let subscription = vm.subscribe(move |_| println!("{}", reader.time_string()));

    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately.
    interval.tick().await;

    let mut ticked = 0;
    while vm.remaining_secs() > 0 && max_ticks.map_or(true, |max| ticked < max) {
        interval.tick().await;
        vm.tick();
        ticked += 1;
    }

    subscription.unsubscribe();
    vm.dispose();
    tracing::info!(ticked, remaining = vm.remaining_secs(), "countdown stopped");
}
