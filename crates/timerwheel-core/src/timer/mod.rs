mod countdown;
mod view_model;

pub use countdown::{CountdownTicker, Subscription, TickerState};
pub use view_model::{format_clock, TimerViewModel};
