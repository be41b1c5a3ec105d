pub mod config;
pub mod dial;
pub mod timer;

use std::path::Path;
use timerwheel_core::Config;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Config from `--config` when given, otherwise the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) if path.exists() => Config::load_from(path)?,
        Some(_) => Config::default(),
        None => Config::load()?,
    })
}

pub fn save_config(config: &Config, path: Option<&Path>) -> CliResult {
    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    Ok(())
}
