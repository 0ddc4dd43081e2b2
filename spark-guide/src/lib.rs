pub mod config;
pub mod environment;
pub mod pipeline;
pub mod runner;
pub mod service;
pub mod signal;
pub mod source;
pub mod timer;

use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// Installs the global subscriber. Also forwards `log` records, so the
/// library crates can keep logging through the `log` facade.
pub fn log_init(level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Unknown log level {level:?}, falling back to info");
        LevelFilter::INFO
    });

    if tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_err()
    {
        log::debug!("Logger already initialised");
    }
}
