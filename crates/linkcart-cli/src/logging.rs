//! Diagnostic logging
//!
//! Off unless `LINKCART_LOG` is set to a level (e.g. `debug`). Logs go to the
//! configured `log_file`, or to stderr when none is set.

use std::fs::OpenOptions;

use tracing::info;
use tracing_subscriber::EnvFilter;

use linkcart_core::Config;

const LOG_ENV: &str = "LINKCART_LOG";

/// Install the global subscriber if logging was requested
pub fn init(config: &Config) {
    let Ok(log_level) = std::env::var(LOG_ENV) else {
        return;
    };

    let env_filter = EnvFilter::new(format!("linkcart_core={},linkcart={}", log_level, log_level));

    match &config.log_file {
        Some(log_path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };

            // Ignore error if already initialized
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();

            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
