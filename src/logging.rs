//! Tracing setup for the binary.

use crate::config::LOG_ENV_VAR;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Output goes to stderr so it never mixes
/// with command output. `BLUEPRESET_LOG` overrides the level chosen by
/// `verbose`.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("%H:%M:%S%.3f".to_string()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(e) = result {
        eprintln!("warning: logging not initialized: {e}");
    }
}
