use std::io;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "ENGPORTAL_LOG";

/// Installs the stderr subscriber. Safe to call more than once.
pub fn init() {
    let fmt_layer = fmt::layer().with_target(false).with_writer(io::stderr);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
