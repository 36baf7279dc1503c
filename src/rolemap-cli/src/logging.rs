//! Logging setup for the rolemap CLI
//!
//! Logs go to stderr so command output on stdout stays machine readable.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when neither `-v` nor the config file says otherwise
pub const DEFAULT_LEVEL: &str = "warn";

/// Pick the filter directive from verbosity flags and the configured level
pub fn level_for(verbose: u8, configured: Option<&str>) -> String {
    match verbose {
        0 => configured.unwrap_or(DEFAULT_LEVEL).to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber; `RUST_LOG` overrides `level`
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
}
