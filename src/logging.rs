//! Tracing initialization for the command line tool.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "CAD_LOG";

/// Filter used when neither `CAD_LOG` nor the settings file provide one.
pub const DEFAULT_FILTER: &str = "paramcad=warn";

/// Guards the one-time subscriber installation.
static INIT: Once = Once::new();

/// Install the global subscriber.
///
/// Reads directives from `CAD_LOG` (for example
/// `CAD_LOG=paramcad::validation=debug`), then `fallback`, then
/// [`DEFAULT_FILTER`]. Log lines go to stderr so command output on stdout
/// stays machine readable. Later calls are ignored.
pub fn init_tracing(json: bool, fallback: Option<&str>) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new(fallback.unwrap_or(DEFAULT_FILTER)))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let registry = tracing_subscriber::registry().with(filter);
        // Another subscriber may already be installed, e.g. by a test harness.
        let _ = if json {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .try_init()
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing(false, None);
        init_tracing(true, Some("paramcad=debug"));
        tracing::info!("subscriber installed");
    }
}
