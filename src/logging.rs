//! Logging bootstrap.
//!
//! Diagnostics go to stderr through `tracing`; stdout is reserved for the JSON
//! result so callers can parse it. The filter comes from `CSVSTORE_LOG` when
//! set, otherwise from the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "CSVSTORE_LOG";

/// Filter used when `CSVSTORE_LOG` is not set.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "csvstore=debug"
    } else {
        "csvstore=warn"
    }
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed; the existing one is
/// kept. Never panics.
pub fn init_logging(verbose: bool) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_log_filter(true), "csvstore=debug");
        assert_eq!(default_log_filter(false), "csvstore=warn");
    }

    #[test]
    fn test_init_is_repeatable() {
        init_logging(false);
        assert!(!init_logging(true));
    }
}
