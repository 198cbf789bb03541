//! Logging setup for the provider binary.
//!
//! All logs go to **stderr**; stdout carries only the handshake line.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `debug`,
//!   `hemmer_provider_commonfate=debug`). When unset, the level passed to
//!   [`init_logging`] applies.
//!
//! # Examples
//!
//! ```bash
//! # Debug logs for the provider only
//! RUST_LOG=hemmer_provider_commonfate=debug ./hemmer-provider-commonfate
//!
//! # Same default, plus the reattach hint
//! ./hemmer-provider-commonfate --debug
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Install the global subscriber, defaulting to `default_level` when
/// `RUST_LOG` is not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging(default_level: &str) {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(stderr_layer())
        .init();
}

/// Like [`init_logging`], but returns `false` instead of panicking when a
/// subscriber is already installed.
pub fn try_init_logging(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so only the
    // second install is observable here.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("hemmer_provider_commonfate=debug").is_ok());
        assert!(EnvFilter::try_new("warn,hemmer_provider_commonfate=debug").is_ok());
    }

    #[test]
    fn test_second_install_is_refused() {
        let _ = try_init_logging("debug");
        assert!(!try_init_logging("info"));
    }
}
