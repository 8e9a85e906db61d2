//! # Structured Logging
//!
//! Installs the `tracing` subscriber used by hosts embedding the ledger,
//! with a pretty or JSON format and `RUST_LOG` filtering.
//!
//! Output goes to stderr, leaving stdout free for exported event streams.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for local development.
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

impl LogFormat {
    /// Accepts "json" or "pretty" (case-insensitive). Anything else is `Pretty`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Installs the global subscriber.
///
/// Returns an error if a subscriber is already installed. Test harnesses call
/// this from many tests and ignore the error.
///
/// `default_level` applies when `RUST_LOG` is unset, e.g. `"info"` or
/// `"ethless_contracts=debug,ethless_protocol=info"`.
pub fn try_init_logging(
    default_level: &str,
    format: LogFormat,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
            .try_init()?,
    }

    tracing::info!(?format, "logging initialized");
    Ok(())
}

/// Installs the global subscriber, once, early in the host's `main()`.
///
/// A second call is a no-op apart from a warning on the already-installed
/// subscriber.
pub fn init_logging(default_level: &str, format: LogFormat) {
    if let Err(err) = try_init_logging(default_level, format) {
        tracing::warn!(%err, "logging already initialized");
    }
}
