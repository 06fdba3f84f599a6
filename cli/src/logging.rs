//! # Structured Logging
//!
//! Initializes the `tracing` subscriber with configurable format (JSON or
//! pretty-printed) and environment-based filtering via `RUST_LOG`.
//!
//! All log output is written to stderr so that stdout remains available
//! for structured data (e.g. `export-steward-packages --json`).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored output. Suitable for an interactive terminal.
    Pretty,
    /// Machine-parseable JSON lines.
    Json,
}

impl LogFormat {
    /// Parses a format string. Accepts "json" or "pretty" (case-insensitive).
    /// Returns `Pretty` for any unrecognized value.
    #[allow(dead_code)]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Initializes the global tracing subscriber. Call this exactly once,
/// early in `main()`; subsequent calls panic.
///
/// `default_level` is used when `RUST_LOG` is not set, e.g. `"info"` or
/// `"paradux=debug"`. `-v`/`-vv` map to `"paradux=info"`/`"paradux=trace"`
/// respectively.
pub fn init_logging(default_level: &str, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr).json().with_target(true))
                .init();
        }
    }

    tracing::debug!(?format, "logging initialized");
}
