#![forbid(unsafe_code)]

//! Structured logging setup.
//!
//! The engine itself only emits `tracing` events; hosts decide where they go.
//! With the `subscriber` feature this module installs a ready-made
//! `tracing-subscriber` pipeline filtered by `DISCADELTA_LOG`
//! (`EnvFilter` syntax, default `warn`).
//!
//! ```ignore
//! discadelta_core::logging::init(LogFormat::Compact);
//! ```

/// Environment variable holding the filter directive.
pub const LOG_ENV: &str = "DISCADELTA_LOG";

/// Output format for [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line records.
    #[default]
    Compact,
    /// One JSON object per record, for log shippers.
    Json,
}

impl LogFormat {
    /// Parse a format name (`"json"` or anything else for compact).
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

/// Install a global subscriber.
///
/// Returns `false` when a global subscriber was already set, which is not an
/// error for hosts that configure logging themselves.
#[cfg(feature = "subscriber")]
pub fn init(format: LogFormat) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
