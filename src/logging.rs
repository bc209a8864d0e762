//! Installs the `tracing` subscriber used by the `pvedisk` binary.
//!
//! Events go to stderr so stdout stays reserved for command results.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "PVEDISK_LOG";

/// Directive applied when [`LOG_ENV`] is unset or blank.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Errors raised while installing the subscriber.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LoggingError {
    /// Raised when the filter directives cannot be parsed.
    #[error("invalid {LOG_ENV} directive '{directive}': {message}")]
    Filter {
        /// Directive text that failed to parse.
        directive: String,
        /// Parser diagnostics.
        message: String,
    },
    /// Raised when a global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Installs a stderr `fmt` subscriber filtered by [`LOG_ENV`].
///
/// # Errors
///
/// Returns [`LoggingError`] when the directive is invalid or a subscriber is
/// already installed.
pub fn init() -> Result<(), LoggingError> {
    let directive = filter_directive(std::env::var(LOG_ENV).ok());
    let filter = build_filter(&directive)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|err| LoggingError::Install(err.to_string()))
}

fn filter_directive(value: Option<String>) -> String {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_owned())
}

fn build_filter(directive: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directive).map_err(|err| LoggingError::Filter {
        directive: directive.to_owned(),
        message: err.to_string(),
    })
}
