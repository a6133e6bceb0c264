//! Global `tracing` subscriber for the player binary.
//!
//! Events go to stderr so they never interleave with the channel list and
//! prompt on stdout. Timestamps are RFC 3339 in UTC; colour is only used when
//! stderr is a terminal.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, info, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use webradio_config::{Config, LogFormat};

const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");

static TELEMETRY_GUARD: OnceCell<LogFormat> = OnceCell::new();

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Expression taken from `log_filter`.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// The global subscriber could not be installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use and returns the format in
/// effect.
///
/// Later calls leave the installed subscriber alone, even when `config`
/// differs, and report the format chosen by the first call.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or another
/// subscriber already owns the global slot.
pub fn initialise(config: &Config) -> Result<LogFormat, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| {
            let subscriber = build_subscriber(config)?;
            tracing::subscriber::set_global_default(subscriber)
                .map_err(TelemetryError::Subscriber)?;
            info!(
                target: TELEMETRY_TARGET,
                format = %config.log_format(),
                filter = config.log_filter(),
                backend = config.backend_binary(),
                "logging initialised"
            );
            Ok(config.log_format())
        })
        .copied()
}

fn build_subscriber(config: &Config) -> Result<BoxedSubscriber, TelemetryError> {
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            message: error.to_string(),
        })?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(
            builder
                .with_ansi(false)
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .finish(),
        ),
        LogFormat::Compact => Box::new(
            builder
                .with_ansi(io::stderr().is_terminal())
                .compact()
                .finish(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn rejects_unparseable_filters() {
        let config = Config {
            log_filter: "webradio=loud".to_owned(),
            ..Config::default()
        };

        let Err(error) = build_subscriber(&config) else {
            panic!("filter should be rejected");
        };

        assert!(
            matches!(&error, TelemetryError::Filter { filter, .. } if filter == "webradio=loud")
        );
    }

    #[rstest]
    #[case(LogFormat::Json)]
    #[case(LogFormat::Compact)]
    fn builds_a_subscriber_for_each_format(#[case] format: LogFormat) {
        let config = Config {
            log_filter: "webradio=debug,warn".to_owned(),
            log_format: format,
            ..Config::default()
        };

        assert!(build_subscriber(&config).is_ok());
    }
}
