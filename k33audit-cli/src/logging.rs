//! Logging initialisation for the `k33audit` binary.
//!
//! Installs a global `tracing` subscriber that writes human or JSON output to
//! stderr, optionally mirrors every event to a log file, and bridges the `log`
//! facade so crates using either API emit structured events.

use std::{
    env,
    fs::File,
    io,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use thiserror::Error;
use tracing::warn;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

const LOG_FORMAT_ENV: &str = "K33AUDIT_LOG_FORMAT";

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Errors raised while initialising structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Environment variable contained invalid UTF-8 data.
    #[error("environment variable `{name}` contained invalid UTF-8: {source}")]
    InvalidUnicode {
        /// Name of the offending environment variable.
        name: &'static str,
        /// Underlying parse failure.
        #[source]
        source: env::VarError,
    },
    /// Unsupported log format requested via `K33AUDIT_LOG_FORMAT`.
    #[error("unsupported log format `{provided}`; expected `human` or `json`")]
    UnsupportedFormat {
        /// Raw value supplied by the user.
        provided: String,
    },
    /// The log file could not be created.
    #[error("failed to create log file `{path}`: {source}")]
    LogFile {
        /// Requested log file.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the global tracing subscriber.
    #[error("failed to install tracing subscriber: {source}")]
    InstallFailed {
        /// Error raised by `tracing_subscriber`.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
}

/// Output format of the stderr layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum LogFormat {
    Human,
    Json,
}

/// Install global structured logging if it has not already been configured.
///
/// Output goes to stderr so the run summary on stdout stays parseable. Set
/// `K33AUDIT_LOG_FORMAT=json` for JSON lines and `RUST_LOG` for the level
/// (default `info`). When `log_file` is given every event is also written to
/// that file, truncating it first.
///
/// # Errors
/// Returns [`LoggingError`] if the environment variable contains invalid
/// Unicode, the requested format is unsupported, or the log file cannot be
/// created.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), LoggingError> {
    if INITIALISED.get().is_some() {
        return Ok(());
    }

    match install_subscriber(log_file) {
        Ok(()) => {}
        Err(LoggingError::InstallFailed { source }) => {
            warn!(error = %source, "structured logging already configured elsewhere");
        }
        Err(err) => return Err(err),
    }
    let _ = INITIALISED.set(());
    Ok(())
}

fn install_subscriber(log_file: Option<&Path>) -> Result<(), LoggingError> {
    let format = match env::var(LOG_FORMAT_ENV) {
        Ok(raw) => parse_log_format(&raw)?,
        Err(env::VarError::NotPresent) => LogFormat::Human,
        Err(err @ env::VarError::NotUnicode(_)) => Err(LoggingError::InvalidUnicode {
            name: LOG_FORMAT_ENV,
            source: err,
        })?,
    };
    let file = log_file.map(open_log_file).transpose()?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::FULL)
        .with_writer(io::stderr);
    let console = match format {
        LogFormat::Json => stderr_layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Human => stderr_layer.boxed(),
    };
    let mirror = file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(Mutex::new(file))
    });

    // Best-effort: another logger may already own the `log` slot.
    let _ = LogTracer::init();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(mirror)
        .try_init()
        .map_err(|source| LoggingError::InstallFailed { source })
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    File::create(path).map_err(|source| LoggingError::LogFile {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_log_format(raw: &str) -> Result<LogFormat, LoggingError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "human" => Ok(LogFormat::Human),
        "json" => Ok(LogFormat::Json),
        other => Err(LoggingError::UnsupportedFormat {
            provided: other.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("human", LogFormat::Human)]
    #[case("HUMAN", LogFormat::Human)]
    #[case(" json ", LogFormat::Json)]
    fn parse_log_format_accepts_supported_values(#[case] raw: &str, #[case] expected: LogFormat) {
        let format = parse_log_format(raw).expect("format must parse");
        assert_eq!(format, expected);
    }

    #[test]
    fn parse_log_format_rejects_unknown_values() {
        let err = parse_log_format("xml").expect_err("xml is not supported");
        match err {
            LoggingError::UnsupportedFormat { provided } => assert_eq!(provided, "xml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn log_file_in_missing_directory_is_reported() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("absent").join("run.log");
        let err = open_log_file(&path).expect_err("parent does not exist");
        assert!(matches!(err, LoggingError::LogFile { path: reported, .. } if reported == path));
    }

    #[test]
    fn init_logging_is_idempotent() {
        let dir = TempDir::new().expect("temp dir");
        let log = dir.path().join("run.log");
        init_logging(Some(&log)).expect("logging must initialise");
        init_logging(None).expect("subsequent calls must be no-ops");
    }
}
