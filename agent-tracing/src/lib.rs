use std::{io, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::ParseError, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    util::TryInitError, EnvFilter, Layer,
};

const DEFAULT_FILTER: &str = "info";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Daily rolling file `<directory>/<prefix>.<date>`.
    File { directory: PathBuf, prefix: String },
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LoggerSettings {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub output: LogOutput,
    /// `EnvFilter` directives. `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),
    #[error("Failed to install the global subscriber: {0}")]
    Init(#[from] TryInitError),
}

impl LoggerSettings {
    pub fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        Ok(EnvFilter::try_new(
            self.filter.as_deref().unwrap_or(DEFAULT_FILTER),
        )?)
    }
}

/// Installs the global subscriber described by `settings`.
///
/// The returned guard flushes buffered file output on drop and must be kept
/// alive for the lifetime of the process.
pub fn init_logging(settings: &LoggerSettings) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = settings.env_filter()?;
    let (layer, guard) = match &settings.output {
        LogOutput::Stdout => (format_layer(settings.format, io::stdout), None),
        LogOutput::Stderr => (format_layer(settings.format, io::stderr), None),
        LogOutput::File { directory, prefix } => {
            let appender = tracing_appender::rolling::daily(directory, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (format_layer(settings.format, writer), Some(guard))
        }
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()?;
    Ok(guard)
}

fn format_layer<S, W>(format: LogFormat, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
    W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    match format {
        LogFormat::Plain => fmt::layer().with_writer(writer).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(writer)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_to_plain_stdout() {
        let settings: LoggerSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, LoggerSettings::default());
    }

    #[test]
    fn file_output_from_yaml() {
        let settings: LoggerSettings = serde_yaml::from_str(
            "format: json\noutput: !file\n  directory: /var/log/agent\n  prefix: test-agent\nfilter: debug\n",
        )
        .unwrap();
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(
            settings.output,
            LogOutput::File {
                directory: PathBuf::from("/var/log/agent"),
                prefix: "test-agent".to_owned(),
            }
        );
        assert_eq!(settings.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn invalid_filter_is_reported() {
        let settings = LoggerSettings {
            filter: Some("rosetta_test_agent=notalevel".to_owned()),
            ..LoggerSettings::default()
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(
                settings.env_filter(),
                Err(LoggingError::Filter(_))
            ));
        }
    }
}
