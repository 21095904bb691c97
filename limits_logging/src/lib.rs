//! Log initialization and setup
//!
//! The log configuration is an explicit [`LoggingConfig`] value built from flags and the
//! environment at startup. Nothing else in the controller reads or changes the log level.
pub mod cli;
pub mod config;

pub use cli::LoggingConfig;
pub use config::*;

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, MakeWriter, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot set global tracing subscriber: {0}")]
    SetGlobalDefault(#[from] tracing_subscriber::util::TryInitError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Builder for the log subscriber.
#[derive(Debug)]
pub struct Builder<W = fn() -> std::io::Stdout> {
    log_level: LogLevel,
    log_format: LogFormat,
    make_writer: W,
    with_target: bool,
    with_ansi: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
            make_writer: std::io::stdout,
            with_target: true,
            with_ansi: true,
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }
}

// This needs to be a separate impl block because they place different bounds on the type parameters.
impl<W> Builder<W> {
    pub fn with_writer<W2>(self, make_writer: W2) -> Builder<W2>
    where
        W2: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Builder::<W2> {
            make_writer,
            // cannot use `..self` because W type parameter changes
            log_level: self.log_level,
            log_format: self.log_format,
            with_target: self.with_target,
            with_ansi: self.with_ansi,
        }
    }

    pub fn with_log_level(self, log_level: LogLevel) -> Self {
        Self { log_level, ..self }
    }

    pub fn with_log_format(self, log_format: LogFormat) -> Self {
        Self { log_format, ..self }
    }

    pub fn with_log_destination(self, log_destination: LogDestination) -> Builder<BoxMakeWriter> {
        let make_writer = match log_destination {
            LogDestination::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogDestination::Stderr => BoxMakeWriter::new(std::io::stderr),
        };
        self.with_writer(make_writer)
    }

    /// Sets whether or not an event's target is displayed.
    ///
    /// Defaults to true.
    pub fn with_target(self, with_target: bool) -> Self {
        Self {
            with_target,
            ..self
        }
    }

    /// Enable/disable ANSI encoding for formatted events (i.e. colors).
    ///
    /// Defaults to true.
    pub fn with_ansi(self, with_ansi: bool) -> Self {
        Self { with_ansi, ..self }
    }
}

impl<W> Builder<W>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    pub fn build(self) -> impl Subscriber + Send + Sync + 'static {
        let layer = fmt::layer()
            .with_writer(self.make_writer)
            .with_target(self.with_target)
            .with_ansi(self.with_ansi);

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.log_format {
            LogFormat::Full => layer.boxed(),
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Json => layer.json().boxed(),
        };

        Registry::default()
            .with(layer)
            .with(EnvFilter::new(self.log_level.filter_directive()))
    }

    /// Build and install the subscriber as the global default. Records emitted through
    /// the `log` crate by dependencies are forwarded too.
    pub fn install_global(self) -> Result<()> {
        self.build().try_init()?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[test]
    fn simple_logging() {
        assert_eq!(
            simple_test(Builder::new()).without_timestamps(),
            r#"
ERROR foo
WARN woo
INFO bar
"#
            .trim_start(),
        );
    }

    #[test]
    fn levels() {
        assert_eq!(
            simple_test(Builder::new().with_log_level(LogLevel::Error)).without_timestamps(),
            r#"
ERROR foo
"#
            .trim_start(),
        );

        assert_eq!(
            simple_test(Builder::new().with_log_level(LogLevel::Warn)).without_timestamps(),
            r#"
ERROR foo
WARN woo
"#
            .trim_start(),
        );

        assert_eq!(
            simple_test(Builder::new().with_log_level(LogLevel::Debug)).without_timestamps(),
            r#"
ERROR foo
WARN woo
INFO bar
DEBUG baz
"#
            .trim_start(),
        );

        assert_eq!(
            simple_test(Builder::new().with_log_level(LogLevel::Trace)).without_timestamps(),
            r#"
ERROR foo
WARN woo
INFO bar
DEBUG baz
TRACE trax
"#
            .trim_start(),
        );
    }

    #[test]
    fn fatal_alias_only_shows_errors() {
        let builder = Builder::new().with_log_level(LogLevel::from_name("fatal"));
        assert_eq!(simple_test(builder).without_timestamps(), "ERROR foo\n");
    }

    #[test]
    fn structured_fields() {
        let captured = log_test(Builder::new(), || {
            tracing::info!(name = "limits-generated", head_series_limit = 7000, "updated");
        });
        assert_eq!(
            captured.without_timestamps(),
            "INFO updated name=\"limits-generated\" head_series_limit=7000\n"
        );
    }

    #[test]
    fn json_format() {
        let captured = log_test(Builder::new().with_log_format(LogFormat::Json), || {
            tracing::info!(ready_replicas = 3, "counted");
        });
        let output = captured.to_string();
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 1, "{output}");
        assert!(lines[0].starts_with('{'), "{output}");
        assert!(lines[0].contains(r#""level":"INFO""#), "{output}");
        assert!(lines[0].contains(r#""message":"counted""#), "{output}");
        assert!(lines[0].contains(r#""ready_replicas":3"#), "{output}");
    }
}
