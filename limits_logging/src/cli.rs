//! Common CLI flags for logging
use crate::{Builder, Result, config::*};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// CLI config for the logging related subset of options.
#[derive(Debug, Clone, Copy, Default, clap::Parser)]
pub struct LoggingConfig {
    /// Logs: minimum severity
    ///
    /// One of: trace, debug, info, warn (or warning), error (fatal and panic are
    /// accepted as error). Unrecognised values fall back to info.
    #[clap(
        long = "log-level",
        env = "LOG_LEVEL",
        default_value = "info",
        value_parser = parse_log_level,
        action
    )]
    pub log_level: LogLevel,

    /// Logs: message format
    #[clap(
        long = "log-format",
        env = "LOG_FORMAT",
        default_value_t = LogFormat::default(),
        value_enum,
        action
    )]
    pub log_format: LogFormat,

    /// Logs: destination
    #[clap(
        long = "log-destination",
        env = "LOG_DESTINATION",
        default_value_t = LogDestination::default(),
        value_enum,
        action
    )]
    pub log_destination: LogDestination,
}

fn parse_log_level(s: &str) -> Result<LogLevel, std::convert::Infallible> {
    s.parse()
}

impl LoggingConfig {
    pub fn to_builder(&self) -> Builder<BoxMakeWriter> {
        Builder::new()
            .with_log_level(self.log_level)
            .with_log_format(self.log_format)
            .with_log_destination(self.log_destination)
    }

    /// Install the subscriber described by this config as the process-wide default.
    pub fn install_global(&self) -> Result<()> {
        self.to_builder().install_global()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[clap(flatten)]
        logging_config: LoggingConfig,
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["test"]).unwrap();
        // LOG_LEVEL may be set in the environment running the tests
        assert_eq!(cli.logging_config.log_format, LogFormat::Full);
        assert_eq!(cli.logging_config.log_destination, LogDestination::Stdout);
    }

    #[test]
    fn flags() {
        let cli = Cli::try_parse_from([
            "test",
            "--log-level",
            "WARNING",
            "--log-format",
            "json",
            "--log-destination",
            "stderr",
        ])
        .unwrap();
        assert_eq!(cli.logging_config.log_level, LogLevel::Warn);
        assert_eq!(cli.logging_config.log_format, LogFormat::Json);
        assert_eq!(cli.logging_config.log_destination, LogDestination::Stderr);
    }

    #[test]
    fn unknown_level_is_accepted() {
        let cli = Cli::try_parse_from(["test", "--log-level", "chatty"]).unwrap();
        assert_eq!(cli.logging_config.log_level, LogLevel::Info);
    }
}
