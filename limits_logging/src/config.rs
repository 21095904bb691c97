use std::convert::Infallible;

/// Minimum severity of the log lines emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Interpret a `LOG_LEVEL` value. Matching is case-insensitive, `fatal` and `panic`
    /// are accepted as aliases of `error`, and anything unrecognised selects
    /// [`LogLevel::Info`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" | "fatal" | "panic" => Self::Error,
            _ => Self::Info,
        }
    }

    /// `EnvFilter` directive for this level. Chatty HTTP internals stay at info when
    /// debugging the controller itself.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace,hyper=info,h2=info,tower=info,rustls=info",
            Self::Debug => "debug,hyper=info,h2=info,tower=info,rustls=info",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// human-readable, single line
    #[default]
    Full,
    /// human-readable, single line, abbreviated
    Compact,
    /// human-readable, multi line
    Pretty,
    /// machine-parseable, one JSON object per line
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogDestination {
    #[default]
    Stdout,
    Stderr,
}
