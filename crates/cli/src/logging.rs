//! stderr logging for the CLI.
//!
//! The engine and export crates log through the `log` facade; this module
//! installs the `flexi_logger` backend once, at startup. `RUST_LOG`, when
//! set, takes precedence over `--log-level`.

use clap::ValueEnum;
use flexi_logger::{Logger, LoggerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Start the logger. The returned handle must stay alive for the whole run.
pub fn init_logging(level: LogLevel) -> Result<LoggerHandle, String> {
    Logger::try_with_env_or_str(level.as_str())
        .map_err(|err| format!("invalid log level `{}`: {err}", level.as_str()))?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_match_log_specs() {
        for level in LogLevel::value_variants() {
            let name = level.as_str();
            assert!(flexi_logger::LogSpecification::parse(name).is_ok(), "{name}");
            assert_eq!(LogLevel::from_str(name, true).ok(), Some(*level));
        }
    }
}
