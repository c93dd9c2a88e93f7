//! Logging config and setup
//!
//! Logs go to stderr unless a path is configured; stdout carries MCP messages in stdio mode.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Logging related options
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Logging {
    /// The log level to use for tracing
    #[serde(default = "default_level", deserialize_with = "level_from_str")]
    #[schemars(with = "LevelName")]
    pub level: Level,

    /// The output directory to use for logging
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Log file rotation period to use when log file path provided
    #[serde(default)]
    pub rotation: LogRotation,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_level(),
            path: None,
            rotation: LogRotation::default(),
        }
    }
}

const fn default_level() -> Level {
    Level::INFO
}

fn level_from_str<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer)?
        .parse()
        .map_err(serde::de::Error::custom)
}

/// A `tracing` level, as written in configuration
#[derive(JsonSchema)]
#[schemars(rename_all = "lowercase")]
#[allow(dead_code)]
enum LevelName {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// How often the log file is rolled over
#[derive(Debug, Clone, Copy, Default, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    #[default]
    Hourly,
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(value: LogRotation) -> Self {
        match value {
            LogRotation::Minutely => Rotation::MINUTELY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

impl Logging {
    pub fn env_filter(&self) -> Result<EnvFilter, anyhow::Error> {
        let mut env_filter = EnvFilter::from_default_env().add_directive(self.level.into());

        if self.level == Level::INFO {
            env_filter = env_filter.add_directive("rmcp=warn".parse()?);
        }
        Ok(env_filter)
    }

    /// Install the global subscriber.
    ///
    /// The returned guard flushes file logs when dropped, so keep it for the life of the process.
    pub fn setup(&self) -> Result<Option<WorkerGuard>, anyhow::Error> {
        let env_filter = self.env_filter()?;
        match &self.path {
            Some(path) => setup_file_logging(path, env_filter, self.rotation),
            None => setup_stderr_logging(env_filter),
        }
    }
}

/// Sets up rolling file appender logging but falls back to stderr logging on failure
fn setup_file_logging(
    log_path: &Path,
    env_filter: EnvFilter,
    log_rotation: LogRotation,
) -> Result<Option<WorkerGuard>, anyhow::Error> {
    if let Err(error) = std::fs::create_dir_all(log_path) {
        eprintln!("Could not build log path ({error}) - falling back to stderr");
        return setup_stderr_logging(env_filter);
    }

    let (non_blocking_writer, guard) = match RollingFileAppender::builder()
        .rotation(log_rotation.into())
        .filename_prefix("keystone_mcp_server")
        .filename_suffix("log")
        .build(log_path)
    {
        Ok(appender) => tracing_appender::non_blocking(appender),
        Err(error) => {
            eprintln!("Log file setup failed ({error}) - falling back to stderr");
            return setup_stderr_logging(env_filter);
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .init();

    Ok(Some(guard))
}

fn setup_stderr_logging(env_filter: EnvFilter) -> Result<Option<WorkerGuard>, anyhow::Error> {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(false),
        )
        .init();

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_levels_and_rotation() {
        let logging: Logging =
            serde_json::from_str(r#"{"level": "warn", "rotation": "daily"}"#).unwrap();

        assert_eq!(logging.level, Level::WARN);
        assert_eq!(logging.rotation, LogRotation::Daily);
        assert!(logging.path.is_none());
    }

    #[rstest]
    #[case(LogRotation::Minutely, Rotation::MINUTELY)]
    #[case(LogRotation::Hourly, Rotation::HOURLY)]
    #[case(LogRotation::Never, Rotation::NEVER)]
    fn maps_to_rotation(#[case] rotation: LogRotation, #[case] expected: Rotation) {
        assert_eq!(Rotation::from(rotation), expected);
    }

    #[test]
    fn rejects_unknown_levels() {
        assert!(serde_json::from_str::<Logging>(r#"{"level": "loud"}"#).is_err());
    }

    #[test]
    fn quiets_the_protocol_layer_at_info() {
        let filter = Logging::default().env_filter().unwrap().to_string();

        assert!(filter.contains("rmcp=warn"));
    }
}
