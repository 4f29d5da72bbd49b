//! Configuration management for ptyctl.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::pty::{EnvironmentBlock, LaunchSpec, WindowSize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session defaults.
    pub session: SessionSection,
    /// Relay settings for the binary.
    pub io: IoSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Session configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Initial number of columns.
    pub cols: u16,
    /// Initial number of rows.
    pub rows: u16,
    /// Interpreter for command lines, replacing the backend default.
    pub shell: Option<String>,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            cols: WindowSize::DEFAULT.cols,
            rows: WindowSize::DEFAULT.rows,
            shell: None,
        }
    }
}

/// I/O relay configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoSection {
    /// Chunk size for reading session output.
    pub read_buffer_size: usize,
    /// Interval between exit code polls, in milliseconds.
    pub exit_poll_ms: u64,
}

impl Default for IoSection {
    fn default() -> Self {
        Self {
            read_buffer_size: 4096,
            exit_poll_ms: 50,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cols) = lookup("PTYCTL_COLS") {
            self.session.cols = parse_dimension("PTYCTL_COLS", &cols)?;
        }

        if let Some(rows) = lookup("PTYCTL_ROWS") {
            self.session.rows = parse_dimension("PTYCTL_ROWS", &rows)?;
        }

        if let Some(shell) = lookup("PTYCTL_SHELL") {
            if !shell.is_empty() {
                self.session.shell = Some(shell);
            }
        }

        if let Some(level) = lookup("PTYCTL_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(cols) = args.cols {
            self.session.cols = cols;
        }

        if let Some(rows) = args.rows {
            self.session.rows = rows;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env()?;
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Reject values no session could be opened with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.cols == 0 || self.session.rows == 0 {
            return Err(ConfigError::InvalidValue(
                "session.cols/rows",
                format!("{}x{}", self.session.cols, self.session.rows),
            ));
        }
        if self.io.read_buffer_size == 0 {
            return Err(ConfigError::InvalidValue(
                "io.read_buffer_size",
                "0".to_string(),
            ));
        }
        Ok(())
    }

    /// Initial viewport size.
    pub fn window_size(&self) -> WindowSize {
        WindowSize::new(self.session.cols, self.session.rows)
    }

    pub fn exit_poll_interval(&self) -> Duration {
        Duration::from_millis(self.io.exit_poll_ms.max(1))
    }

    /// Build the launch description for the binary's single session.
    ///
    /// `--app` wins over the configured shell; the shell only applies when
    /// there is a command line for it to interpret.
    pub fn launch_spec(&self, args: &Args) -> Result<LaunchSpec, ConfigError> {
        let app_name = args.app_name.clone().or_else(|| {
            args.command_line
                .as_ref()
                .and(self.session.shell.clone())
        });

        let environment = if args.env_clear || !args.env.is_empty() {
            let mut block = if args.env_clear {
                EnvironmentBlock::new()
            } else {
                EnvironmentBlock::inherited()
            };
            for (key, value) in &args.env {
                block
                    .set(key.as_str(), value.as_str())
                    .map_err(|e| ConfigError::InvalidValue("env", e.to_string()))?;
            }
            Some(block)
        } else {
            None
        };

        Ok(LaunchSpec {
            app_name,
            command_line: args.command_line.clone(),
            working_dir: args.cwd.clone(),
            environment,
        })
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

fn parse_dimension(name: &'static str, value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue(name, value.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// A setting has an unusable value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window_size(), WindowSize::new(80, 25));
        assert!(config.session.shell.is_none());
        assert_eq!(config.io.read_buffer_size, 4096);
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "session": { "cols": 132 } }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.session.cols, 132);
        assert_eq!(config.session.rows, 25);
        assert_eq!(config.io.exit_poll_ms, 50);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_from(lookup(&[
                ("PTYCTL_COLS", "100"),
                ("PTYCTL_ROWS", "30"),
                ("PTYCTL_SHELL", "/bin/bash"),
                ("RUST_LOG", "trace"),
            ]))
            .unwrap();

        assert_eq!(config.window_size(), WindowSize::new(100, 30));
        assert_eq!(config.session.shell.as_deref(), Some("/bin/bash"));
        assert_eq!(config.log_filter(), "trace");
    }

    #[test]
    fn test_env_log_level_beats_rust_log() {
        let mut config = Config::default();
        config
            .apply_env_from(lookup(&[("PTYCTL_LOG_LEVEL", "warn"), ("RUST_LOG", "trace")]))
            .unwrap();
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn test_env_rejects_bad_dimension() {
        let mut config = Config::default();
        assert!(config
            .apply_env_from(lookup(&[("PTYCTL_COLS", "wide")]))
            .is_err());
        assert!(config.apply_env_from(lookup(&[("PTYCTL_ROWS", "0")])).is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            cols: Some(200),
            log_level: Some("debug".to_string()),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.session.cols, 200);
        assert_eq!(config.session.rows, 25);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.io.read_buffer_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_launch_spec_uses_configured_shell() {
        let mut config = Config::default();
        config.session.shell = Some("/bin/bash".to_string());

        let args = Args {
            command_line: Some("echo hi".to_string()),
            ..Args::default()
        };
        let spec = config.launch_spec(&args).unwrap();
        assert_eq!(spec.app_name.as_deref(), Some("/bin/bash"));
        assert_eq!(spec.command_line.as_deref(), Some("echo hi"));
        assert!(spec.environment.is_none());
    }

    #[test]
    fn test_launch_spec_app_wins() {
        let mut config = Config::default();
        config.session.shell = Some("/bin/bash".to_string());

        let args = Args {
            app_name: Some("/usr/bin/top".to_string()),
            ..Args::default()
        };
        let spec = config.launch_spec(&args).unwrap();
        assert_eq!(spec.app_name.as_deref(), Some("/usr/bin/top"));
        assert!(spec.command_line.is_none());
    }

    #[test]
    fn test_launch_spec_clean_environment() {
        let args = Args {
            command_line: Some("env".to_string()),
            env: vec![("FOO".to_string(), "bar".to_string())],
            env_clear: true,
            ..Args::default()
        };
        let spec = Config::default().launch_spec(&args).unwrap();
        let env = spec.environment.unwrap();
        assert_eq!(env.encode(), "FOO=bar\0\0");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"cols\""));
        assert!(json.contains("\"read_buffer_size\""));
    }
}
