//! Configuration module for talkback.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Port used when neither the CLI nor the config file names one
pub const DEFAULT_PORT: u16 = 4000;

/// Idle window before a silent client is disconnected
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest message (in characters) kept from a single line
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1024;

/// Command-line arguments for the server
#[derive(Parser, Debug)]
#[command(name = "talkback")]
#[command(author = "talkback authors")]
#[command(version = "0.1.0")]
#[command(about = "A line-oriented TCP chat responder", long_about = None)]
pub struct CliArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind; the IPv6 wildcard also takes IPv4 on dual-stack hosts
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Directory holding the per-client transcripts
    pub log_dir: PathBuf,
    pub idle_timeout: Duration,
    pub max_message_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "[::]".to_string(),
            port: DEFAULT_PORT,
            log_level: default_log_level(),
            log_dir: PathBuf::from("."),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        // Merge CLI args with TOML config (CLI takes precedence)
        Ok(Config {
            port: cli.port.unwrap_or(toml_config.server.port),
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
            ..Config::default()
        })
    }

    /// Address string handed to the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
