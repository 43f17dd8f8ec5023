use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Database engine connection settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Retry policy settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Process lifecycle settings
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Database engine connection settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Engine base URL (e.g., "http://localhost:8000")
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Namespace selected on every request
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Database selected on every request
    #[serde(default = "default_database")]
    pub database: String,

    /// Basic auth user name
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            namespace: default_namespace(),
            database: default_database(),
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Retry policy settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts per query, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default)]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: 0,
        }
    }
}

/// Process lifecycle settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct LifecycleConfig {
    /// Build/static-analysis phase; no connection is opened
    #[serde(default)]
    pub building: bool,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Environment variable that forces the build phase
pub const BUILDING_ENV: &str = "RECORDGATE_BUILDING";

fn default_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_namespace() -> String {
    "main".to_string()
}

fn default_database() -> String {
    "main".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

/// Whether an environment value switches the build phase on
pub fn building_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1") | Some("true")
    )
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.database.endpoint)
            .with_context(|| format!("Invalid database endpoint: {}", self.database.endpoint))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Database endpoint must use http or https, got '{}'",
                endpoint.scheme()
            ));
        }

        if self.database.namespace.trim().is_empty() {
            return Err(anyhow!("Database namespace is required"));
        }

        if self.database.database.trim().is_empty() {
            return Err(anyhow!("Database name is required"));
        }

        if self.database.password.is_some() && self.database.username.is_none() {
            return Err(anyhow!("Database password is set without a username"));
        }

        if self.database.timeout_secs == 0 {
            return Err(anyhow!("Database timeout must be at least 1 second"));
        }

        if self.retry.max_attempts == 0 {
            return Err(anyhow!("Retry max_attempts must be at least 1"));
        }

        Ok(())
    }

    /// Whether the process is in its build phase, from config or the environment
    pub fn is_building(&self) -> bool {
        self.lifecycle.building || building_flag(std::env::var(BUILDING_ENV).ok().as_deref())
    }

    /// Load the configuration from `path`, creating a default file when it does not exist
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            return Self::load(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Load the configuration from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration to `path` as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig::default(),
            retry: RetryConfig::default(),
            lifecycle: LifecycleConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
