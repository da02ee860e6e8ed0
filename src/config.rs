//! Service configuration loaded from TOML.
//!
//! Values of the form `${VAR_NAME}` are replaced with the matching
//! environment variable before parsing; unknown variables are left as-is.

use regex_lite::Regex;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "TASKBOARD_CONFIG";

#[expect(
    clippy::expect_used,
    reason = "the pattern is a literal and is covered by tests"
)]
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("environment variable pattern is valid")
});

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration was not valid TOML or had the wrong shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `PostgreSQL` backend was selected without a database URL.
    #[error("storage backend `postgres` requires `storage.database_url`")]
    MissingDatabaseUrl,

    /// The server address did not parse.
    #[error("invalid server address {0}")]
    InvalidAddress(String),
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Persistence backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Loads configuration from the path given as the first CLI argument, or
    /// from [`CONFIG_PATH_ENV`], falling back to defaults when neither is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the named file cannot be read or parsed.
    pub fn load(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = cli_path.or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        match path {
            Some(config_path) => Self::from_file(config_path),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Parses configuration from a TOML string after environment
    /// substitution.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input, or
    /// [`ConfigError::MissingDatabaseUrl`] when `postgres` is selected
    /// without a URL.
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let substituted = substitute_env_vars_with(content, |name| std::env::var(name).ok());
        let config: Self = toml::from_str(&substituted)?;
        config.storage.validate()?;
        Ok(config)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Returns the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] when host and port do not form
    /// a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(address))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8000
}

/// Which repository implementation backs the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps; data is lost on exit.
    #[default]
    Memory,
    /// `PostgreSQL` through Diesel.
    Postgres,
}

/// Persistence backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: StorageBackend,

    /// Connection URL, required for `postgres`.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Pool size for `postgres`.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let has_url = self
            .database_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if self.backend == StorageBackend::Postgres && !has_url {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

const fn default_max_connections() -> u32 {
    10
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelemetryConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "info".to_owned()
}

/// Replaces `${VAR_NAME}` placeholders using `lookup`.
///
/// Placeholders whose variable `lookup` cannot resolve are kept verbatim.
pub fn substitute_env_vars_with<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_VAR_PATTERN
        .replace_all(content, |caps: &regex_lite::Captures<'_>| {
            let placeholder = caps.get(0).map_or("", |m| m.as_str());
            caps.get(1)
                .and_then(|name| lookup(name.as_str()))
                .unwrap_or_else(|| placeholder.to_owned())
        })
        .into_owned()
}
