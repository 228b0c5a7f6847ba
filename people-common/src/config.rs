//! Configuration loading and resolution
//!
//! Values resolve in priority order:
//! 1. Command-line argument (applied by the binary)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing default config file is not an error; the service starts on
//! compiled defaults. A config file named explicitly must exist.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name used under the platform config/data directories
const APP_DIR: &str = "people-info";

/// Environment variable names for overrides
pub const ENV_BIND: &str = "PEOPLE_INFO_BIND";
pub const ENV_DATABASE: &str = "PEOPLE_INFO_DATABASE";
pub const ENV_AGE_URL: &str = "PEOPLE_INFO_AGE_URL";
pub const ENV_GENDER_URL: &str = "PEOPLE_INFO_GENDER_URL";
pub const ENV_NATIONALITY_URL: &str = "PEOPLE_INFO_NATIONALITY_URL";
pub const ENV_CALL_TIMEOUT_MS: &str = "PEOPLE_INFO_CALL_TIMEOUT_MS";
pub const ENV_PUBLIC_URL: &str = "PEOPLE_INFO_PUBLIC_URL";

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub enrichment: EnrichmentConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,

    /// File this configuration was read from (None = compiled defaults)
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_secs: u64,
    /// Scheme + host used for pagination links instead of the request's Host header
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 10,
            public_base_url: None,
        }
    }
}

/// SQLite database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: 10,
        }
    }
}

/// External attribute service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub age_url: String,
    pub gender_url: String,
    pub nationality_url: String,
    /// Deadline for a single attribute call
    pub call_timeout_ms: u64,
    /// Minimum probability for accepting a gender candidate
    pub gender_min_probability: f64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            age_url: "https://api.agify.io/".to_string(),
            gender_url: "https://api.genderize.io/".to_string(),
            nationality_url: "https://api.nationalize.io/".to_string(),
            call_timeout_ms: 5000,
            gender_min_probability: 0.70,
        }
    }
}

impl EnrichmentConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Listing window defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub default_offset: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            default_offset: 0,
            max_limit: 100,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from file (explicit or platform default) plus environment
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Read and parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config {} failed: {}", path.display(), e))
        })?;

        let mut config = Self::from_toml_str(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse TOML content; missing sections and keys take defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Apply PEOPLE_INFO_* environment variables over file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(bind) = env_value(ENV_BIND) {
            self.server.bind_address = bind;
        }
        if let Some(path) = env_value(ENV_DATABASE) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(url) = env_value(ENV_AGE_URL) {
            self.enrichment.age_url = url;
        }
        if let Some(url) = env_value(ENV_GENDER_URL) {
            self.enrichment.gender_url = url;
        }
        if let Some(url) = env_value(ENV_NATIONALITY_URL) {
            self.enrichment.nationality_url = url;
        }
        if let Some(raw) = env_value(ENV_CALL_TIMEOUT_MS) {
            self.enrichment.call_timeout_ms = raw.parse().map_err(|e| {
                Error::Config(format!("{} must be an integer: {}", ENV_CALL_TIMEOUT_MS, e))
            })?;
        }
        if let Some(url) = env_value(ENV_PUBLIC_URL) {
            self.server.public_base_url = Some(url);
        }
        Ok(())
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<()> {
        let enrichment = &self.enrichment;
        for (key, value) in [
            ("enrichment.age_url", &enrichment.age_url),
            ("enrichment.gender_url", &enrichment.gender_url),
            ("enrichment.nationality_url", &enrichment.nationality_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::Config(format!("{} is not a valid URL: {}", key, e)))?;
        }

        if !(0.0..=1.0).contains(&enrichment.gender_min_probability) {
            return Err(Error::Config(format!(
                "enrichment.gender_min_probability must be within [0, 1], got {}",
                enrichment.gender_min_probability
            )));
        }
        if enrichment.call_timeout_ms == 0 {
            return Err(Error::Config(
                "enrichment.call_timeout_ms must be greater than zero".to_string(),
            ));
        }

        // A create request waits on enrichment, so it needs more than one call deadline
        if self.server.request_timeout_secs.saturating_mul(1000) <= enrichment.call_timeout_ms {
            return Err(Error::Config(format!(
                "server.request_timeout_secs ({}s) must exceed enrichment.call_timeout_ms ({}ms)",
                self.server.request_timeout_secs, enrichment.call_timeout_ms
            )));
        }

        let pagination = &self.pagination;
        if pagination.default_limit == 0 || pagination.default_limit > pagination.max_limit {
            return Err(Error::Config(format!(
                "pagination.default_limit must be within [1, {}], got {}",
                pagination.max_limit, pagination.default_limit
            )));
        }

        if let Some(base) = &self.server.public_base_url {
            url::Url::parse(base).map_err(|e| {
                Error::Config(format!("server.public_base_url is not a valid URL: {}", e))
            })?;
        }

        if self.database.max_connections == 0 {
            return Err(Error::Config(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Platform config file location (~/.config/people-info/config.toml on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR).join("people.db"))
        .unwrap_or_else(|| PathBuf::from("./people-info-data/people.db"))
}

/// Non-empty environment variable value
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
