use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub mail: MailConfig,

    pub pagination: PaginationConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/mesa.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3333,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Lifetime of a bearer token issued at login.
    pub api_token_ttl_hours: i64,

    /// Lifetime of a password reset token (default: 120 = 2 hours).
    pub password_reset_ttl_minutes: i64,

    pub min_password_length: usize,
}

/// Ten years.
const MAX_API_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

/// One week.
const MAX_PASSWORD_RESET_TTL_MINUTES: i64 = 60 * 24 * 7;

impl SecurityConfig {
    pub fn api_token_ttl(&self) -> Result<TimeDelta> {
        ttl_within(
            self.api_token_ttl_hours,
            MAX_API_TOKEN_TTL_HOURS,
            TimeDelta::try_hours,
            "security.api_token_ttl_hours",
        )
    }

    pub fn password_reset_ttl(&self) -> Result<TimeDelta> {
        ttl_within(
            self.password_reset_ttl_minutes,
            MAX_PASSWORD_RESET_TTL_MINUTES,
            TimeDelta::try_minutes,
            "security.password_reset_ttl_minutes",
        )
    }
}

fn ttl_within(
    value: i64,
    max: i64,
    to_delta: fn(i64) -> Option<TimeDelta>,
    key: &str,
) -> Result<TimeDelta> {
    if !(1..=max).contains(&value) {
        anyhow::bail!("{key} must be between 1 and {max}, got {value}");
    }
    to_delta(value).with_context(|| format!("{key} is out of range"))
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            api_token_ttl_hours: 24 * 7,
            password_reset_ttl_minutes: 120,
            min_password_length: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// When disabled, messages are dropped before reaching the queue.
    pub enabled: bool,

    pub from_address: String,

    /// Messages waiting for delivery; further messages are dropped with a warning.
    pub queue_capacity: usize,

    pub welcome_subject: String,

    pub reset_subject: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            from_address: "no-reply@mesa.local".to_string(),
            queue_capacity: 100,
            welcome_subject: "Welcome to Mesa".to_string(),
            reset_subject: "Mesa: password recovery".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u64,

    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "mesa".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path).map(Self::with_env_overrides);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default().with_env_overrides())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// `MESA_DATABASE_URL` and `MESA_PORT` take precedence over the file.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("MESA_DATABASE_URL")
            && !url.is_empty()
        {
            self.general.database_path = url;
        }

        if let Some(port) = std::env::var("MESA_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        self
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("mesa").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".mesa").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("general.database_path cannot be empty");
        }

        if !matches!(self.general.log_format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "general.log_format must be \"pretty\" or \"json\", got \"{}\"",
                self.general.log_format
            );
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("general.min_db_connections cannot exceed max_db_connections");
        }

        self.security.api_token_ttl()?;
        self.security.password_reset_ttl()?;

        if self.pagination.default_limit == 0
            || self.pagination.default_limit > self.pagination.max_limit
        {
            anyhow::bail!("pagination.default_limit must be between 1 and max_limit");
        }

        if self.mail.queue_capacity == 0 {
            anyhow::bail!("mail.queue_capacity must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.security.password_reset_ttl_minutes, 120);
        assert_eq!(config.security.min_password_length, 4);
        assert_eq!(config.pagination.default_limit, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security]"));
        assert!(toml_str.contains("[pagination]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [security]
            password_reset_ttl_minutes = 30
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.security.password_reset_ttl_minutes, 30);

        assert_eq!(config.server.port, 3333);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.general.log_format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pagination.default_limit = 500;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.security.password_reset_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ttl_bounds() {
        let mut security = SecurityConfig::default();
        assert_eq!(security.api_token_ttl().unwrap(), TimeDelta::hours(168));
        assert_eq!(security.password_reset_ttl().unwrap(), TimeDelta::minutes(120));

        security.api_token_ttl_hours = i64::MAX;
        assert!(security.api_token_ttl().is_err());

        security.password_reset_ttl_minutes = i64::MAX;
        assert!(security.password_reset_ttl().is_err());

        security.password_reset_ttl_minutes = -5;
        assert!(security.password_reset_ttl().is_err());

        let mut config = Config::default();
        config.security.api_token_ttl_hours = i64::MAX;
        assert!(config.validate().is_err());
    }
}
