//! Runtime settings for the cmdhub tool itself

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default remote command repository
pub const DEFAULT_REPOSITORY_URL: &str =
    "https://raw.githubusercontent.com/goobits/cmdhub-commands/main/commands";

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub repository: RepositorySettings,
    pub cache: CacheSettings,
    pub local: LocalSettings,
    pub logging: LoggingConfig,
}

/// Remote repository access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    pub base_url: String,
    /// HTTP timeout in milliseconds
    pub timeout_ms: u64,
    pub max_response_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Defaults to `~/.cmdhub/cache`
    pub dir: Option<PathBuf>,
    pub ttl_seconds: u64,
}

/// Local command roots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSettings {
    /// Defaults to `~/.claude/commands`
    pub personal_root: Option<PathBuf>,
    /// Defaults to `./.claude/commands`
    pub project_root: Option<PathBuf>,
    pub max_depth: usize,
}

/// Log output format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format for development
    #[default]
    Pretty,
    /// Structured JSON format
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REPOSITORY_URL.to_string(),
            timeout_ms: 10_000,
            max_response_bytes: 5 * 1024 * 1024, // 5 MiB
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: None,
            ttl_seconds: 3600, // 1 hour
        }
    }
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            personal_root: None,
            project_root: None,
            max_depth: 8,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}

impl From<ConfigError> for figment::Error {
    fn from(err: ConfigError) -> figment::Error {
        use figment::error::Kind;
        figment::Error::from(Kind::Message(err.to_string()))
    }
}

impl AppSettings {
    /// Load settings for the current user and working directory
    pub fn load() -> Result<Self, ConfigError> {
        let home = dirs::home_dir();
        let cwd = std::env::current_dir()
            .map_err(|e| ConfigError::Invalid(format!("cannot read working directory: {e}")))?;
        Self::load_from(home.as_deref(), &cwd)
    }

    /// Load settings in priority order (highest last):
    /// 1. Defaults
    /// 2. `<home>/.cmdhub/settings.toml`
    /// 3. `<project_root>/cmdhub.toml`
    /// 4. `CMDHUB__*` environment variables (`__` separates nesting levels)
    pub fn load_from(home: Option<&Path>, project_root: &Path) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(AppSettings::default()));

        if let Some(home) = home {
            let user_settings = home.join(".cmdhub").join("settings.toml");
            if user_settings.exists() {
                tracing::debug!(path = %user_settings.display(), "Loading user settings");
                figment = figment.merge(Toml::file(user_settings));
            }
        }

        let project_settings = project_root.join("cmdhub.toml");
        if project_settings.exists() {
            tracing::debug!(path = %project_settings.display(), "Loading project settings");
            figment = figment.merge(Toml::file(project_settings));
        }

        figment = figment.merge(Env::prefixed("CMDHUB__").split("__"));

        let settings: AppSettings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.repository.base_url).map_err(|e| {
            ConfigError::Invalid(format!(
                "repository.base_url '{}' is not a valid URL: {e}",
                self.repository.base_url
            ))
        })?;

        if self.repository.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "repository.timeout_ms cannot be 0".to_string(),
            ));
        }

        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "cache.ttl_seconds cannot be 0".to_string(),
            ));
        }

        if self.local.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "local.max_depth cannot be 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    pub fn cache_dir(&self, home: &Path) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(|| home.join(".cmdhub").join("cache"))
    }

    pub fn personal_root(&self, home: &Path) -> PathBuf {
        self.local
            .personal_root
            .clone()
            .unwrap_or_else(|| home.join(".claude").join("commands"))
    }

    pub fn project_root(&self, cwd: &Path) -> PathBuf {
        self.local
            .project_root
            .clone()
            .unwrap_or_else(|| cwd.join(".claude").join("commands"))
    }
}
