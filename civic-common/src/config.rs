//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_MODEL_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_DIR_NAME: &str = "civic-feedback";

/// Which persistence backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoragePreference {
    /// Probe hosted → SQL → memory
    #[default]
    Auto,
    Memory,
    Sql,
    Hosted,
}

impl fmt::Display for StoragePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoragePreference::Auto => "auto",
            StoragePreference::Memory => "memory",
            StoragePreference::Sql => "sql",
            StoragePreference::Hosted => "hosted",
        };
        f.write_str(s)
    }
}

impl FromStr for StoragePreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(StoragePreference::Auto),
            "memory" => Ok(StoragePreference::Memory),
            "sql" | "sqlite" => Ok(StoragePreference::Sql),
            "hosted" | "supabase" => Ok(StoragePreference::Hosted),
            other => Err(Error::Config(format!(
                "Unknown storage backend '{}' (expected auto, memory, sql or hosted)",
                other
            ))),
        }
    }
}

/// TOML configuration file contents. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub storage: Option<StoragePreference>,
    pub max_upload_bytes: Option<usize>,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub openai: OpenAiSection,
    #[serde(default)]
    pub supabase: SupabaseSection,
    #[serde(default)]
    pub database: DatabaseSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    pub level: Option<String>,
}

impl LoggingSection {
    /// Configured level, or the default when unset
    pub fn level_or_default(&self) -> String {
        self.level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenAiSection {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupabaseSection {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: Option<String>,
    pub enabled: Option<bool>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub storage: Option<StoragePreference>,
}

/// Chat-completion API settings
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// PostgREST-compatible hosted database
#[derive(Debug, Clone, PartialEq)]
pub struct HostedDatabaseConfig {
    pub url: String,
    pub anon_key: String,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub storage: StoragePreference,
    pub max_upload_bytes: usize,
    pub log_level: String,
    pub language_model: LanguageModelConfig,
    /// Present only when both URL and key are configured
    pub hosted_database: Option<HostedDatabaseConfig>,
    /// Present only when a URL is configured and SQL is not disabled
    pub database_url: Option<String>,
}

impl ServiceConfig {
    /// Resolve against the process environment
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        Self::resolve_with(cli, toml, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve_with<F>(cli: &CliOverrides, toml: &TomlConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank environment values count as unset
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let env_any = |keys: &[&str]| keys.iter().find_map(|k| env(*k));

        let host = cli
            .host
            .clone()
            .or_else(|| env("HOST"))
            .or_else(|| toml.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match cli.port {
            Some(port) => port,
            None => match env("PORT") {
                Some(raw) => parse_env("PORT", &raw)?,
                None => toml.port.unwrap_or(DEFAULT_PORT),
            },
        };

        let storage = match cli.storage {
            Some(pref) => pref,
            None => match env("CIVIC_STORAGE") {
                Some(raw) => raw.parse()?,
                None => toml.storage.unwrap_or_default(),
            },
        };

        let max_upload_bytes = match env("CIVIC_MAX_UPLOAD_BYTES") {
            Some(raw) => parse_env("CIVIC_MAX_UPLOAD_BYTES", &raw)?,
            None => toml.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        };
        if max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be greater than zero".to_string()));
        }

        let log_level = toml.logging.level_or_default();

        let timeout_secs = match env("OPENAI_TIMEOUT_SECS") {
            Some(raw) => parse_env("OPENAI_TIMEOUT_SECS", &raw)?,
            None => toml.openai.timeout_secs.unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS),
        };

        let language_model = LanguageModelConfig {
            api_key: env("OPENAI_API_KEY").or_else(|| toml.openai.api_key.clone()),
            model: env("OPENAI_MODEL")
                .or_else(|| toml.openai.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: env("OPENAI_BASE_URL")
                .or_else(|| toml.openai.base_url.clone())
                .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string()),
            timeout_secs,
        };

        let hosted_url = env_any(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"])
            .or_else(|| toml.supabase.url.clone());
        let hosted_key = env_any(&["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"])
            .or_else(|| toml.supabase.anon_key.clone());
        let hosted_database = match (hosted_url, hosted_key) {
            (Some(url), Some(anon_key)) => Some(HostedDatabaseConfig { url, anon_key }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("Hosted database needs both a URL and an anon key; ignoring partial configuration");
                None
            }
            (None, None) => None,
        };

        let database_enabled = match env("USE_DATABASE") {
            Some(raw) => raw.trim() != "false",
            None => toml.database.enabled.unwrap_or(true),
        };
        let database_url = if database_enabled {
            env("DATABASE_URL").or_else(|| toml.database.url.clone())
        } else {
            debug!("SQL database disabled by configuration");
            None
        };

        Ok(Self {
            host,
            port,
            storage,
            max_upload_bytes,
            log_level,
            language_model,
            hosted_database,
            database_url,
        })
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: '{}'", key, raw)))
}

/// Locate the TOML config file.
///
/// An explicit path must exist. Otherwise the per-user config directory is
/// tried, then `/etc` on Linux; `None` when nothing is found.
pub fn locate_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(Error::Config(format!("Config file not found: {}", path.display())));
    }

    if let Some(user_config) = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.toml")) {
        if user_config.exists() {
            return Ok(Some(user_config));
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(CONFIG_DIR_NAME).join("config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }
    }

    Ok(None)
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}
