//! TOML-based configuration for plasmaq.
//!
//! Supports a config file (plasmaq.toml) with environment variable expansion
//! in the delegate credentials.
//!
//! Example configuration:
//! ```toml
//! [delegate]
//! enabled = true
//! endpoint = "https://api.openai.com/v1"
//! model = "gpt-4o-mini"
//! api_key = "${OPENAI_API_KEY}"
//! timeout_ms = 2000
//!
//! [compiler]
//! default_limit = 20
//! max_limit = 100
//! recent_days = 730
//! missing_dates = "exclude"   # or "include"
//! match_abstract = true
//!
//! [cache]
//! enabled = true
//! ttl_seconds = 300
//! max_entries = 100
//! # path = "/tmp/plasmaq-cache.db"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CachePolicy;
use crate::compiler::{CompileOptions, MissingDatePolicy, DEFAULT_LIMIT, DEFAULT_RECENT_DAYS};
use crate::parser::openai::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PLASMAQ_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub delegate: DelegateSettings,
    pub compiler: CompilerSettings,
    pub cache: CacheSettings,
}

/// Delegated extraction settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DelegateSettings {
    /// Try the delegate before pattern matching.
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible API.
    pub endpoint: String,

    pub model: String,

    /// API key (supports ${ENV_VAR} expansion).
    pub api_key: String,

    /// Bound on one delegate call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for DelegateSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: "${OPENAI_API_KEY}".to_string(),
            timeout_ms: 2000,
        }
    }
}

impl DelegateSettings {
    /// The API key with environment variables expanded.
    ///
    /// `None` when the delegate is disabled, the key is blank, or it names an
    /// unset variable; the parser then runs deterministically.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        match expand_env_vars(&self.api_key) {
            Ok(key) if !key.trim().is_empty() => Some(key),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(error = %err, "delegate credential unavailable");
                None
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Compiler settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Row limit when none is requested.
    pub default_limit: u32,

    /// Upper bound on a requested limit.
    pub max_limit: u32,

    /// Width of the "recent" window in days.
    pub recent_days: u32,

    pub missing_dates: MissingDatePolicy,

    /// Match keywords against abstracts as well as titles.
    pub match_abstract: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: 100,
            recent_days: DEFAULT_RECENT_DAYS,
            missing_dates: MissingDatePolicy::Exclude,
            match_abstract: true,
        }
    }
}

impl CompilerSettings {
    /// Compile options for these settings, dated today.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions::default()
            .with_limit(self.default_limit)
            .with_recent_days(self.recent_days)
            .with_missing_dates(self.missing_dates)
            .with_match_abstract(self.match_abstract)
    }

    /// Clamp a requested limit into `1..=max_limit`.
    pub fn clamp_limit(&self, requested: u32) -> u32 {
        requested.clamp(1, self.max_limit.max(1))
    }
}

/// Parsed-query cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,

    /// Entry lifetime in seconds.
    pub ttl_seconds: u64,

    pub max_entries: usize,

    /// Database file; the platform cache directory when unset.
    pub path: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 300,
            max_entries: 100,
            path: None,
        }
    }
}

impl CacheSettings {
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            ttl: Duration::from_secs(self.ttl_seconds),
            max_entries: self.max_entries,
        }
    }

    /// Configured path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_ref()
            .map(|p| expand_env_vars(&p.to_string_lossy()).map(PathBuf::from))
            .transpose()
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `PLASMAQ_CONFIG`
    /// 2. `./plasmaq.toml`
    /// 3. `<config dir>/plasmaq/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("plasmaq.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("plasmaq").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// Reject settings that cannot work together.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let compiler = &self.compiler;
        if compiler.max_limit == 0 {
            return Err(SettingsError::InvalidConfig(
                "compiler.max_limit must be at least 1".into(),
            ));
        }
        if compiler.default_limit == 0 || compiler.default_limit > compiler.max_limit {
            return Err(SettingsError::InvalidConfig(format!(
                "compiler.default_limit must be between 1 and max_limit ({}), got {}",
                compiler.max_limit, compiler.default_limit
            )));
        }
        if self.delegate.enabled && self.delegate.timeout_ms == 0 {
            return Err(SettingsError::InvalidConfig(
                "delegate.timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            // $VAR (ends at non-alphanumeric/underscore)
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
