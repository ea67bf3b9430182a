//! Layered configuration loading using figment.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`VIBE_REVIEW_*`, `__` separates sections)
//! 2. Project-local `.vibe-review.toml`
//! 3. User-level `<config dir>/vibe-review/config.toml`
//! 4. Built-in defaults
//!
//! `VIBE_REVIEW_REVIEWER__API_KEY` maps to `reviewer.api_key`, and so on.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),
    #[error("configuration section '{section}' is not configured")]
    NotConfigured { section: String },
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

pub const LOCAL_CONFIG_FILE: &str = ".vibe-review.toml";
pub const ENV_PREFIX: &str = "VIBE_REVIEW_";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GithubConfig {
    pub api_base: String,
    /// The only host a repository reference may name.
    pub host: String,
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            host: crate::reference::DEFAULT_HOST.to_string(),
            user_agent: concat!("vibe-review/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReviewerConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for ReviewerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LeaderboardConfig {
    /// Terminal rows per leaderboard entry.
    pub row_height: u32,
    pub buffer_rows: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            row_height: 1,
            buffer_rows: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VibeConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub reviewer: ReviewerConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

impl VibeConfig {
    /// Load from all sources and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config: Self = Self::figment().extract()?;
        if config.reviewer.api_key.is_empty() {
            config.reviewer.api_key = fallback_api_key().unwrap_or_default();
        }
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the current directory first, then [`VibeConfig::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// The provider chain, exposed so tests can layer on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global) = Self::global_config_path()
            && global.exists()
        {
            figment = figment.merge(Toml::file(global));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            figment = figment.merge(Toml::file(local));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vibe-review").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leaderboard.row_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "leaderboard.row_height".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.reviewer.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "reviewer.model".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The reviewer api key, or [`ConfigError::NotConfigured`].
    pub fn reviewer_key(&self) -> Result<&str, ConfigError> {
        if self.reviewer.api_key.trim().is_empty() {
            return Err(ConfigError::NotConfigured {
                section: "reviewer".to_string(),
            });
        }
        Ok(&self.reviewer.api_key)
    }
}

/// Conventional variable names for the reviewer key.
fn fallback_api_key() -> Option<String> {
    ["GEMINI_API_KEY", "API_KEY"]
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
}
