//! `AppConfig` struct and TOML loading.

use std::path::Path;

use anyhow::{Context, Result};
use reelscope_core::{FavoriteSavePolicy, Locale};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable that overrides `[auth] id_token`.
pub const ID_TOKEN_ENV: &str = "REELSCOPE_ID_TOKEN";

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Default response language and region.
    #[serde(default)]
    pub locale: Locale,
    /// Favorite handling in listing views.
    #[serde(default)]
    pub favorites: FavoritesConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Backend configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the backend proxy (e.g. `https://example.com/api/`).
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Favorite handling configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FavoritesConfig {
    /// `"log"` or `"surface"`.
    #[serde(default)]
    pub on_save_failure: FavoriteSavePolicy,
}

/// Authentication configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AuthConfig {
    /// Pre-issued bearer token.
    #[serde(default)]
    pub id_token: Option<String>,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parsed backend base URL, if configured.
    ///
    /// # Errors
    ///
    /// Returns an error if `[api] base_url` is not a valid URL.
    pub fn base_url(&self) -> Result<Option<Url>> {
        self.api
            .base_url
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("invalid [api] base_url: {raw}")))
            .transpose()
    }

    /// Bearer token, preferring `env_token` over `[auth] id_token`.
    ///
    /// Blank values count as absent.
    #[must_use]
    pub fn id_token(&self, env_token: Option<String>) -> Option<String> {
        env_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.auth.id_token.clone())
            .filter(|t| !t.trim().is_empty())
    }
}
