//! Application configuration module.
//!
//! Manages the TOML config file: backend URL, locale, favorite-save
//! policy and the pre-issued bearer token.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, ID_TOKEN_ENV};
pub use paths::resolve_config_path;
