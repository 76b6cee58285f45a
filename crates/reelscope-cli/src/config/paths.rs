//! Config file location.
//!
//! Lookup order: `--dir`, then `$XDG_CONFIG_HOME/reelscope`, then
//! `$HOME/.config/reelscope`.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

const APP_DIR: &str = "reelscope";
const CONFIG_FILE: &str = "config.toml";

/// Resolves the config file path from `dir` and the process environment.
///
/// # Errors
///
/// Returns an error if `dir` is `None` and neither `XDG_CONFIG_HOME` nor
/// `HOME` yields a usable directory.
pub fn resolve_config_path(dir: Option<&Path>) -> Result<PathBuf> {
    config_path_from(
        dir,
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

/// Resolves the config file path from explicit inputs.
///
/// A relative or empty `XDG_CONFIG_HOME` is ignored, as the XDG base
/// directory rules require.
fn config_path_from(
    dir: Option<&Path>,
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }
    if let Some(xdg) = xdg_config_home.filter(|p| p.is_absolute()) {
        return Ok(xdg.join(APP_DIR).join(CONFIG_FILE));
    }
    match home.filter(|p| !p.as_os_str().is_empty()) {
        Some(home) => Ok(home.join(".config").join(APP_DIR).join(CONFIG_FILE)),
        None => bail!("cannot locate config directory: set HOME or pass --dir"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_dir_wins_over_environment() {
        // Arrange
        let dir = Path::new("/srv/reelscope");

        // Act
        let path = config_path_from(
            Some(dir),
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/srv/reelscope/config.toml"));
    }

    #[test]
    fn test_xdg_config_home_preferred_over_home() {
        // Arrange & Act
        let path = config_path_from(
            None,
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/xdg/reelscope/config.toml"));
    }

    #[test]
    fn test_relative_xdg_config_home_falls_back_to_home() {
        // Arrange & Act
        let path = config_path_from(
            None,
            Some(PathBuf::from("relative/cfg")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/home/u/.config/reelscope/config.toml"));
    }

    #[test]
    fn test_no_location_is_an_error() {
        // Arrange & Act
        let result = config_path_from(None, Some(PathBuf::new()), None);

        // Assert
        assert!(result.is_err());
    }
}
