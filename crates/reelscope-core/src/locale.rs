//! Response language and region shared by listing controllers.

use serde::{Deserialize, Serialize};

/// Language/region pair sent with listing requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Locale {
    /// BCP 47 language tag (e.g. "en-US").
    pub language: String,
    /// ISO 3166-1 region code (e.g. "US").
    pub region: String,
}

impl Locale {
    /// Creates a locale.
    pub fn new(language: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            region: region.into(),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en-US", "US")
    }
}
