use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::models::Locale;

/// Text shown when a string is missing from the table
pub const MISSING_STRING: &str = "error lang";

/// Localized strings: message name -> locale code -> text
/// Loaded from data/lang.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LangTable {
    strings: HashMap<String, HashMap<String, String>>,
}

impl LangTable {
    /// Load from a JSON file
    pub fn load_from_file(path: &str) -> crate::error::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::error::BotError::ConfigLoad {
                path: path.to_string(),
                source: e,
            })?;

        serde_json::from_str(&content).map_err(|e| crate::error::BotError::ConfigParse {
            path: path.to_string(),
            source: e,
        })
    }

    /// Look up a string, falling back to `fallback` and then to a placeholder
    pub fn get(&self, name: &str, locale: Locale, fallback: Locale) -> String {
        let Some(by_locale) = self.strings.get(name) else {
            warn!("Missing lang string '{}'", name);
            return MISSING_STRING.to_string();
        };

        by_locale
            .get(locale.as_str())
            .or_else(|| by_locale.get(fallback.as_str()))
            .cloned()
            .unwrap_or_else(|| {
                warn!("Lang string '{}' has no '{}' or '{}' text", name, locale, fallback);
                MISSING_STRING.to_string()
            })
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }
}
