//! Registry configuration.

use crate::validate::BannedWordsValidator;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration for the composition root.
///
/// Deserializable so deployments can load it from a config file; tests build
/// it directly with [`RegistryConfig::new`].
#[derive(Clone, Debug, Deserialize)]
pub struct RegistryConfig {
    /// Path of the SQLite database file; created on first use.
    pub database_path: PathBuf,

    /// Word list for the banned-words request validator.
    #[serde(default)]
    pub banned_words: Vec<String>,
}

impl RegistryConfig {
    /// Configuration with an empty banned-word list.
    #[must_use]
    pub fn new(database_path: impl AsRef<Path>) -> Self {
        Self {
            database_path: database_path.as_ref().to_path_buf(),
            banned_words: Vec::new(),
        }
    }

    /// Build the banned-words validator from the configured list.
    #[must_use]
    pub fn banned_words_validator(&self) -> BannedWordsValidator {
        BannedWordsValidator::new(self.banned_words.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::Validator;

    #[test]
    fn deserializes_with_defaulted_word_list() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"database_path": "/tmp/vendstack.sqlite"}"#)
                .unwrap_or_else(|e| panic!("config should deserialize: {e}"));
        assert!(config.banned_words.is_empty());
    }

    #[test]
    fn configured_words_feed_the_validator() {
        let mut config = RegistryConfig::new("/tmp/vendstack.sqlite");
        config.banned_words = vec!["spam".to_string()];
        let validator = config.banned_words_validator();
        let data = [("content".to_string(), "SPAM here".to_string())]
            .into_iter()
            .collect();
        assert!(validator.validate(&data).is_some());
    }
}
