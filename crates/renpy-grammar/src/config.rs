//! Loader configuration.

use facet::Facet;
use thiserror::Error;

/// Options controlling how a [`GrammarLoader`](crate::GrammarLoader) behaves.
///
/// Every field defaults to `false`, so `{}` is a valid configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Facet)]
pub struct LoaderConfig {
    /// Reject grammars that validate with warnings.
    #[facet(default)]
    pub strict: bool,

    /// Re-read and re-validate the artifact on every load instead of caching
    /// the first handle.
    #[facet(default)]
    pub disable_cache: bool,
}

/// Errors raised while reading a configuration document.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The document was not valid JSON or did not match [`LoaderConfig`].
    #[error("invalid loader configuration: {0}")]
    Parse(String),
}

impl LoaderConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        facet_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Sets strict mode.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enables or disables handle caching.
    #[must_use]
    pub fn cached(mut self, cached: bool) -> Self {
        self.disable_cache = !cached;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(LoaderConfig::from_json("{}").unwrap(), LoaderConfig::default());
    }

    #[test]
    fn test_fields_are_read() {
        let config = LoaderConfig::from_json(r#"{"strict": true, "disable_cache": true}"#).unwrap();
        assert!(config.strict);
        assert!(config.disable_cache);
    }

    #[test]
    fn test_builder() {
        let config = LoaderConfig::default().strict(true).cached(false);
        assert_eq!(
            config,
            LoaderConfig {
                strict: true,
                disable_cache: true,
            }
        );
    }

    #[test]
    fn test_malformed_document() {
        let err = LoaderConfig::from_json(r#"{"strict": "#).unwrap_err();
        assert!(err.to_string().starts_with("invalid loader configuration"));
    }
}
