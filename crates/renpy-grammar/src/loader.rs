//! Turning an artifact source into a [`Language`].
//!
//! [`GrammarLoader::load_grammar`] reads the artifact, verifies its header,
//! parses and validates the embedded grammar and derives the handle's tables.
//! Any failure is reported as a [`GrammarLoadError`]; no partially built
//! handle ever escapes.

use std::io;
use std::sync::OnceLock;

use thiserror::Error;

use crate::artifact::{self, ArtifactError};
use crate::config::LoaderConfig;
use crate::grammar::{parse_grammar, GrammarError};
use crate::language::Language;
use crate::source::ArtifactSource;
use crate::validate::{validate, ValidationError, ValidationWarning};

/// Why a grammar could not be loaded.
#[derive(Debug, Error)]
pub enum GrammarLoadError {
    /// The artifact does not exist.
    #[error("grammar artifact not found: {0}")]
    Missing(String),

    /// The artifact exists but could not be read.
    #[error("failed to read grammar artifact {source_name}: {error}")]
    Io {
        /// Description of the artifact source.
        source_name: String,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// The artifact container is damaged or incompatible.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// The payload is not UTF-8.
    #[error("grammar payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The payload is not a grammar document.
    #[error(transparent)]
    Parse(#[from] GrammarError),

    /// The grammar failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Strict mode rejected a grammar that validated with warnings.
    #[error("strict mode rejected grammar with {} warning(s): {}", .0.len(), first_warning(.0))]
    Strict(Vec<ValidationWarning>),
}

fn first_warning(warnings: &[ValidationWarning]) -> String {
    warnings
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl GrammarLoadError {
    fn from_io(source_name: String, error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::NotFound {
            Self::Missing(source_name)
        } else {
            Self::Io { source_name, error }
        }
    }
}

/// Loads a grammar handle from an [`ArtifactSource`].
///
/// Unless caching is disabled in the [`LoaderConfig`], the first successful
/// load is kept and later calls return the same handle. Failed loads are not
/// cached.
#[derive(Debug)]
pub struct GrammarLoader<S> {
    source: S,
    config: LoaderConfig,
    cache: OnceLock<Language>,
}

impl<S: ArtifactSource> GrammarLoader<S> {
    /// Creates a loader with the default configuration.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_config(source, LoaderConfig::default())
    }

    /// Creates a loader with an explicit configuration.
    #[must_use]
    pub fn with_config(source: S, config: LoaderConfig) -> Self {
        Self {
            source,
            config,
            cache: OnceLock::new(),
        }
    }

    /// The artifact source this loader reads.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The loader's configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads the grammar and returns a handle to it.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarLoadError`] if the artifact is missing, unreadable,
    /// corrupted, built for an incompatible ABI, or holds an invalid grammar.
    pub fn load_grammar(&self) -> Result<Language, GrammarLoadError> {
        if self.config.disable_cache {
            return self.load_uncached();
        }
        if let Some(language) = self.cache.get() {
            tracing::trace!(grammar = language.name(), "grammar cache hit");
            return Ok(language.clone());
        }
        let language = self.load_uncached()?;
        // A concurrent first load may have won the race; hand out its handle.
        Ok(self.cache.get_or_init(|| language).clone())
    }

    fn load_uncached(&self) -> Result<Language, GrammarLoadError> {
        let source_name = self.source.describe();
        tracing::debug!(source = %source_name, strict = self.config.strict, "loading grammar");

        let bytes = self
            .source
            .read()
            .map_err(|e| GrammarLoadError::from_io(source_name, e))?;
        let artifact = artifact::decode(&bytes)?;
        let json = std::str::from_utf8(artifact.payload)?;
        let grammar = parse_grammar(json)?;

        let report = validate(&grammar)?;
        for warning in &report.warnings {
            tracing::warn!(grammar = %grammar.name, "{warning}");
        }
        if self.config.strict && !report.is_clean() {
            return Err(GrammarLoadError::Strict(report.warnings));
        }

        let language = Language::new(grammar, artifact.header.abi_version)?;
        tracing::debug!(
            grammar = language.name(),
            abi_version = language.abi_version(),
            symbols = language.symbol_count(),
            fields = language.field_count(),
            "grammar loaded"
        );
        Ok(language)
    }
}
