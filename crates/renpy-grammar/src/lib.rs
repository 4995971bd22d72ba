//! Loader and validator for the Ren'Py tree-sitter grammar.
//!
//! The generated `grammar.json` is wrapped into a versioned, checksummed
//! artifact at build time. [`language`] loads that bundled artifact into a
//! [`Language`] handle; [`GrammarLoader`] does the same for any other
//! [`ArtifactSource`].
//!
//! ```
//! let language = renpy_grammar::language().expect("Error loading Renpy grammar");
//! assert_eq!(language.name(), "renpy");
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

use std::sync::LazyLock;

/// The binary container around a generated grammar.
///
/// Artifacts carry a magic marker, the generator's ABI version and a
/// checksum so that stale or damaged grammars are rejected before parsing.
pub mod artifact;

/// Loader configuration.
pub mod config;

/// Core structures and parsing logic for Tree-sitter grammars.
///
/// This module defines how the loader understands the declarative shape of a
/// language: the grammar itself.
pub mod grammar;

/// The immutable grammar handle shared by parsers.
pub mod language;

/// Turning an artifact source into a [`Language`].
pub mod loader;

/// Where a loader reads its artifact from.
pub mod source;

/// Grammar validation and consistency checking utilities.
///
/// Validation protects the derived tables from malformed grammars, so a
/// handle that loads is a handle that can be used.
pub mod validate;

pub use artifact::{ArtifactError, ABI_VERSION, MIN_COMPATIBLE_ABI_VERSION};
pub use config::{ConfigError, LoaderConfig};
pub use grammar::{parse_grammar, Grammar, GrammarError, Rule, RuleType};
pub use language::{FieldId, Language, Symbol, SymbolId, SymbolKind, MAX_FIELDS, MAX_SYMBOLS};
pub use loader::{GrammarLoadError, GrammarLoader};
pub use source::{ArtifactSource, BytesArtifact, FileArtifact, StaticArtifact};
pub use validate::{validate, ValidationError, ValidationReport, ValidationWarning};

/// The generated Ren'Py grammar this crate bundles.
pub const GRAMMAR_JSON: &str = include_str!("grammar.json");

/// The bundled Ren'Py grammar artifact, built from [`GRAMMAR_JSON`].
pub static BUNDLED_ARTIFACT: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/renpy.grammar"));

static BUNDLED_LOADER: LazyLock<GrammarLoader<StaticArtifact>> = LazyLock::new(bundled_loader);

/// Returns a fresh loader over the bundled artifact.
#[must_use]
pub fn bundled_loader() -> GrammarLoader<StaticArtifact> {
    GrammarLoader::new(StaticArtifact(BUNDLED_ARTIFACT))
}

/// Loads the bundled Ren'Py grammar.
///
/// The handle is cached for the life of the process, so repeated calls are
/// cheap and return the same grammar.
///
/// # Errors
///
/// Returns a [`GrammarLoadError`] if the bundled artifact is damaged or was
/// built for an incompatible ABI.
pub fn language() -> Result<Language, GrammarLoadError> {
    BUNDLED_LOADER.load_grammar()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_load_grammar() {
        let language = language().expect("Error loading Renpy grammar");
        assert_eq!(language.name(), "renpy");
    }

    #[test]
    fn test_bundled_artifact_wraps_grammar_json() {
        let artifact = artifact::decode(BUNDLED_ARTIFACT).unwrap();
        assert_eq!(artifact.payload, GRAMMAR_JSON.as_bytes());
        assert_eq!(artifact.header.abi_version, ABI_VERSION);
    }
}
