//! Core structures and parsing logic for Tree-sitter grammars.
//!
//! This module defines the internal representation of a grammar as parsed from
//! Tree-sitter's JSON format. It uses [`facet_json`] for deserialization and
//! provides accessors for the parts of the grammar the loader derives tables
//! from.

use facet::Facet;
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

mod rules;

pub use rules::{Rule, RuleType, RuleValue};

/// Rule name used as the entry point whenever a grammar defines it.
pub const CONVENTIONAL_START_RULE: &str = "source_file";

/// Represents a full Tree-sitter grammar definition.
///
/// This structure directly mirrors the serialized JSON format produced by
/// `tree-sitter generate` (`src/grammar.json`). It captures the complete rule
/// set along with auxiliary metadata such as precedences, conflicts, and
/// external tokens.
///
/// See <https://tree-sitter.github.io/tree-sitter/assets/schemas/grammar.schema.json>
#[derive(Debug, Clone, Facet)]
pub struct Grammar {
    /// Optional `$schema` field from the JSON, typically used for schema
    /// validation or editor integration.
    #[facet(rename = "$schema")]
    #[facet(default)]
    pub schema: Option<String>,

    /// The short name of the grammar (e.g. `"renpy"`).
    pub name: String,

    /// Optional name of a base grammar that this one inherits from.
    #[facet(default)]
    pub inherits: Option<String>,

    /// Map of all rule identifiers to their corresponding definitions.
    pub rules: HashMap<String, Rule>,

    /// "Extras" that may appear between other tokens, such as whitespace or comments.
    #[facet(default)]
    pub extras: Option<Vec<Rule>>,

    /// Tokens produced by an external scanner.
    #[facet(default)]
    pub externals: Option<Vec<Rule>>,

    /// Names of rules that should be inlined into other rules.
    #[facet(default)]
    pub inline: Option<Vec<String>>,

    /// Ordered precedence groups; each entry is a `STRING` or `SYMBOL` rule.
    #[facet(default)]
    pub precedences: Option<Vec<Vec<Rule>>>,

    /// Explicit conflict groups expected during parsing.
    #[facet(default)]
    pub conflicts: Option<Vec<Vec<String>>>,

    /// Context-specific reserved word definitions.
    #[facet(default)]
    pub reserved: Option<HashMap<String, Vec<Rule>>>,

    /// The rule used to identify keyword tokens.
    #[facet(default)]
    pub word: Option<String>,

    /// A list of node supertypes, grouping related syntactic forms.
    #[facet(default)]
    pub supertypes: Option<Vec<String>>,
}

/// Errors raised while parsing a grammar document.
#[derive(Debug, Clone, Error)]
pub enum GrammarError {
    /// The input JSON was syntactically invalid or structurally mismatched.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

/// Parse a JSON grammar definition into a strongly typed [`Grammar`] structure.
///
/// # Errors
///
/// Returns [`GrammarError::JsonParse`] if the provided string is not valid JSON
/// or fails schema deserialization.
pub fn parse_grammar(json: &str) -> Result<Grammar, GrammarError> {
    facet_json::from_str(json).map_err(|e| GrammarError::JsonParse(e.to_string()))
}

impl Grammar {
    /// Returns the entry-point rule.
    ///
    /// The JSON object order is not retained, so the start rule is
    /// [`CONVENTIONAL_START_RULE`] when defined, otherwise the alphabetically
    /// first visible rule no other rule references, otherwise the
    /// alphabetically first rule.
    #[must_use]
    pub fn start_rule(&self) -> Option<&str> {
        if self.rules.contains_key(CONVENTIONAL_START_RULE) {
            return Some(CONVENTIONAL_START_RULE);
        }

        let mut referenced = HashSet::new();
        for rule in self.rules.values() {
            rule.walk(&mut |r| {
                if let Some(name) = r.symbol_name() {
                    referenced.insert(name);
                }
            });
        }

        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
            .iter()
            .copied()
            .find(|name| !name.starts_with('_') && !referenced.contains(name))
            .or_else(|| names.first().copied())
    }

    /// Returns the names of externally scanned tokens that are symbols, in
    /// declaration order.
    #[must_use]
    pub fn external_names(&self) -> Vec<&str> {
        self.externals
            .iter()
            .flatten()
            .filter_map(Rule::symbol_name)
            .collect()
    }

    /// Returns every distinct `FIELD` name used by the grammar, sorted.
    #[must_use]
    pub fn field_names(&self) -> BTreeSet<&str> {
        let mut fields = BTreeSet::new();
        for rule in self.rules.values() {
            rule.walk(&mut |r| {
                if r.rule_type == RuleType::Field {
                    if let Some(name) = r.name.as_deref() {
                        fields.insert(name);
                    }
                }
            });
        }
        fields
    }
}
