//! The grammar handle handed out by the loader.
//!
//! A [`Language`] owns a validated [`Grammar`] together with the symbol and
//! field tables derived from it. It is immutable once built and cheap to
//! clone, so any number of parsers on any number of threads can share one.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::grammar::{Grammar, Rule, RuleType};
use crate::validate::ValidationError;

/// Numeric identifier of a symbol within a [`Language`].
pub type SymbolId = u16;

/// Numeric identifier of a field within a [`Language`]. `0` means "no field".
pub type FieldId = u16;

/// Largest symbol table a [`Language`] can address: ids `0..=SymbolId::MAX`.
pub const MAX_SYMBOLS: usize = 1 << SymbolId::BITS;

/// Largest field table a [`Language`] can address. Id `0` is reserved.
pub const MAX_FIELDS: usize = (1 << FieldId::BITS) - 1;

/// How a symbol came to exist in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A named, visible grammar rule.
    Regular,
    /// A grammar rule whose name starts with `_`.
    Hidden,
    /// A token produced by the external scanner.
    External,
    /// A named alias that is not also a rule name.
    Alias,
    /// A string literal.
    Anonymous,
}

/// One entry in a [`Language`]'s symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// The node kind as it appears in syntax trees.
    pub name: String,
    /// Where the symbol came from.
    pub kind: SymbolKind,
}

impl Symbol {
    /// Returns `true` for named symbols (everything except string literals).
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.kind != SymbolKind::Anonymous
    }

    /// Returns `true` if nodes of this kind appear in syntax trees.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.is_named() || !self.name.starts_with('_')
    }
}

/// A loaded, validated grammar.
///
/// Obtained only through [`GrammarLoader::load_grammar`](crate::GrammarLoader::load_grammar)
/// or [`language`](crate::language), so every instance is structurally valid.
#[derive(Debug, Clone)]
pub struct Language {
    inner: Arc<LanguageInner>,
}

#[derive(Debug)]
struct LanguageInner {
    grammar: Grammar,
    abi_version: u16,
    start_rule: String,
    symbols: Vec<Symbol>,
    named_ids: HashMap<String, SymbolId>,
    anonymous_ids: HashMap<String, SymbolId>,
    fields: Vec<String>,
}

#[derive(Default)]
struct Literals<'a> {
    anonymous: BTreeSet<&'a str>,
    named_aliases: BTreeSet<&'a str>,
}

impl<'a> Literals<'a> {
    fn scan(&mut self, rule: &'a Rule) {
        match rule.rule_type {
            RuleType::String => self.anonymous.extend(rule.string_value()),
            // Literals inside a token are part of that token.
            RuleType::Token | RuleType::ImmediateToken => return,
            RuleType::Alias => {
                if let Some(alias) = rule.alias_value() {
                    if rule.named == Some(true) {
                        self.named_aliases.insert(alias);
                    } else {
                        self.anonymous.insert(alias);
                    }
                }
            }
            _ => {}
        }
        for child in rule.children() {
            self.scan(child);
        }
    }
}

impl Language {
    /// Derives the symbol and field tables for an already validated grammar.
    pub(crate) fn new(grammar: Grammar, abi_version: u16) -> Result<Self, ValidationError> {
        let start_rule = grammar
            .start_rule()
            .ok_or(ValidationError::NoRules)?
            .to_string();

        let externals: Vec<&str> = grammar.external_names();
        let mut rule_names: Vec<&str> = grammar.rules.keys().map(String::as_str).collect();
        rule_names.sort_unstable();

        let mut literals = Literals::default();
        let all_rules = grammar
            .rules
            .values()
            .chain(grammar.extras.iter().flatten())
            .chain(grammar.externals.iter().flatten());
        for rule in all_rules {
            literals.scan(rule);
        }

        let mut symbols = Vec::new();
        for name in &rule_names {
            let kind = if externals.contains(name) {
                SymbolKind::External
            } else if name.starts_with('_') {
                SymbolKind::Hidden
            } else {
                SymbolKind::Regular
            };
            symbols.push((*name, kind));
        }
        for name in &externals {
            if !grammar.rules.contains_key(*name) {
                symbols.push((*name, SymbolKind::External));
            }
        }
        for alias in &literals.named_aliases {
            if !symbols.iter().any(|(name, _)| name == alias) {
                symbols.push((*alias, SymbolKind::Alias));
            }
        }
        for literal in &literals.anonymous {
            symbols.push((*literal, SymbolKind::Anonymous));
        }

        if symbols.len() > MAX_SYMBOLS {
            return Err(ValidationError::TooManySymbols(symbols.len()));
        }

        let mut named_ids = HashMap::new();
        let mut anonymous_ids = HashMap::new();
        for (id, (name, kind)) in (0..=SymbolId::MAX).zip(&symbols) {
            let ids = if *kind == SymbolKind::Anonymous {
                &mut anonymous_ids
            } else {
                &mut named_ids
            };
            ids.entry((*name).to_string()).or_insert(id);
        }

        let symbols = symbols
            .into_iter()
            .map(|(name, kind)| Symbol {
                name: name.to_string(),
                kind,
            })
            .collect();
        let fields: Vec<String> = grammar
            .field_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        if fields.len() > MAX_FIELDS {
            return Err(ValidationError::TooManyFields(fields.len()));
        }

        Ok(Self {
            inner: Arc::new(LanguageInner {
                grammar,
                abi_version,
                start_rule,
                symbols,
                named_ids,
                anonymous_ids,
                fields,
            }),
        })
    }

    /// The grammar's name, e.g. `"renpy"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.grammar.name
    }

    /// ABI version recorded in the artifact this handle was loaded from.
    #[must_use]
    pub fn abi_version(&self) -> u16 {
        self.inner.abi_version
    }

    /// The validated grammar definition.
    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        &self.inner.grammar
    }

    /// The entry-point rule.
    #[must_use]
    pub fn start_rule(&self) -> &str {
        &self.inner.start_rule
    }

    /// Number of symbols in the symbol table.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.inner.symbols.len()
    }

    /// Looks up a symbol by id.
    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.inner.symbols.get(usize::from(id))
    }

    /// Iterates over the symbol table in id order.
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        (0..=SymbolId::MAX).zip(&self.inner.symbols)
    }

    /// Returns the node kind for a symbol id.
    #[must_use]
    pub fn node_kind_for_id(&self, id: SymbolId) -> Option<&str> {
        self.symbol(id).map(|symbol| symbol.name.as_str())
    }

    /// Returns the id of the named or anonymous node kind `kind`.
    #[must_use]
    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<SymbolId> {
        let ids = if named {
            &self.inner.named_ids
        } else {
            &self.inner.anonymous_ids
        };
        ids.get(kind).copied()
    }

    /// Returns `true` if `id` names a named symbol.
    #[must_use]
    pub fn node_kind_is_named(&self, id: SymbolId) -> bool {
        self.symbol(id).is_some_and(Symbol::is_named)
    }

    /// Number of distinct field names.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.inner.fields.len()
    }

    /// Returns the field name for a 1-based field id.
    #[must_use]
    pub fn field_name_for_id(&self, id: FieldId) -> Option<&str> {
        let index = usize::from(id).checked_sub(1)?;
        self.inner.fields.get(index).map(String::as_str)
    }

    /// Returns the 1-based id of a field name.
    #[must_use]
    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        (1..=FieldId::MAX)
            .zip(&self.inner.fields)
            .find_map(|(id, field)| (field == name).then_some(id))
    }

    /// Returns `true` if both handles share the same underlying grammar.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }
}
