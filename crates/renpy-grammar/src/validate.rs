//! Validation routines for Tree-sitter grammars.
//!
//! This module performs structural checks over parsed [`Grammar`]
//! definitions before the loader derives symbol tables from them. Fatal
//! problems (undefined symbols, malformed rule nodes) are returned as a
//! [`ValidationError`]; suspicious but loadable constructs (unreachable
//! rules, mixed precedence levels) are collected into a [`ValidationReport`].

use crate::grammar::{Grammar, Rule, RuleType, RuleValue};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// A fatal validation failure: the grammar cannot back a usable handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The grammar defines no rules at all.
    #[error("grammar has no rules")]
    NoRules,

    /// The grammar name is not a valid identifier.
    #[error("invalid grammar name '{0}'")]
    InvalidName(String),

    /// A symbol is referenced but defined neither as a rule nor as an external.
    #[error("undefined symbol '{symbol}' referenced in {context}")]
    UndefinedSymbol {
        /// The missing symbol.
        symbol: String,
        /// Where the reference was found (e.g. `rule 'block'`).
        context: String,
    },

    /// A rule node lacks the payload its type requires.
    #[error("malformed {rule_type} node in {context}: {reason}")]
    Malformed {
        /// Canonical name of the offending node's type.
        rule_type: &'static str,
        /// Where the node was found.
        context: String,
        /// What is missing.
        reason: &'static str,
    },

    /// The derived symbol table does not fit 16-bit symbol ids.
    #[error("grammar defines {0} symbols, more than a symbol id can address")]
    TooManySymbols(usize),

    /// The grammar uses more distinct field names than 16-bit field ids can address.
    #[error("grammar defines {0} fields, more than a field id can address")]
    TooManyFields(usize),
}

/// A non-fatal finding about a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    /// The rule cannot be reached from any entry point.
    #[error("unreachable rule '{0}'")]
    UnreachableRule(String),

    /// The rule uses several distinct numeric precedence levels.
    #[error("rule '{rule}' has multiple precedence levels: {levels:?}")]
    MixedPrecedence {
        /// The rule in question.
        rule: String,
        /// The distinct levels, ascending.
        levels: Vec<i32>,
    },
}

/// The outcome of a successful validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Warnings, sorted so that output is deterministic.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// Returns `true` when no warnings were raised.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Performs semantic validation of a parsed [`Grammar`].
///
/// This function runs several consistency passes over the grammar:
///
/// - Checks the grammar name and that at least one rule exists.
/// - Checks that every rule node carries the fields its type requires.
/// - Checks that all referenced symbols are defined.
/// - Reports unreachable rules.
/// - Reports rules mixing precedence levels.
/// - Logs immediate left recursion.
///
/// # Errors
///
/// Returns a [`ValidationError`] if any structural rule violation is detected.
pub fn validate(grammar: &Grammar) -> Result<ValidationReport, ValidationError> {
    if grammar.rules.is_empty() {
        return Err(ValidationError::NoRules);
    }
    if !is_identifier(&grammar.name) {
        return Err(ValidationError::InvalidName(grammar.name.clone()));
    }

    check_well_formed(grammar)?;
    check_undefined_symbols(grammar)?;

    let mut warnings = check_unreachable_rules(grammar);
    warnings.extend(check_precedence(grammar));
    check_left_recursion(grammar);

    Ok(ValidationReport { warnings })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn sorted_rules(grammar: &Grammar) -> Vec<(&String, &Rule)> {
    let mut rules: Vec<_> = grammar.rules.iter().collect();
    rules.sort_unstable_by(|a, b| a.0.cmp(b.0));
    rules
}

fn check_well_formed(grammar: &Grammar) -> Result<(), ValidationError> {
    for (rule_name, rule) in sorted_rules(grammar) {
        check_rule_shape(rule, &format!("rule '{rule_name}'"))?;
    }
    for (i, extra) in grammar.extras.iter().flatten().enumerate() {
        check_rule_shape(extra, &format!("extras[{i}]"))?;
    }
    for (i, external) in grammar.externals.iter().flatten().enumerate() {
        check_rule_shape(external, &format!("externals[{i}]"))?;
    }
    Ok(())
}

fn check_rule_shape(rule: &Rule, context: &str) -> Result<(), ValidationError> {
    let malformed = |reason| ValidationError::Malformed {
        rule_type: rule.type_name(),
        context: context.to_string(),
        reason,
    };

    match rule.rule_type {
        RuleType::Blank => {}
        RuleType::String | RuleType::Pattern => {
            if !matches!(rule.value, Some(RuleValue::String(_))) {
                return Err(malformed("missing string value"));
            }
        }
        RuleType::Symbol => {
            if rule.name.as_deref().is_none_or(str::is_empty) {
                return Err(malformed("missing symbol name"));
            }
        }
        RuleType::Choice | RuleType::Seq => {
            if rule.members.is_empty() {
                return Err(malformed("no members"));
            }
        }
        RuleType::Repeat
        | RuleType::Repeat1
        | RuleType::Prec
        | RuleType::PrecLeft
        | RuleType::PrecRight
        | RuleType::PrecDynamic
        | RuleType::Token
        | RuleType::ImmediateToken => {}
        RuleType::Field => {
            if rule.name.as_deref().is_none_or(str::is_empty) {
                return Err(malformed("missing field name"));
            }
        }
        RuleType::Alias => {
            if rule.alias_value().is_none() {
                return Err(malformed("missing alias value"));
            }
        }
        RuleType::Reserved => {
            if rule.context_name.is_none() {
                return Err(malformed("missing reserved context name"));
            }
        }
    }

    if rule.rule_type.is_wrapper() && rule.content.is_none() {
        return Err(malformed("missing content"));
    }

    rule.children().try_for_each(|child| check_rule_shape(child, context))
}

fn check_undefined_symbols(grammar: &Grammar) -> Result<(), ValidationError> {
    let mut defined: HashSet<&str> = grammar.rules.keys().map(String::as_str).collect();
    defined.extend(grammar.external_names());

    let check_name = |name: &str, context: &dyn Fn() -> String| {
        if defined.contains(name) {
            Ok(())
        } else {
            Err(ValidationError::UndefinedSymbol {
                symbol: name.to_string(),
                context: context(),
            })
        }
    };
    let check_rule = |rule: &Rule, context: &dyn Fn() -> String| {
        let mut result: Result<(), ValidationError> = Ok(());
        rule.walk(&mut |r| {
            if result.is_ok() {
                if let Some(name) = r.symbol_name() {
                    result = check_name(name, context);
                }
            }
        });
        result
    };

    for (rule_name, rule) in sorted_rules(grammar) {
        check_rule(rule, &|| format!("rule '{rule_name}'"))?;
    }
    for extra in grammar.extras.iter().flatten() {
        check_rule(extra, &|| "extras".to_string())?;
    }
    for entry in grammar.precedences.iter().flatten().flatten() {
        check_rule(entry, &|| "precedences".to_string())?;
    }
    for (context_name, words) in grammar.reserved.iter().flatten() {
        for word in words {
            check_rule(word, &|| format!("reserved set '{context_name}'"))?;
        }
    }
    for name in grammar.conflicts.iter().flatten().flatten() {
        check_name(name.as_str(), &|| "conflicts".to_string())?;
    }
    for name in grammar.inline.iter().flatten() {
        check_name(name.as_str(), &|| "inline".to_string())?;
    }
    for name in grammar.supertypes.iter().flatten() {
        check_name(name.as_str(), &|| "supertypes".to_string())?;
    }
    if let Some(word) = &grammar.word {
        check_name(word.as_str(), &|| "word".to_string())?;
    }

    Ok(())
}

fn check_unreachable_rules(grammar: &Grammar) -> Vec<ValidationWarning> {
    let mut to_visit: Vec<&str> = Vec::new();
    to_visit.extend(grammar.start_rule());
    to_visit.extend(grammar.external_names());
    to_visit.extend(grammar.supertypes.iter().flatten().map(String::as_str));
    to_visit.extend(grammar.word.as_deref());
    for extra in grammar.extras.iter().flatten() {
        collect_referenced_symbols(extra, &mut to_visit);
    }

    let mut reachable = HashSet::new();
    while let Some(rule_name) = to_visit.pop() {
        if !reachable.insert(rule_name) {
            continue;
        }
        if let Some(rule) = grammar.rules.get(rule_name) {
            collect_referenced_symbols(rule, &mut to_visit);
        }
    }

    let inlined: HashSet<&str> = grammar
        .inline
        .iter()
        .flatten()
        .map(String::as_str)
        .collect();

    let unreachable: BTreeSet<&str> = grammar
        .rules
        .keys()
        .map(String::as_str)
        .filter(|name| !reachable.contains(name) && !inlined.contains(name))
        .collect();

    unreachable
        .into_iter()
        .map(|name| ValidationWarning::UnreachableRule(name.to_string()))
        .collect()
}

fn collect_referenced_symbols<'a>(rule: &'a Rule, symbols: &mut Vec<&'a str>) {
    rule.walk(&mut |r| symbols.extend(r.symbol_name()));
}

fn check_left_recursion(grammar: &Grammar) {
    for (rule_name, rule) in sorted_rules(grammar) {
        if has_immediate_left_recursion(rule, rule_name) {
            tracing::debug!(rule = %rule_name, "rule is left-recursive");
        }
    }
}

fn has_immediate_left_recursion(rule: &Rule, target: &str) -> bool {
    match rule.rule_type {
        RuleType::Symbol => rule.name.as_deref() == Some(target),

        RuleType::Seq => rule
            .members
            .first()
            .is_some_and(|first| has_immediate_left_recursion(first, target)),

        RuleType::Choice => rule
            .members
            .iter()
            .any(|member| has_immediate_left_recursion(member, target)),

        RuleType::Prec
        | RuleType::PrecLeft
        | RuleType::PrecRight
        | RuleType::PrecDynamic
        | RuleType::Field
        | RuleType::Alias
        | RuleType::Repeat
        | RuleType::Repeat1 => rule
            .content
            .as_deref()
            .is_some_and(|content| has_immediate_left_recursion(content, target)),

        _ => false,
    }
}

fn check_precedence(grammar: &Grammar) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for (rule_name, rule) in sorted_rules(grammar) {
        let mut levels = BTreeSet::new();
        rule.walk(&mut |r| levels.extend(r.precedence()));
        if levels.len() > 1 {
            warnings.push(ValidationWarning::MixedPrecedence {
                rule: rule_name.clone(),
                levels: levels.into_iter().collect(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse_grammar;

    fn grammar(json: &str) -> Grammar {
        parse_grammar(json).unwrap()
    }

    #[test]
    fn test_clean_grammar() {
        let g = grammar(
            r#"{
            "name": "calc",
            "rules": {
                "source_file": {"type": "REPEAT", "content": {"type": "SYMBOL", "name": "number"}},
                "number": {"type": "PATTERN", "value": "[0-9]+"}
            }
        }"#,
        );
        let report = validate(&g).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_undefined_symbol() {
        let g = grammar(
            r#"{
            "name": "calc",
            "rules": {
                "source_file": {"type": "SYMBOL", "name": "expression"}
            }
        }"#,
        );
        assert_eq!(
            validate(&g).unwrap_err(),
            ValidationError::UndefinedSymbol {
                symbol: "expression".to_string(),
                context: "rule 'source_file'".to_string(),
            }
        );
    }

    #[test]
    fn test_external_tokens_count_as_defined() {
        let g = grammar(
            r#"{
            "name": "indented",
            "rules": {
                "source_file": {"type": "SEQ", "members": [
                    {"type": "SYMBOL", "name": "_indent"},
                    {"type": "STRING", "value": "pass"},
                    {"type": "SYMBOL", "name": "_dedent"}
                ]}
            },
            "externals": [
                {"type": "SYMBOL", "name": "_indent"},
                {"type": "SYMBOL", "name": "_dedent"},
                {"type": "STRING", "value": "]"}
            ]
        }"#,
        );
        assert!(validate(&g).unwrap().is_clean());
    }

    #[test]
    fn test_undefined_conflict_member() {
        let g = grammar(
            r#"{
            "name": "calc",
            "rules": {"source_file": {"type": "BLANK"}},
            "conflicts": [["source_file", "statement"]]
        }"#,
        );
        assert!(matches!(
            validate(&g),
            Err(ValidationError::UndefinedSymbol { symbol, context })
                if symbol == "statement" && context == "conflicts"
        ));
    }

    #[test]
    fn test_malformed_nodes() {
        let g = grammar(
            r#"{
            "name": "calc",
            "rules": {"source_file": {"type": "REPEAT"}}
        }"#,
        );
        assert_eq!(
            validate(&g).unwrap_err(),
            ValidationError::Malformed {
                rule_type: "REPEAT",
                context: "rule 'source_file'".to_string(),
                reason: "missing content",
            }
        );

        let g = grammar(
            r#"{
            "name": "calc",
            "rules": {"source_file": {"type": "CHOICE", "members": [
                {"type": "STRING"}
            ]}}
        }"#,
        );
        assert!(matches!(
            validate(&g),
            Err(ValidationError::Malformed { rule_type: "STRING", .. })
        ));
    }

    #[test]
    fn test_name_and_rule_presence() {
        let g = grammar(r#"{"name": "calc", "rules": {}}"#);
        assert_eq!(validate(&g).unwrap_err(), ValidationError::NoRules);

        let g = grammar(r#"{"name": "ren py", "rules": {"source_file": {"type": "BLANK"}}}"#);
        assert_eq!(
            validate(&g).unwrap_err(),
            ValidationError::InvalidName("ren py".to_string())
        );
    }

    #[test]
    fn test_warnings() {
        let g = grammar(
            r##"{
            "name": "calc",
            "rules": {
                "source_file": {"type": "CHOICE", "members": [
                    {"type": "PREC", "value": 1, "content": {"type": "SYMBOL", "name": "number"}},
                    {"type": "PREC", "value": -1, "content": {"type": "SYMBOL", "name": "number"}}
                ]},
                "number": {"type": "PATTERN", "value": "[0-9]+"},
                "orphan": {"type": "STRING", "value": "?"},
                "comment": {"type": "PATTERN", "value": "#.*"},
                "_helper": {"type": "STRING", "value": "!"}
            },
            "extras": [{"type": "SYMBOL", "name": "comment"}],
            "inline": ["_helper"]
        }"##,
        );
        let report = validate(&g).unwrap();
        assert_eq!(
            report.warnings,
            [
                ValidationWarning::UnreachableRule("orphan".to_string()),
                ValidationWarning::MixedPrecedence {
                    rule: "source_file".to_string(),
                    levels: vec![-1, 1],
                },
            ]
        );
    }

    #[test]
    fn test_left_recursion_is_not_an_error() {
        let g = grammar(
            r#"{
            "name": "calc",
            "rules": {
                "source_file": {"type": "SYMBOL", "name": "expr"},
                "expr": {"type": "CHOICE", "members": [
                    {"type": "PREC_LEFT", "value": 1, "content": {"type": "SEQ", "members": [
                        {"type": "SYMBOL", "name": "expr"},
                        {"type": "STRING", "value": "+"},
                        {"type": "SYMBOL", "name": "expr"}
                    ]}},
                    {"type": "PATTERN", "value": "[0-9]+"}
                ]}
            }
        }"#,
        );
        let expr = g.rules.get("expr").unwrap();
        assert!(has_immediate_left_recursion(expr, "expr"));
        assert!(validate(&g).unwrap().is_clean());
    }
}
