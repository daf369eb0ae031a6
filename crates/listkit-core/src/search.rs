//! Free-text search clause construction.
//!
//! Search terms are conjunctive; within one term the configured field paths
//! are disjunctive alternatives. Invalid search input never fails the
//! request: it is reported as a recoverable message and the search ignored.

use crate::{
    lookup::{Lookup, LookupOp, LookupValue},
    schema::{ModelDef, Schema, resolve_path},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// SearchConfig
///
/// Ordered search-field paths. A path may carry an operator prefix:
/// `^` starts-with, `=` case-insensitive exact, `@` full-text; the default
/// is case-insensitive containment.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchConfig {
    pub fields: Vec<String>,
}

impl SearchConfig {
    #[must_use]
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Bare field paths with operator prefixes stripped.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        self.fields.iter().map(|field| strip_prefix(field).1).collect()
    }
}

fn strip_prefix(field: &str) -> (LookupOp, &str) {
    if let Some(tail) = field.strip_prefix('^') {
        (LookupOp::IStartsWith, tail)
    } else if let Some(tail) = field.strip_prefix('=') {
        (LookupOp::IExact, tail)
    } else if let Some(tail) = field.strip_prefix('@') {
        (LookupOp::Search, tail)
    } else {
        (LookupOp::IContains, field)
    }
}

///
/// SearchClause
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SearchClause {
    /// Conjunctive terms; every term must match.
    pub terms: Vec<SearchTerm>,
}

///
/// SearchTerm
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SearchTerm {
    /// Disjunctive alternatives; any one suffices.
    pub alternatives: Vec<Lookup>,
}

///
/// SearchValidationError
///
/// Recovered locally: the caller reports the message and proceeds with the
/// search ignored.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("search input contains unsupported characters")]
pub struct SearchValidationError;

///
/// BuiltSearch
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuiltSearch {
    pub clause: SearchClause,
    /// True when any searched path traverses a to-many relation.
    pub spawns_duplicates: bool,
}

/// Build a search clause from raw query text.
///
/// Returns `Ok(None)` when the query is blank or no search fields are
/// configured. Terms are split on whitespace with double-quoted phrases kept
/// intact.
pub fn build_search(
    config: &SearchConfig,
    schema: &Schema,
    model: &ModelDef,
    query: &str,
) -> Result<Option<BuiltSearch>, SearchValidationError> {
    if config.is_empty() || query.trim().is_empty() {
        return Ok(None);
    }
    if query.contains('\0') {
        return Err(SearchValidationError);
    }

    let mut spawns_duplicates = false;
    let mut terms = Vec::new();

    for term in split_terms(query) {
        let mut alternatives = Vec::new();

        for field in &config.fields {
            let (op, path) = strip_prefix(field);

            // Search paths are validated at assembler construction; an
            // unresolvable path here means the schema changed under us, so
            // skip the alternative rather than fail the request.
            let Ok(resolved) = resolve_path(schema, model, path) else {
                continue;
            };
            spawns_duplicates |= resolved.spans_to_many;

            alternatives.push(Lookup::new(path, op, LookupValue::Text(term.clone())));
        }

        if !alternatives.is_empty() {
            terms.push(SearchTerm { alternatives });
        }
    }

    if terms.is_empty() {
        return Ok(None);
    }

    Ok(Some(BuiltSearch {
        clause: SearchClause { terms },
        spawns_duplicates,
    }))
}

/// Split on whitespace, keeping double-quoted phrases as single terms.
fn split_terms(query: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in query.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
            }
            ch if ch.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            }
            ch => current.push(ch),
        }
    }
    if !current.is_empty() {
        terms.push(current);
    }

    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldKind, RelationDef, RelationKind};

    fn schema() -> Schema {
        Schema::new(vec![
            ModelDef::new(
                "entry",
                "id",
                vec![
                    FieldDef::new("id", FieldKind::Key).unique(),
                    FieldDef::new("name", FieldKind::Text),
                    FieldDef::new("tags", FieldKind::Key)
                        .with_relation(RelationDef::new("tag", RelationKind::ManyToMany)),
                ],
            ),
            ModelDef::new(
                "tag",
                "id",
                vec![
                    FieldDef::new("id", FieldKind::Key).unique(),
                    FieldDef::new("label", FieldKind::Text),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn blank_query_builds_nothing() {
        let schema = schema();
        let model = schema.model("entry").unwrap();
        let config = SearchConfig::new(["name"]);

        assert_eq!(build_search(&config, &schema, model, "   "), Ok(None));
        assert_eq!(
            build_search(&SearchConfig::default(), &schema, model, "x"),
            Ok(None)
        );
    }

    #[test]
    fn terms_are_conjunctive_fields_disjunctive() {
        let schema = schema();
        let model = schema.model("entry").unwrap();
        let config = SearchConfig::new(["name", "^tags__label"]);

        let built = build_search(&config, &schema, model, "ice age")
            .unwrap()
            .unwrap();

        assert_eq!(built.clause.terms.len(), 2);
        let first = &built.clause.terms[0];
        assert_eq!(first.alternatives.len(), 2);
        assert_eq!(first.alternatives[0].op, LookupOp::IContains);
        assert_eq!(first.alternatives[1].op, LookupOp::IStartsWith);
        assert_eq!(first.alternatives[1].path, "tags__label");
    }

    #[test]
    fn to_many_search_path_spawns_duplicates() {
        let schema = schema();
        let model = schema.model("entry").unwrap();

        let flat = build_search(&SearchConfig::new(["name"]), &schema, model, "x")
            .unwrap()
            .unwrap();
        assert!(!flat.spawns_duplicates);

        let joined = build_search(&SearchConfig::new(["tags__label"]), &schema, model, "x")
            .unwrap()
            .unwrap();
        assert!(joined.spawns_duplicates);
    }

    #[test]
    fn nul_byte_is_a_validation_error() {
        let schema = schema();
        let model = schema.model("entry").unwrap();
        let config = SearchConfig::new(["name"]);

        assert_eq!(
            build_search(&config, &schema, model, "bad\0input"),
            Err(SearchValidationError)
        );
    }

    #[test]
    fn quoted_phrases_stay_whole() {
        assert_eq!(
            split_terms(r#"one "two three" four"#),
            vec!["one".to_string(), "two three".into(), "four".into()]
        );
    }
}
