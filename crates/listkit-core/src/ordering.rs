//! Deterministic display-ordering resolution.
//!
//! Ordering is resolved in increasing specificity: declared ordering, then a
//! per-request override, then a totality check that appends a primary-key
//! tiebreaker whenever the ordering cannot guarantee a total order. A total
//! order is what keeps pagination stable across identical requests.

use crate::{
    params::{ORDER_VAR, QueryParams},
    schema::ModelDef,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub const fn is_descending(self) -> bool {
        matches!(self, Self::Desc)
    }
}

///
/// ColumnDef
///
/// One rendered list column. Sortability is an explicit capability: a column
/// with no `sort_field` is skipped by the ordering override parser rather
/// than rejected.
///

#[derive(Clone, Debug)]
pub struct ColumnDef {
    pub name: String,
    pub label: String,
    pub sort_field: Option<String>,
}

impl ColumnDef {
    /// Unsortable column (computed or presentation-only).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();

        Self {
            label: name.clone(),
            name,
            sort_field: None,
        }
    }

    /// Column backed directly by a model field, sortable by that field.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();

        Self {
            label: name.clone(),
            sort_field: Some(name.clone()),
            name,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>) -> Self {
        self.sort_field = Some(field.into());
        self
    }
}

///
/// OrderingSpec
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OrderingSpec {
    fields: Vec<(String, OrderDirection)>,
}

impl OrderingSpec {
    #[must_use]
    pub const fn new(fields: Vec<(String, OrderDirection)>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, OrderDirection)] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Append a sort key unless the field is already present.
    pub fn push(&mut self, field: impl Into<String>, direction: OrderDirection) {
        let field = field.into();
        if self.fields.iter().any(|(name, _)| *name == field) {
            return;
        }
        self.fields.push((field, direction));
    }
}

///
/// SortIndicator
///
/// Per-column sort marker handed to the presentation layer.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SortIndicator {
    /// Index into the rendered column list.
    pub column: usize,
    pub direction: OrderDirection,
    /// 1-based position of this key within the resolved ordering.
    pub priority: usize,
}

/// Resolve the effective ordering for one request.
///
/// Precedence: explicit per-request tokens (`o=`), else the configured
/// ordering, else the model's declared default. The result is always made
/// total before use.
#[must_use]
pub fn resolve_ordering(
    model: &ModelDef,
    configured: &[(String, OrderDirection)],
    columns: &[ColumnDef],
    params: &QueryParams,
) -> OrderingSpec {
    let mut spec = OrderingSpec::default();

    if let Some(raw) = params.get(ORDER_VAR) {
        // The request override discards the base ordering entirely.
        for (field, direction) in parse_order_tokens(raw, columns) {
            spec.push(model.canonical_field_name(&field).to_string(), direction);
        }
    } else {
        let base = if configured.is_empty() {
            &model.default_ordering
        } else {
            configured
        };
        for (field, direction) in base {
            spec.push(model.canonical_field_name(field).to_string(), *direction);
        }
    }

    ensure_total(model, &mut spec);

    spec
}

/// Parse the dot-separated column-index token list of an ordering override.
///
/// Malformed tokens (non-integer, out-of-range) and tokens naming unsortable
/// columns are silently skipped. That skip-silently behavior is deliberate
/// and scoped to ordering tokens only; other parameter classes reject.
fn parse_order_tokens(raw: &str, columns: &[ColumnDef]) -> Vec<(String, OrderDirection)> {
    let mut out = Vec::new();

    for token in raw.split('.') {
        let (direction, index_text) = match token.strip_prefix('-') {
            Some(rest) => (OrderDirection::Desc, rest),
            None => (OrderDirection::Asc, token),
        };

        let Ok(index) = index_text.parse::<usize>() else {
            continue;
        };
        let Some(column) = columns.get(index) else {
            continue;
        };
        let Some(sort_field) = &column.sort_field else {
            continue;
        };

        out.push((sort_field.clone(), direction));
    }

    out
}

/// Guarantee the ordering assigns a unique rank to every row.
///
/// Totality holds when a single unique non-nullable field (the primary key
/// included) appears anywhere in the ordering, or when some composite-unique
/// constraint with no nullable member has all of its fields contained in the
/// ordering. Otherwise a descending primary-key tiebreaker is appended.
fn ensure_total(model: &ModelDef, spec: &mut OrderingSpec) {
    let mut seen = BTreeSet::new();

    for (name, _) in spec.fields() {
        // Paths into related models never guarantee totality on their own.
        let Some(field) = model.field_or_pk(name) else {
            continue;
        };

        if field.unique && !field.nullable {
            return;
        }
        seen.insert(model.canonical_field_name(name));
    }

    let covered = model.unique_together.iter().any(|group| {
        !group.is_empty()
            && group.iter().all(|name| {
                let non_null = model.field(name).is_some_and(|field| !field.nullable);
                non_null && seen.contains(name.as_str())
            })
    });
    if covered {
        return;
    }

    spec.push(model.primary_key.clone(), OrderDirection::Desc);
}

/// Map resolved ordering fields back onto rendered columns.
///
/// When several columns share one underlying sort field, the leftmost column
/// wins; column numbering, not field identity, decides which header carries
/// the marker.
#[must_use]
pub fn ordering_field_columns(spec: &OrderingSpec, columns: &[ColumnDef]) -> Vec<SortIndicator> {
    let mut out = Vec::new();

    for (position, (field, direction)) in spec.fields().iter().enumerate() {
        let matched = columns
            .iter()
            .position(|column| column.sort_field.as_deref() == Some(field.as_str()));

        if let Some(column) = matched {
            out.push(SortIndicator {
                column,
                direction: *direction,
                priority: position + 1,
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldKind, RelationDef, RelationKind};

    fn entry_model() -> ModelDef {
        ModelDef::new(
            "entry",
            "id",
            vec![
                FieldDef::new("id", FieldKind::Key).unique(),
                FieldDef::new("name", FieldKind::Text),
                FieldDef::new("slug", FieldKind::Text).unique(),
                FieldDef::new("parent", FieldKind::Key)
                    .nullable()
                    .with_relation(RelationDef::new("section", RelationKind::ManyToOne)),
                FieldDef::new("year", FieldKind::Int),
                FieldDef::new("serial", FieldKind::Int),
            ],
        )
        .with_unique_together(vec![vec!["year".into(), "serial".into()]])
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::field("name"),
            ColumnDef::field("parent"),
            ColumnDef::new("preview"),
        ]
    }

    #[test]
    fn default_ordering_gets_pk_tiebreaker() {
        let model = entry_model().with_default_ordering(vec![("name".into(), OrderDirection::Asc)]);
        let spec = resolve_ordering(&model, &[], &columns(), &QueryParams::new());

        assert_eq!(
            spec.fields(),
            &[
                ("name".to_string(), OrderDirection::Asc),
                ("id".to_string(), OrderDirection::Desc),
            ]
        );
    }

    #[test]
    fn unique_non_null_field_is_already_total() {
        let model = entry_model();
        let spec = resolve_ordering(
            &model,
            &[("slug".to_string(), OrderDirection::Asc)],
            &columns(),
            &QueryParams::new(),
        );

        assert_eq!(spec.fields(), &[("slug".to_string(), OrderDirection::Asc)]);
    }

    #[test]
    fn nullable_unique_field_is_not_total() {
        let mut model = entry_model();
        model.fields.push(FieldDef::new("code", FieldKind::Text).unique().nullable());

        let spec = resolve_ordering(
            &model,
            &[("code".to_string(), OrderDirection::Asc)],
            &columns(),
            &QueryParams::new(),
        );

        assert_eq!(
            spec.fields(),
            &[
                ("code".to_string(), OrderDirection::Asc),
                ("id".to_string(), OrderDirection::Desc),
            ]
        );
    }

    #[test]
    fn covered_unique_together_is_total() {
        let model = entry_model();
        let spec = resolve_ordering(
            &model,
            &[
                ("year".to_string(), OrderDirection::Asc),
                ("serial".to_string(), OrderDirection::Desc),
            ],
            &columns(),
            &QueryParams::new(),
        );

        assert_eq!(
            spec.fields(),
            &[
                ("year".to_string(), OrderDirection::Asc),
                ("serial".to_string(), OrderDirection::Desc),
            ]
        );
    }

    #[test]
    fn request_override_discards_base_ordering() {
        let model = entry_model().with_default_ordering(vec![("name".into(), OrderDirection::Asc)]);
        let params = QueryParams::from_pairs([(ORDER_VAR, "-1")]);
        let spec = resolve_ordering(&model, &[], &columns(), &params);

        // Descending on column 1 (parent, not unique) plus the tiebreaker.
        assert_eq!(
            spec.fields(),
            &[
                ("parent".to_string(), OrderDirection::Desc),
                ("id".to_string(), OrderDirection::Desc),
            ]
        );
    }

    #[test]
    fn malformed_tokens_are_silently_skipped() {
        let model = entry_model();
        let params = QueryParams::from_pairs([(ORDER_VAR, "x.-9.2.0")]);
        let spec = resolve_ordering(&model, &[], &columns(), &params);

        // "x" is not an index, 9 is out of range, column 2 is unsortable;
        // only column 0 survives.
        assert_eq!(
            spec.fields(),
            &[
                ("name".to_string(), OrderDirection::Asc),
                ("id".to_string(), OrderDirection::Desc),
            ]
        );
    }

    #[test]
    fn pk_alias_resolves_to_primary_key() {
        let model = entry_model();
        let spec = resolve_ordering(
            &model,
            &[("pk".to_string(), OrderDirection::Asc)],
            &columns(),
            &QueryParams::new(),
        );

        assert_eq!(spec.fields(), &[("id".to_string(), OrderDirection::Asc)]);
    }

    #[test]
    fn first_matching_column_carries_the_indicator() {
        let cols = vec![
            ColumnDef::new("badge").with_sort("name"),
            ColumnDef::field("name"),
        ];
        let spec = OrderingSpec::new(vec![("name".to_string(), OrderDirection::Desc)]);
        let indicators = ordering_field_columns(&spec, &cols);

        assert_eq!(indicators.len(), 1);
        assert_eq!(indicators[0].column, 0);
        assert_eq!(indicators[0].direction, OrderDirection::Desc);
        assert_eq!(indicators[0].priority, 1);
    }
}
