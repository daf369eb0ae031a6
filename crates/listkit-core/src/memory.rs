//! In-memory [`DataSource`] over flat string-valued rows. Intended for tests
//! and demos; a production backend would translate the plan into its own
//! query language instead of interpreting it row by row.
//!
//! Joined columns are stored denormalized under their full lookup path
//! (`author__name`), and to-many fan-out is modeled as repeated rows sharing
//! a key, which the distinct directive then collapses.

use crate::{
    lookup::{Lookup, LookupOp, LookupValue, parse_date},
    plan::{DataSource, ListPlan},
    search::SearchClause,
};
use std::collections::{BTreeMap, BTreeSet};

///
/// Row
///
/// One flat record: column path to optional textual value. A missing column
/// reads as null.
///

#[derive(Clone, Debug, Default)]
pub struct Row(BTreeMap<String, Option<String>>);

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(column.into(), Some(value.into()));
        self
    }

    #[must_use]
    pub fn set_null(mut self, column: impl Into<String>) -> Self {
        self.0.insert(column.into(), None);
        self
    }

    fn cell(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(|value| value.as_deref())
    }
}

struct MemoryTable {
    key: String,
    label: String,
    rows: Vec<Row>,
}

///
/// MemorySource
///

#[derive(Default)]
pub struct MemorySource {
    tables: BTreeMap<String, MemoryTable>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table with its key column and the column used as display
    /// label for related choices.
    pub fn add_table(
        &mut self,
        model: impl Into<String>,
        key: impl Into<String>,
        label: impl Into<String>,
    ) {
        self.tables.insert(
            model.into(),
            MemoryTable {
                key: key.into(),
                label: label.into(),
                rows: Vec::new(),
            },
        );
    }

    /// Append a row; the table must have been registered.
    pub fn push_row(&mut self, model: &str, row: Row) {
        if let Some(table) = self.tables.get_mut(model) {
            table.rows.push(row);
        }
    }

    fn matching_rows<'a>(&'a self, plan: &'a ListPlan) -> Vec<&'a Row> {
        let Some(table) = self.tables.get(&plan.model) else {
            return Vec::new();
        };

        table
            .rows
            .iter()
            .filter(|row| {
                plan.constraints.iter().all(|lookup| row_matches(row, lookup))
                    && plan
                        .search
                        .as_ref()
                        .is_none_or(|clause| search_matches(row, clause))
            })
            .collect()
    }
}

impl DataSource for MemorySource {
    fn count(&self, plan: &ListPlan) -> u64 {
        let rows = self.matching_rows(plan);

        if plan.distinct {
            let Some(table) = self.tables.get(&plan.model) else {
                return 0;
            };
            let keys: BTreeSet<Option<&str>> =
                rows.iter().map(|row| row.cell(&table.key)).collect();

            keys.len() as u64
        } else {
            rows.len() as u64
        }
    }

    fn distinct_values(
        &self,
        model: &str,
        field: &str,
        constraint: Option<&Lookup>,
    ) -> Vec<Option<String>> {
        let Some(table) = self.tables.get(model) else {
            return Vec::new();
        };

        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for row in &table.rows {
            if constraint.is_some_and(|lookup| !row_matches(row, lookup)) {
                continue;
            }
            let value = row.cell(field).map(str::to_string);
            if seen.insert(value.clone()) {
                out.push(value);
            }
        }

        out
    }

    fn related_choices(&self, model: &str, constraint: Option<&Lookup>) -> Vec<(String, String)> {
        let Some(table) = self.tables.get(model) else {
            return Vec::new();
        };

        table
            .rows
            .iter()
            .filter(|row| constraint.is_none_or(|lookup| row_matches(row, lookup)))
            .filter_map(|row| {
                let key = row.cell(&table.key)?;
                let label = row.cell(&table.label).unwrap_or(key);

                Some((key.to_string(), label.to_string()))
            })
            .collect()
    }
}

fn row_matches(row: &Row, lookup: &Lookup) -> bool {
    let cell = row.cell(&lookup.path);

    match (lookup.op, &lookup.value) {
        (LookupOp::IsNull, LookupValue::Bool(wants_null)) => cell.is_none() == *wants_null,
        (LookupOp::In, LookupValue::TextList(values)) => {
            cell.is_some_and(|text| values.iter().any(|value| value == text))
        }
        (LookupOp::Exact, value) => cell.is_some_and(|text| exact_matches(text, value)),
        (LookupOp::IExact, LookupValue::Text(value)) => {
            cell.is_some_and(|text| text.eq_ignore_ascii_case(value))
        }
        (LookupOp::Contains, LookupValue::Text(value)) => {
            cell.is_some_and(|text| text.contains(value.as_str()))
        }
        (LookupOp::IContains | LookupOp::Search, LookupValue::Text(value)) => {
            cell.is_some_and(|text| {
                text.to_ascii_lowercase()
                    .contains(&value.to_ascii_lowercase())
            })
        }
        (LookupOp::StartsWith, LookupValue::Text(value)) => {
            cell.is_some_and(|text| text.starts_with(value.as_str()))
        }
        (LookupOp::IStartsWith, LookupValue::Text(value)) => cell.is_some_and(|text| {
            text.to_ascii_lowercase()
                .starts_with(&value.to_ascii_lowercase())
        }),
        (LookupOp::Gt | LookupOp::Gte | LookupOp::Lt | LookupOp::Lte, value) => {
            cell.is_some_and(|text| ordered_matches(text, lookup.op, value))
        }
        (LookupOp::Year, LookupValue::Int(year)) => cell
            .and_then(parse_date)
            .is_some_and(|date| i64::from(date.year()) == *year),
        (LookupOp::Month, LookupValue::Int(month)) => cell
            .and_then(parse_date)
            .is_some_and(|date| i64::from(u8::from(date.month())) == *month),
        (LookupOp::Day, LookupValue::Int(day)) => cell
            .and_then(parse_date)
            .is_some_and(|date| i64::from(date.day()) == *day),
        _ => false,
    }
}

fn exact_matches(text: &str, value: &LookupValue) -> bool {
    match value {
        LookupValue::Text(expected) => text == expected,
        LookupValue::Bool(true) => matches!(text, "true" | "True" | "1"),
        LookupValue::Bool(false) => matches!(text, "false" | "False" | "0"),
        LookupValue::Int(expected) => text.parse::<i64>() == Ok(*expected),
        LookupValue::Date(expected) => parse_date(text) == Some(*expected),
        LookupValue::TextList(_) => false,
    }
}

/// Range comparison: numeric when both sides parse, then dates, then plain
/// lexicographic text.
fn ordered_matches(text: &str, op: LookupOp, value: &LookupValue) -> bool {
    use std::cmp::Ordering;

    let ordering = match value {
        LookupValue::Int(expected) => match text.parse::<i64>() {
            Ok(actual) => actual.cmp(expected),
            Err(_) => return false,
        },
        LookupValue::Date(expected) => match parse_date(text) {
            Some(actual) => actual.cmp(expected),
            None => return false,
        },
        LookupValue::Text(expected) => match (text.parse::<i64>(), expected.parse::<i64>()) {
            (Ok(actual), Ok(wanted)) => actual.cmp(&wanted),
            _ => text.cmp(expected.as_str()),
        },
        LookupValue::Bool(_) | LookupValue::TextList(_) => return false,
    };

    match op {
        LookupOp::Gt => ordering == Ordering::Greater,
        LookupOp::Gte => ordering != Ordering::Less,
        LookupOp::Lt => ordering == Ordering::Less,
        LookupOp::Lte => ordering != Ordering::Greater,
        _ => false,
    }
}

fn search_matches(row: &Row, clause: &SearchClause) -> bool {
    clause.terms.iter().all(|term| {
        term.alternatives
            .iter()
            .any(|lookup| row_matches(row, lookup))
    })
}
