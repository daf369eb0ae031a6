//! Pure lookup vocabulary: the field-path/operator/value triples handed to
//! the data-access layer. This layer contains no schema validation or
//! execution semantics; interpretation happens in later passes.

use crate::{
    error::BadLookupReason,
    schema::{FieldDef, FieldKind},
};
use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

/// Separator between path segments and the trailing operator suffix.
pub const LOOKUP_SEP: &str = "__";

///
/// LookupOp
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupOp {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    In,
    IsNull,
    Gt,
    Gte,
    Lt,
    Lte,
    Year,
    Month,
    Day,
    Search,
}

impl LookupOp {
    /// Parse one trailing path segment as an operator suffix.
    #[must_use]
    pub fn from_suffix(segment: &str) -> Option<Self> {
        let op = match segment {
            "exact" => Self::Exact,
            "iexact" => Self::IExact,
            "contains" => Self::Contains,
            "icontains" => Self::IContains,
            "startswith" => Self::StartsWith,
            "istartswith" => Self::IStartsWith,
            "in" => Self::In,
            "isnull" => Self::IsNull,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "year" => Self::Year,
            "month" => Self::Month,
            "day" => Self::Day,
            "search" => Self::Search,
            _ => return None,
        };

        Some(op)
    }

    /// Canonical suffix as it appears in query-string keys.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::IExact => "iexact",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::StartsWith => "startswith",
            Self::IStartsWith => "istartswith",
            Self::In => "in",
            Self::IsNull => "isnull",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Search => "search",
        }
    }
}

///
/// LookupValue
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum LookupValue {
    Text(String),
    TextList(Vec<String>),
    Bool(bool),
    Int(i64),
    Date(Date),
}

impl LookupValue {
    /// Borrow the textual payload when this value is `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Return the boolean payload when this value is `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

///
/// Lookup
///
/// One conjunctive constraint understood by the data-access layer.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Lookup {
    pub path: String,
    pub op: LookupOp,
    pub value: LookupValue,
}

impl Lookup {
    #[must_use]
    pub fn new(path: impl Into<String>, op: LookupOp, value: LookupValue) -> Self {
        Self {
            path: path.into(),
            op,
            value,
        }
    }

    #[must_use]
    pub fn exact(path: impl Into<String>, value: LookupValue) -> Self {
        Self::new(path, LookupOp::Exact, value)
    }

    #[must_use]
    pub fn is_null(path: impl Into<String>, value: bool) -> Self {
        Self::new(path, LookupOp::IsNull, LookupValue::Bool(value))
    }

    /// Render the query-string key this lookup corresponds to.
    ///
    /// `Exact` renders as the bare path; every other operator appends its
    /// suffix.
    #[must_use]
    pub fn key(&self) -> String {
        match self.op {
            LookupOp::Exact => self.path.clone(),
            op => format!("{}{LOOKUP_SEP}{}", self.path, op.suffix()),
        }
    }
}

///
/// ConstraintSet
///
/// Ordered conjunction of lookups. Order is preserved for diagnostics only;
/// members commute.
///

#[derive(
    Clone,
    Debug,
    Default,
    Deserialize,
    Eq,
    PartialEq,
    Serialize,
    derive_more::Deref,
    derive_more::IntoIterator,
)]
pub struct ConstraintSet(#[into_iterator(owned, ref)] Vec<Lookup>);

impl ConstraintSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, lookup: Lookup) {
        self.0.push(lookup);
    }

    pub fn extend(&mut self, lookups: impl IntoIterator<Item = Lookup>) {
        self.0.extend(lookups);
    }
}

/// Split a raw query-string key into `(field path, operator)`.
///
/// A trailing segment that names an operator is consumed as the operator;
/// anything else leaves the whole key as the path with an implicit `Exact`.
#[must_use]
pub fn parse_lookup_key(key: &str) -> (&str, LookupOp) {
    if let Some((path, suffix)) = key.rsplit_once(LOOKUP_SEP)
        && !path.is_empty()
        && let Some(op) = LookupOp::from_suffix(suffix)
    {
        return (path, op);
    }

    (key, LookupOp::Exact)
}

const ISO_DATE: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Render a date in the `YYYY-MM-DD` form used in query strings.
#[must_use]
pub fn format_date(date: Date) -> String {
    date.format(&ISO_DATE).unwrap_or_default()
}

/// Parse a `YYYY-MM-DD` date from query-string text.
#[must_use]
pub fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text, &ISO_DATE).ok()
}

/// Coerce a textual lookup value against the terminal field's declared kind.
///
/// Operators that imply their own value shape (`isnull`, `year`, `month`,
/// `day`) are checked against that shape instead of the field kind. Textual
/// operators pass through untouched; the data-access layer owns any further
/// interpretation.
pub fn coerce_value(
    field: &FieldDef,
    op: LookupOp,
    value: LookupValue,
) -> Result<LookupValue, BadLookupReason> {
    match op {
        LookupOp::IsNull => match value {
            LookupValue::Bool(_) => Ok(value),
            other => Err(bad_value("boolean", &other)),
        },
        LookupOp::Year | LookupOp::Month | LookupOp::Day => coerce_int(value),
        LookupOp::In => match value {
            LookupValue::TextList(_) => Ok(value),
            LookupValue::Text(text) => Ok(LookupValue::TextList(
                text.split(',').map(str::to_string).collect(),
            )),
            other => Err(bad_value("comma-separated list", &other)),
        },
        LookupOp::Contains
        | LookupOp::IContains
        | LookupOp::StartsWith
        | LookupOp::IStartsWith
        | LookupOp::IExact
        | LookupOp::Search => Ok(value),
        LookupOp::Exact | LookupOp::Gt | LookupOp::Gte | LookupOp::Lt | LookupOp::Lte => {
            coerce_for_kind(field.kind, value)
        }
    }
}

fn coerce_for_kind(kind: FieldKind, value: LookupValue) -> Result<LookupValue, BadLookupReason> {
    let LookupValue::Text(text) = &value else {
        return Ok(value);
    };

    match kind {
        FieldKind::Bool => match text.as_str() {
            "1" | "true" | "True" => Ok(LookupValue::Bool(true)),
            "0" | "false" | "False" => Ok(LookupValue::Bool(false)),
            other => Err(BadLookupReason::BadValue {
                expected: "boolean",
                found: other.to_string(),
            }),
        },
        FieldKind::Int => coerce_int(value),
        FieldKind::Date => parse_date(text).map(LookupValue::Date).ok_or_else(|| {
            BadLookupReason::BadValue {
                expected: "date",
                found: text.clone(),
            }
        }),
        FieldKind::Text | FieldKind::Float | FieldKind::DateTime | FieldKind::Key => Ok(value),
    }
}

fn coerce_int(value: LookupValue) -> Result<LookupValue, BadLookupReason> {
    match value {
        LookupValue::Int(_) => Ok(value),
        LookupValue::Text(text) => text
            .parse::<i64>()
            .map(LookupValue::Int)
            .map_err(|_| BadLookupReason::BadValue {
                expected: "integer",
                found: text,
            }),
        other => Err(bad_value("integer", &other)),
    }
}

fn bad_value(expected: &'static str, found: &LookupValue) -> BadLookupReason {
    BadLookupReason::BadValue {
        expected,
        found: format!("{found:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn lookup_key_splits_operator_suffix() {
        assert_eq!(parse_lookup_key("is_staff__exact"), ("is_staff", LookupOp::Exact));
        assert_eq!(parse_lookup_key("created__year"), ("created", LookupOp::Year));
        assert_eq!(parse_lookup_key("parent__name"), ("parent__name", LookupOp::Exact));
        assert_eq!(parse_lookup_key("name"), ("name", LookupOp::Exact));
    }

    #[test]
    fn lookup_key_never_consumes_the_whole_key() {
        // "__in" alone has an empty path; treat the key as an opaque path.
        assert_eq!(parse_lookup_key("__in"), ("__in", LookupOp::Exact));
    }

    #[test]
    fn exact_lookup_renders_bare_key() {
        let lookup = Lookup::exact("name", LookupValue::Text("ice".into()));
        assert_eq!(lookup.key(), "name");

        let lookup = Lookup::is_null("parent", true);
        assert_eq!(lookup.key(), "parent__isnull");
    }

    #[test]
    fn date_round_trips_iso_form() {
        let day = date!(2024 - 03 - 15);
        assert_eq!(format_date(day), "2024-03-15");
        assert_eq!(parse_date("2024-03-15"), Some(day));
        assert_eq!(parse_date("not-a-date"), None);
    }

    #[test]
    fn year_coercion_requires_integer() {
        let field = FieldDef::new("created", FieldKind::Date);

        let ok = coerce_value(&field, LookupOp::Year, LookupValue::Text("2024".into()));
        assert_eq!(ok, Ok(LookupValue::Int(2024)));

        let err = coerce_value(&field, LookupOp::Year, LookupValue::Text("20x4".into()));
        assert!(matches!(err, Err(BadLookupReason::BadValue { expected: "integer", .. })));
    }

    #[test]
    fn bool_field_coerces_exact_text() {
        let field = FieldDef::new("is_staff", FieldKind::Bool);

        let ok = coerce_value(&field, LookupOp::Exact, LookupValue::Text("0".into()));
        assert_eq!(ok, Ok(LookupValue::Bool(false)));

        let err = coerce_value(&field, LookupOp::Exact, LookupValue::Text("maybe".into()));
        assert!(err.is_err());
    }
}
