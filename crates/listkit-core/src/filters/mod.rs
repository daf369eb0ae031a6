//! Filter specs: polymorphic descriptions of one filterable dimension each.
//!
//! A spec decides whether it renders at all (`has_output`), which
//! query-string keys it claims, how it narrows the plan, and how its UI
//! choices enumerate. Specs are built fresh per request from the immutable
//! registry plus the reconciled lookup parameters.

mod all_values;
mod boolean;
mod choices;
mod date;
mod registry;
mod related;
mod simple;


pub use all_values::AllValuesFilterSpec;
pub use boolean::BooleanFilterSpec;
pub use choices::ChoicesFilterSpec;
pub use date::DateFilterSpec;
pub use registry::{FieldPredicate, FilterCtor, FilterRegistry};
pub use related::RelatedFilterSpec;
pub use simple::{SimpleFilter, SimpleFilterSpec};

use crate::{
    error::LookupError,
    params::{ERROR_FLAG_VAR, LookupParams, PAGE_VAR, QueryParams},
    plan::{DataSource, ListPlan},
    schema::{ModelDef, Schema},
};
use time::Date;

///
/// FilterContext
///
/// Everything a spec constructor may consult. The current date is injected
/// here so date-bucket computation is deterministic per request.
///

pub struct FilterContext<'a> {
    pub schema: &'a Schema,
    pub model: &'a ModelDef,
    pub source: &'a dyn DataSource,
    pub params: &'a QueryParams,
    pub lookups: &'a LookupParams,
    pub today: Date,
}

///
/// FilterSpec
///

pub trait FilterSpec {
    /// Display label for the filter block.
    fn title(&self) -> &str;

    /// False when the filter would render no usable choice and must be
    /// excluded from the active filter list entirely.
    fn has_output(&self) -> bool;

    /// Query-string keys this spec owns, selected or not.
    fn expected_parameters(&self) -> Vec<String>;

    /// True when the request selected one of this filter's choices.
    fn is_active(&self) -> bool;

    /// Narrow the plan with this filter's claimed parameters.
    fn apply(&self, plan: &mut ListPlan) -> Result<(), LookupError>;

    /// Enumerate UI choices against the request's parameters.
    fn choices(&self, params: &QueryParams) -> Vec<FilterChoice>;

    /// True when narrowing joins through a to-many relation.
    fn spawns_duplicates(&self) -> bool {
        false
    }
}

///
/// FilterChoice
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilterChoice {
    pub label: String,
    pub selected: bool,
    /// Query string that applies this choice to the current request.
    pub query_string: String,
}

impl FilterChoice {
    #[must_use]
    pub fn new(label: impl Into<String>, selected: bool, query_string: String) -> Self {
        Self {
            label: label.into(),
            selected,
            query_string,
        }
    }
}

/// Base parameters for choice links: the request minus page number and error
/// flag, which never belong in generated links.
#[must_use]
pub(crate) fn choice_params(params: &QueryParams) -> QueryParams {
    params.without(&[PAGE_VAR, ERROR_FLAG_VAR])
}
