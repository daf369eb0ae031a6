//! Pure plan-layer data types; must not embed assembly semantics or
//! validation. The plan is the complete outbound contract handed to the
//! data-access collaborator.

use crate::{lookup::ConstraintSet, ordering::OrderingSpec, search::SearchClause};
use serde::{Deserialize, Serialize};

///
/// ListPlan
///
/// Fully assembled query for one list-view request: conjunctive constraints,
/// optional free-text search, resolved ordering, a distinct-rows directive,
/// and relation pre-fetch hints.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ListPlan {
    pub model: String,
    pub constraints: ConstraintSet,
    pub search: Option<SearchClause>,
    pub ordering: OrderingSpec,
    /// De-duplicate rows by primary key. Set whenever a to-many join may
    /// have fanned out rows; a correctness requirement, not an optimization.
    pub distinct: bool,
    /// Relation fields worth pre-fetching alongside the rows.
    pub select_related: Vec<String>,
}

impl ListPlan {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, lookup: crate::lookup::Lookup) {
        self.constraints.push(lookup);
    }
}


///
/// DataSource
///
/// Narrow synchronous port to the data-access layer. Calls may perform I/O
/// internally; cancellation and timeout policy belong to the implementor.
///

pub trait DataSource {
    /// Count rows matching the plan's constraints and search, honoring the
    /// distinct directive.
    fn count(&self, plan: &ListPlan) -> u64;

    /// Distinct observed values of one column, in the column's natural
    /// order. `None` entries represent stored nulls. The optional constraint
    /// scopes the scan (limit-choices on a traversed relation).
    fn distinct_values(
        &self,
        model: &str,
        field: &str,
        constraint: Option<&crate::lookup::Lookup>,
    ) -> Vec<Option<String>>;

    /// `(primary key, display label)` pairs for a related model's rows,
    /// honoring an optional limit-choices constraint.
    fn related_choices(
        &self,
        model: &str,
        constraint: Option<&crate::lookup::Lookup>,
    ) -> Vec<(String, String)>;
}
