//! Core runtime for ListKit: query-string reconciliation, filter specs,
//! ordering resolution, search, pagination, and the list-plan assembler,
//! with the ergonomics exported via the `prelude`.
#![warn(unreachable_pub)]

pub mod error;
pub mod filters;
pub mod list;
pub mod lookup;
pub mod memory;
pub mod ordering;
pub mod pagination;
pub mod params;
pub mod plan;
pub mod schema;
pub mod search;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// Errors, the in-memory source, and low-level helpers stay behind their
/// modules.
///

pub mod prelude {
    pub use crate::{
        filters::{FilterRegistry, FilterSpec, SimpleFilter},
        list::{FilterBinding, ListAssembler, ListConfig, ListState},
        lookup::{Lookup, LookupOp, LookupValue},
        ordering::{ColumnDef, OrderDirection},
        params::QueryParams,
        plan::{DataSource, ListPlan},
        schema::{FieldDef, FieldKind, ModelDef, RelationDef, RelationKind, Schema},
        search::SearchConfig,
    };
}
