//! ListKit: list-view query construction for schema-described data.
//!
//! ## Crate layout
//! - `core`: reconciliation, filter specs, ordering, search, pagination, and
//!   the plan assembler.
//!
//! The `prelude` module mirrors the surface an embedding application uses to
//! configure and serve a list view.

pub use listkit_core as core;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::error::{ConfigError, LookupError};

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
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
