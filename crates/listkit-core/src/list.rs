//! The list-view assembler: combines filter specs, reconciled lookup
//! parameters, search, ordering, and pagination into one validated plan plus
//! the per-request display state.
//!
//! All working state is built fresh per request and discarded with it; the
//! schema, registry, and configuration are read-only collaborators.

use crate::{
    error::{ConfigError, LookupError},
    filters::{FilterChoice, FilterContext, FilterRegistry, FilterSpec, SimpleFilter,
        SimpleFilterSpec},
    lookup::{Lookup, coerce_value, parse_lookup_key},
    ordering::{ColumnDef, OrderDirection, SortIndicator, ordering_field_columns,
        resolve_ordering},
    pagination::{PageBounds, PageInfo, Paginator},
    params::{ALL_VAR, PAGE_VAR, QueryParams, SEARCH_VAR, reconcile},
    plan::{DataSource, ListPlan},
    schema::{ModelDef, RelationKind, Schema, resolve_path},
    search::{SearchConfig, build_search},
};
use std::sync::Arc;
use time::Date;

///
/// FilterBinding
///
/// One configured filterable dimension: either a field path resolved through
/// the registry, or a fully custom simple filter.
///

#[derive(Clone)]
pub enum FilterBinding {
    Field(String),
    Simple(Arc<dyn SimpleFilter>),
}

impl FilterBinding {
    #[must_use]
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    #[must_use]
    pub fn simple(filter: impl SimpleFilter + 'static) -> Self {
        Self::Simple(Arc::new(filter))
    }
}

///
/// ListConfig
///
/// Static per-view configuration. Built once at startup; assembler
/// construction validates it against the schema so misconfiguration fails
/// loudly before any request is served.
///

pub struct ListConfig {
    pub model: String,
    pub columns: Vec<ColumnDef>,
    pub filters: Vec<FilterBinding>,
    pub search: SearchConfig,
    pub ordering: Vec<(String, OrderDirection)>,
    pub per_page: u64,
    /// Upper bound on result size for the show-all escape hatch.
    pub max_show_all: u64,
    /// Whether to compute the unfiltered table count (expensive on large
    /// tables).
    pub show_full_result_count: bool,
    /// Explicit relation pre-fetch hints; when empty, many-to-one column
    /// relations are hinted automatically.
    pub select_related: Vec<String>,
    allow_lookup: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl ListConfig {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            search: SearchConfig::default(),
            ordering: Vec::new(),
            per_page: 100,
            max_show_all: 200,
            show_full_result_count: true,
            select_related: Vec::new(),
            allow_lookup: Arc::new(|_| true),
        }
    }

    #[must_use]
    pub fn with_columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: Vec<FilterBinding>) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    #[must_use]
    pub fn with_ordering(mut self, ordering: Vec<(String, OrderDirection)>) -> Self {
        self.ordering = ordering;
        self
    }

    #[must_use]
    pub const fn with_per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page;
        self
    }

    #[must_use]
    pub const fn with_max_show_all(mut self, max: u64) -> Self {
        self.max_show_all = max;
        self
    }

    #[must_use]
    pub const fn without_full_result_count(mut self) -> Self {
        self.show_full_result_count = false;
        self
    }

    #[must_use]
    pub fn with_select_related(mut self, fields: Vec<String>) -> Self {
        self.select_related = fields;
        self
    }

    /// Install the allow-list predicate consulted for every non-reserved
    /// query-string key.
    #[must_use]
    pub fn with_allow_lookup(mut self, allow: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.allow_lookup = Arc::new(allow);
        self
    }
}

///
/// ListAssembler
///

pub struct ListAssembler<'a> {
    schema: &'a Schema,
    registry: &'a FilterRegistry,
    config: &'a ListConfig,
    model: &'a ModelDef,
}

impl<'a> ListAssembler<'a> {
    /// Validate the configuration against the schema and registry.
    pub fn new(
        schema: &'a Schema,
        registry: &'a FilterRegistry,
        config: &'a ListConfig,
    ) -> Result<Self, ConfigError> {
        let model = schema.expect_model(&config.model)?;

        for binding in &config.filters {
            match binding {
                FilterBinding::Field(path) => {
                    let resolved = resolve_path(schema, model, path).map_err(|source| {
                        ConfigError::InvalidPath {
                            model: model.name.clone(),
                            path: path.clone(),
                            source,
                        }
                    })?;
                    if !registry.matches(resolved.field) {
                        return Err(ConfigError::NoMatchingFilter {
                            model: model.name.clone(),
                            field: resolved.field.name.clone(),
                        });
                    }
                }
                FilterBinding::Simple(filter) => {
                    let title = filter.title();
                    let parameter_name = filter.parameter_name();
                    if title.is_empty() {
                        return Err(ConfigError::MissingFilterTitle {
                            context: if parameter_name.is_empty() {
                                "simple filter".to_string()
                            } else {
                                parameter_name
                            },
                        });
                    }
                    if parameter_name.is_empty() {
                        return Err(ConfigError::MissingParameterName { title });
                    }
                }
            }
        }

        for path in config.search.paths() {
            resolve_path(schema, model, path).map_err(|source| ConfigError::InvalidPath {
                model: model.name.clone(),
                path: path.to_string(),
                source,
            })?;
        }

        for field in &config.select_related {
            if model.field(field).is_none() {
                return Err(ConfigError::UnknownField {
                    model: model.name.clone(),
                    field: field.clone(),
                });
            }
        }

        Ok(Self {
            schema,
            registry,
            config,
            model,
        })
    }

    /// Assemble the plan and display state for one request.
    ///
    /// `today` anchors relative date buckets; callers supply it from their
    /// clock so assembly itself stays deterministic.
    pub fn assemble(
        &self,
        source: &dyn DataSource,
        params: &QueryParams,
        today: Date,
    ) -> Result<ListState, LookupError> {
        let allow = Arc::clone(&self.config.allow_lookup);
        let lookups = reconcile(params, |key| allow(key))?;

        let ctx = FilterContext {
            schema: self.schema,
            model: self.model,
            source,
            params,
            lookups: &lookups,
            today,
        };

        // Build every configured spec; claimed keys come from all of them,
        // selected or not, so a no-output filter still owns its parameters.
        let mut specs: Vec<Box<dyn FilterSpec>> = Vec::new();
        let mut claimed: Vec<String> = Vec::new();

        for binding in &self.config.filters {
            let spec: Box<dyn FilterSpec> = match binding {
                FilterBinding::Field(path) => {
                    let Ok(resolved) = resolve_path(self.schema, self.model, path) else {
                        continue; // validated at construction
                    };
                    let title = resolved.field.label.clone();
                    match self.registry.build(&ctx, resolved.field, path, &title) {
                        Ok(spec) => spec,
                        Err(_) => continue, // validated at construction
                    }
                }
                FilterBinding::Simple(filter) => {
                    match SimpleFilterSpec::new(Arc::clone(filter), &ctx) {
                        Ok(spec) => Box::new(spec),
                        Err(_) => continue, // validated at construction
                    }
                }
            };

            claimed.extend(spec.expected_parameters());
            specs.push(spec);
        }

        // A spec with no output is excluded entirely, not rendered disabled.
        specs.retain(|spec| spec.has_output());

        let mut plan = ListPlan::new(&self.config.model);
        let mut may_have_duplicates = false;
        let mut has_active_filters = false;

        for spec in &specs {
            spec.apply(&mut plan)?;
            if spec.is_active() {
                has_active_filters = true;
                may_have_duplicates |= spec.spawns_duplicates();
            }
        }

        // Leftover validated lookups join the conjunction.
        for (key, value) in lookups.except(&claimed) {
            let (path, op) = parse_lookup_key(key);
            let resolved = resolve_path(self.schema, self.model, path)
                .map_err(|err| LookupError::bad_path(key, err))?;
            let value = coerce_value(resolved.field, op, value.clone()).map_err(|reason| {
                LookupError::BadParameters {
                    key: key.to_string(),
                    reason,
                }
            })?;

            plan.add(Lookup::new(path, op, value));
            may_have_duplicates |= resolved.spans_to_many;
        }

        // Free-text search; invalid input is recovered, not fatal.
        let mut search_messages = Vec::new();
        if let Some(query) = params.get(SEARCH_VAR) {
            match build_search(&self.config.search, self.schema, self.model, query) {
                Ok(Some(built)) => {
                    may_have_duplicates |= built.spawns_duplicates;
                    plan.search = Some(built.clause);
                }
                Ok(None) => {}
                Err(err) => search_messages.push(err.to_string()),
            }
        }

        // De-duplication is a correctness requirement once a to-many join
        // may have fanned out rows.
        plan.distinct = may_have_duplicates;

        plan.select_related = if self.config.select_related.is_empty() {
            self.auto_select_related()
        } else {
            self.config.select_related.clone()
        };

        let ordering = resolve_ordering(
            self.model,
            &self.config.ordering,
            &self.config.columns,
            params,
        );
        let sort_indicators = ordering_field_columns(&ordering, &self.config.columns);
        plan.ordering = ordering;

        let page = self.paginate(source, &plan, params)?;

        // Clear-all removes only filter-owned keys; hand-entered lookups,
        // search text, and popup markers survive.
        let removed: Vec<&str> = claimed.iter().map(String::as_str).collect();
        let clear_all_query = crate::filters::choice_params(params)
            .without(&removed)
            .to_query_string();

        Ok(ListState {
            plan,
            filters: specs,
            sort_indicators,
            page,
            may_have_duplicates,
            has_active_filters,
            clear_all_query,
            search_messages,
            params: params.clone(),
        })
    }

    /// Default pre-fetch hints: every rendered column backed by a
    /// many-to-one relation.
    fn auto_select_related(&self) -> Vec<String> {
        self.config
            .columns
            .iter()
            .filter(|column| {
                self.model.field(&column.name).is_some_and(|field| {
                    field
                        .relation
                        .as_ref()
                        .is_some_and(|relation| relation.kind == RelationKind::ManyToOne)
                })
            })
            .map(|column| column.name.clone())
            .collect()
    }

    fn paginate(
        &self,
        source: &dyn DataSource,
        plan: &ListPlan,
        params: &QueryParams,
    ) -> Result<PageInfo, LookupError> {
        let result_count = source.count(plan);
        let filtered = !plan.constraints.is_empty() || plan.search.is_some();

        let (full_count, count_truncated) = if !filtered {
            (Some(result_count), false)
        } else if self.config.show_full_result_count {
            (Some(source.count(&ListPlan::new(&self.config.model))), false)
        } else {
            (None, true)
        };

        let paginator = Paginator::new(result_count, self.config.per_page);
        let can_show_all = result_count <= self.config.max_show_all;
        let show_all = can_show_all && params.contains_key(ALL_VAR);

        let bounds = if show_all {
            PageBounds {
                number: 1,
                start: 0,
                end: result_count,
            }
        } else {
            let number = match params.get(PAGE_VAR) {
                Some(raw) => raw.parse::<u64>().map_err(|_| LookupError::InvalidPage {
                    page: raw.to_string(),
                    pages: paginator.num_pages(),
                })?,
                None => 1,
            };
            paginator.page(number)?
        };

        Ok(PageInfo {
            number: bounds.number,
            per_page: self.config.per_page,
            total_pages: paginator.num_pages(),
            result_count,
            full_count,
            count_truncated,
            show_all,
            can_show_all,
            multi_page: paginator.num_pages() > 1,
            bounds,
        })
    }
}

///
/// ListState
///
/// The orchestrator's working set for one request: the outbound plan plus
/// everything the presentation layer needs. Discarded at request end.
///

pub struct ListState {
    pub plan: ListPlan,
    pub filters: Vec<Box<dyn FilterSpec>>,
    pub sort_indicators: Vec<SortIndicator>,
    pub page: PageInfo,
    /// A to-many join may have fanned out rows; the plan carries the
    /// matching distinct directive.
    pub may_have_duplicates: bool,
    pub has_active_filters: bool,
    /// Query string with every filter-owned key removed and every
    /// non-filter key retained.
    pub clear_all_query: String,
    /// Recovered validation messages (search input), for display.
    pub search_messages: Vec<String>,
    params: QueryParams,
}

impl ListState {
    /// Enumerate each active filter's title and UI choices.
    #[must_use]
    pub fn filter_choices(&self) -> Vec<(String, Vec<FilterChoice>)> {
        self.filters
            .iter()
            .map(|spec| (spec.title().to_string(), spec.choices(&self.params)))
            .collect()
    }

    /// The request parameters this state was assembled from.
    #[must_use]
    pub const fn params(&self) -> &QueryParams {
        &self.params
    }
}
