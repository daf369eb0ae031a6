use crate::{
    error::{ConfigError, LookupError},
    filters::{FilterChoice, FilterContext, FilterSpec, choice_params},
    params::QueryParams,
    plan::ListPlan,
};
use std::sync::Arc;

///
/// SimpleFilter
///
/// User-supplied filter unrelated to any single model field. The
/// implementation owns both the lookup choices and the narrowing rule.
///

pub trait SimpleFilter: Send + Sync {
    /// Display label. Empty is a configuration error.
    fn title(&self) -> String;

    /// The one query-string key this filter owns. Empty is a configuration
    /// error.
    fn parameter_name(&self) -> String;

    /// `(value, label)` choice pairs, in display order.
    fn lookups(&self, ctx: &FilterContext<'_>) -> Vec<(String, String)>;

    /// Narrow the plan for a selected value.
    fn narrow(&self, value: &str, plan: &mut ListPlan) -> Result<(), LookupError>;

    /// True when narrowing joins through a to-many relation.
    fn spawns_duplicates(&self) -> bool {
        false
    }
}

///
/// SimpleFilterSpec
///
/// Adapter binding a [`SimpleFilter`] into the spec protocol. Construction
/// validates the title/parameter-name invariants, so a misconfigured filter
/// fails at startup rather than mid-request.
///

pub struct SimpleFilterSpec {
    inner: Arc<dyn SimpleFilter>,
    title: String,
    parameter_name: String,
    lookup_choices: Vec<(String, String)>,
    value: Option<String>,
}

impl SimpleFilterSpec {
    pub fn new(inner: Arc<dyn SimpleFilter>, ctx: &FilterContext<'_>) -> Result<Self, ConfigError> {
        let title = inner.title();
        let parameter_name = inner.parameter_name();

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

        let lookup_choices = inner.lookups(ctx);
        let value = ctx.params.get(&parameter_name).map(str::to_string);

        Ok(Self {
            inner,
            title,
            parameter_name,
            lookup_choices,
            value,
        })
    }
}

impl FilterSpec for SimpleFilterSpec {
    fn title(&self) -> &str {
        &self.title
    }

    fn has_output(&self) -> bool {
        !self.lookup_choices.is_empty()
    }

    fn expected_parameters(&self) -> Vec<String> {
        vec![self.parameter_name.clone()]
    }

    fn is_active(&self) -> bool {
        self.value.is_some()
    }

    fn apply(&self, plan: &mut ListPlan) -> Result<(), LookupError> {
        match &self.value {
            Some(value) => self.inner.narrow(value, plan),
            None => Ok(()),
        }
    }

    fn choices(&self, params: &QueryParams) -> Vec<FilterChoice> {
        let base = choice_params(params);
        let own: [&str; 1] = [&self.parameter_name];
        let mut out = vec![FilterChoice::new(
            "All",
            self.value.is_none(),
            base.without(&own).to_query_string(),
        )];

        for (value, label) in &self.lookup_choices {
            out.push(FilterChoice::new(
                label.as_str(),
                self.value.as_deref() == Some(value.as_str()),
                base.without(&own)
                    .with([(self.parameter_name.as_str(), value.as_str())])
                    .to_query_string(),
            ));
        }

        out
    }

    fn spawns_duplicates(&self) -> bool {
        self.inner.spawns_duplicates()
    }
}
