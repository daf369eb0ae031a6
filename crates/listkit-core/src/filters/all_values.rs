use crate::{
    error::LookupError,
    filters::{FilterChoice, FilterContext, FilterSpec, choice_params},
    lookup::{LOOKUP_SEP, Lookup, LookupValue},
    params::QueryParams,
    plan::ListPlan,
    schema::{FieldDef, resolve_path},
};

///
/// AllValuesFilterSpec
///
/// Fallback filter matching every field: choices are the distinct values
/// actually observed in the column, scoped by any limit-choices constraint
/// declared on the traversed relation. Registered last because its predicate
/// matches anything.
///

pub struct AllValuesFilterSpec {
    title: String,
    path: String,
    exact_param: String,
    isnull_param: String,
    exact_value: Option<String>,
    isnull_value: Option<bool>,
    include_empty: bool,
    spans_to_many: bool,
    lookup_choices: Vec<String>,
}

impl AllValuesFilterSpec {
    #[must_use]
    pub fn new(ctx: &FilterContext<'_>, _field: &FieldDef, path: &str, title: &str) -> Self {
        // The bare path is the exact-match key for this filter.
        let exact_param = path.to_string();
        let isnull_param = format!("{path}{LOOKUP_SEP}isnull");

        let (observed, spans_to_many) = match resolve_path(ctx.schema, ctx.model, path) {
            Ok(resolved) => (
                ctx.source.distinct_values(
                    &resolved.model.name,
                    &resolved.field.name,
                    resolved.limit_choices.as_ref(),
                ),
                resolved.spans_to_many,
            ),
            // Paths are validated at assembler construction; an unresolvable
            // path yields an empty column.
            Err(_) => (Vec::new(), false),
        };

        let include_empty = observed.iter().any(Option::is_none);
        let lookup_choices = observed.into_iter().flatten().collect();

        Self {
            title: title.to_string(),
            path: path.to_string(),
            exact_value: ctx
                .lookups
                .get(&exact_param)
                .and_then(LookupValue::as_text)
                .map(str::to_string),
            isnull_value: ctx.lookups.get(&isnull_param).and_then(LookupValue::as_bool),
            exact_param,
            isnull_param,
            include_empty,
            spans_to_many,
            lookup_choices,
        }
    }
}

impl FilterSpec for AllValuesFilterSpec {
    fn title(&self) -> &str {
        &self.title
    }

    fn has_output(&self) -> bool {
        true
    }

    fn expected_parameters(&self) -> Vec<String> {
        vec![self.exact_param.clone(), self.isnull_param.clone()]
    }

    fn is_active(&self) -> bool {
        self.exact_value.is_some() || self.isnull_value.is_some()
    }

    fn apply(&self, plan: &mut ListPlan) -> Result<(), LookupError> {
        if let Some(value) = &self.exact_value {
            plan.add(Lookup::exact(
                self.path.as_str(),
                LookupValue::Text(value.clone()),
            ));
        }
        if let Some(value) = self.isnull_value {
            plan.add(Lookup::is_null(self.path.as_str(), value));
        }

        Ok(())
    }

    fn choices(&self, params: &QueryParams) -> Vec<FilterChoice> {
        let base = choice_params(params);
        let own: [&str; 2] = [&self.exact_param, &self.isnull_param];
        let mut out = vec![FilterChoice::new(
            "All",
            !self.is_active(),
            base.without(&own).to_query_string(),
        )];

        for value in &self.lookup_choices {
            out.push(FilterChoice::new(
                value.as_str(),
                self.exact_value.as_deref() == Some(value.as_str()),
                base.without(&own)
                    .with([(self.exact_param.as_str(), value.as_str())])
                    .to_query_string(),
            ));
        }

        if self.include_empty {
            out.push(FilterChoice::new(
                "Empty",
                self.isnull_value == Some(true),
                base.without(&own)
                    .with([(self.isnull_param.as_str(), "true")])
                    .to_query_string(),
            ));
        }

        out
    }

    fn spawns_duplicates(&self) -> bool {
        self.spans_to_many
    }
}
