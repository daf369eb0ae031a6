use crate::{
    error::LookupError,
    filters::{FilterChoice, FilterContext, FilterSpec, choice_params},
    lookup::{LOOKUP_SEP, Lookup, LookupValue},
    params::QueryParams,
    plan::ListPlan,
    schema::FieldDef,
};

///
/// BooleanFilterSpec
///
/// All / Yes / No, plus Unknown when the underlying value may be absent.
/// Narrows via exact match or is-null.
///

pub struct BooleanFilterSpec {
    title: String,
    path: String,
    exact_param: String,
    isnull_param: String,
    exact_value: Option<String>,
    isnull_value: Option<bool>,
    nullable: bool,
}

impl BooleanFilterSpec {
    #[must_use]
    pub fn new(ctx: &FilterContext<'_>, field: &FieldDef, path: &str, title: &str) -> Self {
        let exact_param = format!("{path}{LOOKUP_SEP}exact");
        let isnull_param = format!("{path}{LOOKUP_SEP}isnull");

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
            nullable: field.nullable,
        }
    }
}

impl FilterSpec for BooleanFilterSpec {
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
        if let Some(raw) = &self.exact_value {
            let value = match raw.as_str() {
                "1" | "true" | "True" => true,
                "0" | "false" | "False" => false,
                other => {
                    return Err(LookupError::bad_value(self.exact_param.as_str(), "boolean", other));
                }
            };
            plan.add(Lookup::exact(self.path.as_str(), LookupValue::Bool(value)));
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

        for (value, label) in [("1", "Yes"), ("0", "No")] {
            out.push(FilterChoice::new(
                label,
                self.exact_value.as_deref() == Some(value) && self.isnull_value.is_none(),
                base.without(&own)
                    .with([(self.exact_param.as_str(), value)])
                    .to_query_string(),
            ));
        }

        if self.nullable {
            out.push(FilterChoice::new(
                "Unknown",
                self.isnull_value == Some(true),
                base.without(&own)
                    .with([(self.isnull_param.as_str(), "true")])
                    .to_query_string(),
            ));
        }

        out
    }
}
