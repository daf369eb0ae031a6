use crate::{
    error::LookupError,
    filters::{FilterChoice, FilterContext, FilterSpec, choice_params},
    lookup::{LOOKUP_SEP, Lookup, LookupValue},
    params::QueryParams,
    plan::ListPlan,
    schema::FieldDef,
};

///
/// ChoicesFilterSpec
///
/// One choice per `(value, label)` pair declared on the field; narrows via
/// exact match. An extra empty choice appears when the field is nullable.
///

pub struct ChoicesFilterSpec {
    title: String,
    path: String,
    exact_param: String,
    isnull_param: String,
    exact_value: Option<String>,
    isnull_value: Option<bool>,
    nullable: bool,
    lookup_choices: Vec<(String, String)>,
}

impl ChoicesFilterSpec {
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
            lookup_choices: field.choices.clone(),
        }
    }
}

impl FilterSpec for ChoicesFilterSpec {
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

        for (value, label) in &self.lookup_choices {
            out.push(FilterChoice::new(
                label.as_str(),
                self.exact_value.as_deref() == Some(value.as_str()),
                base.without(&own)
                    .with([(self.exact_param.as_str(), value.as_str())])
                    .to_query_string(),
            ));
        }

        if self.nullable {
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
}
