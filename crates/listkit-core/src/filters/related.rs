use crate::{
    error::LookupError,
    filters::{FilterChoice, FilterContext, FilterSpec, choice_params},
    lookup::{LOOKUP_SEP, Lookup, LookupValue},
    params::QueryParams,
    plan::ListPlan,
    schema::{FieldDef, RelationKind},
};

///
/// RelatedFilterSpec
///
/// Choices enumerate the distinct primary keys of the related model, plus an
/// "is empty" choice when the relation is nullable. A relation with zero or
/// one effective choice has no output and is dropped from the active list.
///

pub struct RelatedFilterSpec {
    title: String,
    path: String,
    exact_param: String,
    isnull_param: String,
    exact_value: Option<String>,
    isnull_value: Option<bool>,
    include_empty: bool,
    to_many: bool,
    lookup_choices: Vec<(String, String)>,
}

impl RelatedFilterSpec {
    #[must_use]
    pub fn new(ctx: &FilterContext<'_>, field: &FieldDef, path: &str, title: &str) -> Self {
        let exact_param = format!("{path}{LOOKUP_SEP}exact");
        let isnull_param = format!("{path}{LOOKUP_SEP}isnull");

        let (lookup_choices, to_many) = match &field.relation {
            Some(relation) => (
                ctx.source
                    .related_choices(&relation.target, relation.limit_choices.as_ref()),
                relation.kind.is_to_many(),
            ),
            // Registry predicates guarantee a relation; behave as empty if
            // the schema disagrees.
            None => (Vec::new(), false),
        };

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
            include_empty: field.nullable
                || field
                    .relation
                    .as_ref()
                    .is_some_and(|relation| relation.kind == RelationKind::OneToMany),
            to_many,
            lookup_choices,
        }
    }
}

impl FilterSpec for RelatedFilterSpec {
    fn title(&self) -> &str {
        &self.title
    }

    fn has_output(&self) -> bool {
        self.lookup_choices.len() + usize::from(self.include_empty) > 1
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

        for (key, label) in &self.lookup_choices {
            out.push(FilterChoice::new(
                label.as_str(),
                self.exact_value.as_deref() == Some(key.as_str()),
                base.without(&own)
                    .with([(self.exact_param.as_str(), key.as_str())])
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
        self.to_many
    }
}
