use crate::{
    error::LookupError,
    filters::{FilterChoice, FilterContext, FilterSpec, choice_params},
    lookup::{LOOKUP_SEP, Lookup, LookupValue, format_date, parse_date, parse_lookup_key},
    params::QueryParams,
    plan::ListPlan,
    schema::FieldDef,
};
use time::Duration;

///
/// DateFilterSpec
///
/// Five fixed buckets relative to the request's current date. This is the
/// one filter type that legitimately claims multiple query-string keys per
/// selection: a bucket applies all of its lookups simultaneously.
///

pub struct DateFilterSpec {
    title: String,
    path: String,
    params: [String; 5],
    /// Claimed `(key, raw value)` pairs from the request.
    used: Vec<(String, String)>,
    links: Vec<DateLink>,
}

struct DateLink {
    label: &'static str,
    add: Vec<(String, String)>,
}

impl DateFilterSpec {
    #[must_use]
    pub fn new(ctx: &FilterContext<'_>, _field: &FieldDef, path: &str, title: &str) -> Self {
        let year_param = format!("{path}{LOOKUP_SEP}year");
        let month_param = format!("{path}{LOOKUP_SEP}month");
        let day_param = format!("{path}{LOOKUP_SEP}day");
        let gte_param = format!("{path}{LOOKUP_SEP}gte");
        let lt_param = format!("{path}{LOOKUP_SEP}lt");

        let today = ctx.today;
        let tomorrow = today.next_day().unwrap_or(today);
        let week_ago = today.checked_sub(Duration::days(7)).unwrap_or(today);
        let year = today.year().to_string();
        let month = u8::from(today.month()).to_string();
        let day = today.day().to_string();

        let links = vec![
            DateLink {
                label: "Any date",
                add: Vec::new(),
            },
            DateLink {
                label: "Today",
                add: vec![
                    (year_param.clone(), year.clone()),
                    (month_param.clone(), month.clone()),
                    (day_param.clone(), day),
                ],
            },
            DateLink {
                label: "Past 7 days",
                add: vec![
                    (gte_param.clone(), format_date(week_ago)),
                    (lt_param.clone(), format_date(tomorrow)),
                ],
            },
            DateLink {
                label: "This month",
                add: vec![(year_param.clone(), year.clone()), (month_param.clone(), month)],
            },
            DateLink {
                label: "This year",
                add: vec![(year_param.clone(), year)],
            },
        ];

        let params = [year_param, month_param, day_param, gte_param, lt_param];
        let used = params
            .iter()
            .filter_map(|key| {
                ctx.lookups
                    .get(key)
                    .and_then(LookupValue::as_text)
                    .map(|value| (key.clone(), value.to_string()))
            })
            .collect();

        Self {
            title: title.to_string(),
            path: path.to_string(),
            params,
            used,
            links,
        }
    }

    fn used_matches(&self, add: &[(String, String)]) -> bool {
        if add.len() != self.used.len() {
            return false;
        }
        add.iter()
            .all(|(key, value)| self.used.iter().any(|(k, v)| k == key && v == value))
    }
}

impl FilterSpec for DateFilterSpec {
    fn title(&self) -> &str {
        &self.title
    }

    fn has_output(&self) -> bool {
        true
    }

    fn expected_parameters(&self) -> Vec<String> {
        self.params.to_vec()
    }

    fn is_active(&self) -> bool {
        !self.used.is_empty()
    }

    fn apply(&self, plan: &mut ListPlan) -> Result<(), LookupError> {
        for (key, raw) in &self.used {
            let (_, op) = parse_lookup_key(key);
            let value = match op {
                crate::lookup::LookupOp::Year
                | crate::lookup::LookupOp::Month
                | crate::lookup::LookupOp::Day => raw
                    .parse::<i64>()
                    .map(LookupValue::Int)
                    .map_err(|_| LookupError::bad_value(key.as_str(), "integer", raw))?,
                _ => parse_date(raw)
                    .map(LookupValue::Date)
                    .ok_or_else(|| LookupError::bad_value(key.as_str(), "date", raw))?,
            };

            plan.add(Lookup::new(self.path.as_str(), op, value));
        }

        Ok(())
    }

    fn choices(&self, params: &QueryParams) -> Vec<FilterChoice> {
        let base = choice_params(params);
        let own: Vec<&str> = self.params.iter().map(String::as_str).collect();

        self.links
            .iter()
            .map(|link| {
                let query = base
                    .without(&own)
                    .with(link.add.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .to_query_string();

                FilterChoice::new(link.label, self.used_matches(&link.add), query)
            })
            .collect()
    }
}
