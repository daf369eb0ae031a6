use crate::{
    error::ConfigError,
    filters::{
        AllValuesFilterSpec, BooleanFilterSpec, ChoicesFilterSpec, DateFilterSpec, FilterContext,
        FilterSpec, RelatedFilterSpec,
    },
    schema::FieldDef,
};

/// Predicate deciding whether a registry entry handles a field.
pub type FieldPredicate = fn(&FieldDef) -> bool;

/// Constructor building a spec for `(field, path, title)` in one request's
/// context.
pub type FilterCtor = fn(&FilterContext<'_>, &FieldDef, &str, &str) -> Box<dyn FilterSpec>;

///
/// FilterRegistry
///
/// Priority-ordered `(predicate, constructor)` table plus an optional
/// match-anything fallback. Built once during application initialization,
/// then treated as read-only; requests only read it. First matching
/// predicate wins, so insertion order is semantics; the fallback is
/// consulted only when no entry matches.
///

pub struct FilterRegistry {
    entries: Vec<(FieldPredicate, FilterCtor)>,
    fallback: Option<FilterCtor>,
}

impl FilterRegistry {
    /// Empty registry; the caller owns the full resolution order.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
            fallback: None,
        }
    }

    /// Registry pre-populated with the built-in field filters and the
    /// observed-values fallback.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        registry.register(FieldDef::is_relation, |ctx, field, path, title| {
            Box::new(RelatedFilterSpec::new(ctx, field, path, title))
        });
        registry.register(
            |field| matches!(field.kind, crate::schema::FieldKind::Bool),
            |ctx, field, path, title| Box::new(BooleanFilterSpec::new(ctx, field, path, title)),
        );
        registry.register(FieldDef::has_choices, |ctx, field, path, title| {
            Box::new(ChoicesFilterSpec::new(ctx, field, path, title))
        });
        registry.register(
            |field| field.kind.is_temporal(),
            |ctx, field, path, title| Box::new(DateFilterSpec::new(ctx, field, path, title)),
        );
        registry.set_fallback(|ctx, field, path, title| {
            Box::new(AllValuesFilterSpec::new(ctx, field, path, title))
        });

        registry
    }

    /// Append an entry after every existing one, ahead of the fallback.
    pub fn register(&mut self, matches: FieldPredicate, build: FilterCtor) {
        self.entries.push((matches, build));
    }

    /// Insert an entry ahead of everything registered so far, letting a more
    /// specific matcher pre-empt broader ones. Later priority insertions go
    /// before earlier ones.
    pub fn register_priority(&mut self, matches: FieldPredicate, build: FilterCtor) {
        self.entries.insert(0, (matches, build));
    }

    /// Install the constructor used when no predicate matches.
    pub fn set_fallback(&mut self, build: FilterCtor) {
        self.fallback = Some(build);
    }

    /// True when some entry (or the fallback) handles this field.
    #[must_use]
    pub fn matches(&self, field: &FieldDef) -> bool {
        self.fallback.is_some() || self.entries.iter().any(|(matches, _)| matches(field))
    }

    /// Build a spec for the field via the first matching entry.
    pub fn build(
        &self,
        ctx: &FilterContext<'_>,
        field: &FieldDef,
        path: &str,
        title: &str,
    ) -> Result<Box<dyn FilterSpec>, ConfigError> {
        for (matches, build) in &self.entries {
            if matches(field) {
                return Ok(build(ctx, field, path, title));
            }
        }
        if let Some(build) = self.fallback {
            return Ok(build(ctx, field, path, title));
        }

        Err(ConfigError::NoMatchingFilter {
            model: ctx.model.name.clone(),
            field: field.name.clone(),
        })
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
