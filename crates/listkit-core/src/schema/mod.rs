//! Runtime model metadata consulted by filter construction, lookup
//! validation, and ordering resolution. This is a descriptor surface only;
//! row storage and query execution belong to the data-access collaborator.

mod path;

#[cfg(test)]
mod tests;

pub use path::{ResolvedPath, resolve_path};

use crate::{error::ConfigError, lookup::Lookup, ordering::OrderDirection};
use std::collections::BTreeMap;

///
/// Schema
///
/// Immutable set of model descriptors. Built once at startup and shared by
/// reference across requests; construction validates cross-model references.
///

#[derive(Debug)]
pub struct Schema {
    models: BTreeMap<String, ModelDef>,
}

impl Schema {
    pub fn new(models: impl IntoIterator<Item = ModelDef>) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for model in models {
            if map.contains_key(&model.name) {
                return Err(ConfigError::DuplicateModel { model: model.name });
            }
            map.insert(model.name.clone(), model);
        }

        let schema = Self { models: map };
        schema.validate()?;

        Ok(schema)
    }

    #[must_use]
    pub fn model(&self, name: &str) -> Option<&ModelDef> {
        self.models.get(name)
    }

    pub fn expect_model(&self, name: &str) -> Result<&ModelDef, ConfigError> {
        self.model(name).ok_or_else(|| ConfigError::UnknownModel {
            model: name.to_string(),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for model in self.models.values() {
            if model.field(&model.primary_key).is_none() {
                return Err(ConfigError::UnknownPrimaryKey {
                    model: model.name.clone(),
                    field: model.primary_key.clone(),
                });
            }

            for field in &model.fields {
                if let Some(relation) = &field.relation
                    && !self.models.contains_key(&relation.target)
                {
                    return Err(ConfigError::UnknownRelationTarget {
                        model: model.name.clone(),
                        field: field.name.clone(),
                        target: relation.target.clone(),
                    });
                }
            }

            for group in &model.unique_together {
                for name in group {
                    if model.field(name).is_none() {
                        return Err(ConfigError::UnknownField {
                            model: model.name.clone(),
                            field: name.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

///
/// ModelDef
///

#[derive(Clone, Debug)]
pub struct ModelDef {
    pub name: String,
    pub primary_key: String,
    pub fields: Vec<FieldDef>,
    /// Declared default ordering; may be empty.
    pub default_ordering: Vec<(String, OrderDirection)>,
    /// Composite-unique constraint groups (field order irrelevant).
    pub unique_together: Vec<Vec<String>>,
}

impl ModelDef {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        primary_key: impl Into<String>,
        fields: Vec<FieldDef>,
    ) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            fields,
            default_ordering: Vec::new(),
            unique_together: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_default_ordering(mut self, ordering: Vec<(String, OrderDirection)>) -> Self {
        self.default_ordering = ordering;
        self
    }

    #[must_use]
    pub fn with_unique_together(mut self, groups: Vec<Vec<String>>) -> Self {
        self.unique_together = groups;
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Resolve a field name with the `pk` alias mapped to the primary key.
    #[must_use]
    pub fn field_or_pk(&self, name: &str) -> Option<&FieldDef> {
        if name == "pk" {
            self.field(&self.primary_key)
        } else {
            self.field(name)
        }
    }

    /// Canonical field name with the `pk` alias resolved.
    #[must_use]
    pub fn canonical_field_name<'a>(&'a self, name: &'a str) -> &'a str {
        if name == "pk" { &self.primary_key } else { name }
    }
}

///
/// FieldDef
///

#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    /// Display label; defaults to the field name.
    pub label: String,
    pub kind: FieldKind,
    pub nullable: bool,
    pub unique: bool,
    /// Declared `(value, label)` choice pairs, in declaration order.
    pub choices: Vec<(String, String)>,
    pub relation: Option<RelationDef>,
}

impl FieldDef {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();

        Self {
            label: name.clone(),
            name,
            kind,
            nullable: false,
            unique: false,
            choices: Vec::new(),
            relation: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn with_choices(
        mut self,
        choices: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.choices = choices
            .into_iter()
            .map(|(value, label)| (value.into(), label.into()))
            .collect();
        self
    }

    #[must_use]
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relation = Some(relation);
        self
    }

    #[must_use]
    pub const fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    #[must_use]
    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }
}

///
/// FieldKind
///
/// Minimal type surface needed by value coercion and filter matching.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Text,
    Date,
    DateTime,
    /// Opaque identifier (primary/foreign key payloads).
    Key,
}

impl FieldKind {
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }
}

///
/// RelationDef
///

#[derive(Clone, Debug)]
pub struct RelationDef {
    pub target: String,
    pub kind: RelationKind,
    /// Optional constraint restricting which related rows are offered as
    /// filter choices.
    pub limit_choices: Option<Lookup>,
}

impl RelationDef {
    #[must_use]
    pub fn new(target: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            target: target.into(),
            kind,
            limit_choices: None,
        }
    }

    #[must_use]
    pub fn with_limit_choices(mut self, lookup: Lookup) -> Self {
        self.limit_choices = Some(lookup);
        self
    }
}

///
/// RelationKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelationKind {
    ManyToOne,
    ManyToMany,
    OneToMany,
}

impl RelationKind {
    /// True when traversing this relation can fan out base rows.
    #[must_use]
    pub const fn is_to_many(self) -> bool {
        matches!(self, Self::ManyToMany | Self::OneToMany)
    }
}
