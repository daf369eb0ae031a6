use crate::{
    error::LookupPathError,
    lookup::{LOOKUP_SEP, Lookup},
    schema::{FieldDef, ModelDef, Schema},
};

///
/// ResolvedPath
///
/// Outcome of walking a `a__b__c` path from a root model. Non-terminal
/// segments must be relations; the terminal segment may be any field.
///

#[derive(Debug)]
pub struct ResolvedPath<'a> {
    /// Model owning the terminal field.
    pub model: &'a ModelDef,
    pub field: &'a FieldDef,
    /// True when any traversed relation (or the terminal field itself) is
    /// to-many, i.e. a join through it can fan out rows.
    pub spans_to_many: bool,
    /// Limit-choices constraint declared on the last traversed relation.
    pub limit_choices: Option<Lookup>,
}

/// Walk a lookup path against the schema.
///
/// The `pk` alias resolves to the current model's primary key at any
/// position. The operator suffix must already be stripped by the caller.
pub fn resolve_path<'a>(
    schema: &'a Schema,
    root: &'a ModelDef,
    path: &str,
) -> Result<ResolvedPath<'a>, LookupPathError> {
    let mut model = root;
    let mut spans_to_many = false;
    let mut limit_choices = None;

    let segments: Vec<&str> = path.split(LOOKUP_SEP).collect();
    let (terminal, intermediate) = segments
        .split_last()
        .unwrap_or((&path, &[]));

    for segment in intermediate {
        let field = model
            .field_or_pk(segment)
            .ok_or_else(|| LookupPathError::UnknownField {
                model: model.name.clone(),
                field: (*segment).to_string(),
            })?;

        let relation = field
            .relation
            .as_ref()
            .ok_or_else(|| LookupPathError::NotARelation {
                model: model.name.clone(),
                field: field.name.clone(),
            })?;

        spans_to_many |= relation.kind.is_to_many();
        limit_choices = relation.limit_choices.clone();

        // Relation targets are validated at schema construction.
        model = schema
            .model(&relation.target)
            .ok_or_else(|| LookupPathError::UnknownField {
                model: model.name.clone(),
                field: field.name.clone(),
            })?;
    }

    let field = model
        .field_or_pk(terminal)
        .ok_or_else(|| LookupPathError::UnknownField {
            model: model.name.clone(),
            field: (*terminal).to_string(),
        })?;

    if let Some(relation) = &field.relation {
        spans_to_many |= relation.kind.is_to_many();
    }

    Ok(ResolvedPath {
        model,
        field,
        spans_to_many,
        limit_choices,
    })
}
