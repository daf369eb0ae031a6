use super::*;
use crate::{
    error::LookupPathError,
    lookup::{Lookup, LookupValue},
};

fn blog_schema() -> Schema {
    Schema::new(vec![
        ModelDef::new(
            "entry",
            "id",
            vec![
                FieldDef::new("id", FieldKind::Key).unique(),
                FieldDef::new("title", FieldKind::Text),
                FieldDef::new("author", FieldKind::Key)
                    .nullable()
                    .with_relation(RelationDef::new("author", RelationKind::ManyToOne)),
                FieldDef::new("tags", FieldKind::Key)
                    .with_relation(RelationDef::new("tag", RelationKind::ManyToMany)),
            ],
        ),
        ModelDef::new(
            "author",
            "id",
            vec![
                FieldDef::new("id", FieldKind::Key).unique(),
                FieldDef::new("name", FieldKind::Text),
                FieldDef::new("publisher", FieldKind::Key).with_relation(
                    RelationDef::new("publisher", RelationKind::ManyToOne).with_limit_choices(
                        Lookup::exact("active", LookupValue::Bool(true)),
                    ),
                ),
            ],
        ),
        ModelDef::new(
            "publisher",
            "id",
            vec![
                FieldDef::new("id", FieldKind::Key).unique(),
                FieldDef::new("name", FieldKind::Text),
                FieldDef::new("active", FieldKind::Bool),
            ],
        ),
        ModelDef::new(
            "tag",
            "id",
            vec![
                FieldDef::new("id", FieldKind::Key).unique(),
                FieldDef::new("label", FieldKind::Text),
            ],
        ),
    ])
    .unwrap()
}

#[test]
fn duplicate_model_is_rejected() {
    let err = Schema::new(vec![
        ModelDef::new("a", "id", vec![FieldDef::new("id", FieldKind::Key)]),
        ModelDef::new("a", "id", vec![FieldDef::new("id", FieldKind::Key)]),
    ])
    .unwrap_err();

    assert_eq!(err, ConfigError::DuplicateModel { model: "a".into() });
}

#[test]
fn primary_key_must_exist() {
    let err = Schema::new(vec![ModelDef::new(
        "a",
        "missing",
        vec![FieldDef::new("id", FieldKind::Key)],
    )])
    .unwrap_err();

    assert_eq!(
        err,
        ConfigError::UnknownPrimaryKey {
            model: "a".into(),
            field: "missing".into()
        }
    );
}

#[test]
fn relation_target_must_exist() {
    let err = Schema::new(vec![ModelDef::new(
        "a",
        "id",
        vec![
            FieldDef::new("id", FieldKind::Key),
            FieldDef::new("other", FieldKind::Key)
                .with_relation(RelationDef::new("ghost", RelationKind::ManyToOne)),
        ],
    )])
    .unwrap_err();

    assert_eq!(
        err,
        ConfigError::UnknownRelationTarget {
            model: "a".into(),
            field: "other".into(),
            target: "ghost".into()
        }
    );
}

#[test]
fn unique_together_fields_must_exist() {
    let err = Schema::new(vec![
        ModelDef::new(
            "a",
            "id",
            vec![
                FieldDef::new("id", FieldKind::Key),
                FieldDef::new("x", FieldKind::Int),
            ],
        )
        .with_unique_together(vec![vec!["x".into(), "y".into()]]),
    ])
    .unwrap_err();

    assert_eq!(
        err,
        ConfigError::UnknownField {
            model: "a".into(),
            field: "y".into()
        }
    );
}

#[test]
fn pk_alias_resolves_to_primary_key() {
    let schema = blog_schema();
    let model = schema.model("entry").unwrap();

    assert_eq!(model.field_or_pk("pk").unwrap().name, "id");
    assert_eq!(model.canonical_field_name("pk"), "id");
    assert_eq!(model.canonical_field_name("title"), "title");
}

#[test]
fn path_resolves_direct_field() {
    let schema = blog_schema();
    let model = schema.model("entry").unwrap();

    let resolved = resolve_path(&schema, model, "title").unwrap();
    assert_eq!(resolved.model.name, "entry");
    assert_eq!(resolved.field.name, "title");
    assert!(!resolved.spans_to_many);
    assert!(resolved.limit_choices.is_none());
}

#[test]
fn path_traverses_relations() {
    let schema = blog_schema();
    let model = schema.model("entry").unwrap();

    let resolved = resolve_path(&schema, model, "author__name").unwrap();
    assert_eq!(resolved.model.name, "author");
    assert_eq!(resolved.field.name, "name");
    assert!(!resolved.spans_to_many);
}

#[test]
fn to_many_segment_marks_fan_out() {
    let schema = blog_schema();
    let model = schema.model("entry").unwrap();

    // Traversed to-many relation.
    let resolved = resolve_path(&schema, model, "tags__label").unwrap();
    assert!(resolved.spans_to_many);

    // Terminal to-many relation field counts too.
    let resolved = resolve_path(&schema, model, "tags").unwrap();
    assert!(resolved.spans_to_many);
}

#[test]
fn last_traversed_relation_contributes_limit_choices() {
    let schema = blog_schema();
    let model = schema.model("entry").unwrap();

    let resolved = resolve_path(&schema, model, "author__publisher__name").unwrap();
    assert_eq!(
        resolved.limit_choices,
        Some(Lookup::exact("active", LookupValue::Bool(true)))
    );
}

#[test]
fn unknown_segment_is_an_error() {
    let schema = blog_schema();
    let model = schema.model("entry").unwrap();

    let err = resolve_path(&schema, model, "author__ghost").unwrap_err();
    assert_eq!(
        err,
        LookupPathError::UnknownField {
            model: "author".into(),
            field: "ghost".into()
        }
    );
}

#[test]
fn non_relation_segment_cannot_be_traversed() {
    let schema = blog_schema();
    let model = schema.model("entry").unwrap();

    let err = resolve_path(&schema, model, "title__name").unwrap_err();
    assert_eq!(
        err,
        LookupPathError::NotARelation {
            model: "entry".into(),
            field: "title".into()
        }
    );
}
