#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::*;
use crate::error::Error;
use crate::rules::RuleMode;
use crate::runtime::ServiceContract;
use crate::schema::{
    ColumnDefinition, ForeignKeyConstraint, NativeType, TableModelRecord, UniqueKeyConstraint,
};

fn posts() -> Arc<TableModel> {
    let record = TableModelRecord {
        name: "posts".into(),
        primary_key: Some("id".into()),
        columns: vec![
            ColumnDefinition::new("id", NativeType::Integer(None)).primary_key(),
            ColumnDefinition::new("author_id", NativeType::BigInt),
            ColumnDefinition::new("editor_id", NativeType::BigInt).nullable(true),
            ColumnDefinition::new("slug", NativeType::Varchar(Some(80))),
            ColumnDefinition::new("body", NativeType::Text(None)).nullable(true),
            ColumnDefinition::new("api_token", NativeType::Varchar(Some(64))).nullable(true),
        ],
        foreign_keys: vec![
            ForeignKeyConstraint::new("posts", vec!["author_id".into()], "people", vec!["id".into()])
                .unwrap(),
            ForeignKeyConstraint::new("posts", vec!["editor_id".into()], "people", vec!["id".into()])
                .unwrap(),
        ],
        unique_keys: vec![UniqueKeyConstraint::new("posts", vec!["slug".into()])],
        increments: true,
        namespace: None,
    };
    Arc::new(TableModel::try_from(record).unwrap())
}

fn model_payload(def: &ComponentDefinition) -> &ModelPayload {
    match def.payload().unwrap() {
        ComponentPayload::Model(p) => p,
        other => panic!("expected model payload, got {other:?}"),
    }
}

fn dto_payload(def: &ComponentDefinition) -> &DtoPayload {
    match def.payload().unwrap() {
        ComponentPayload::Dto(p) => p,
        other => panic!("expected dto payload, got {other:?}"),
    }
}

fn view_model_payload(def: &ComponentDefinition) -> &ViewModelPayload {
    match def.payload().unwrap() {
        ComponentPayload::ViewModel(p) => p,
        other => panic!("expected view model payload, got {other:?}"),
    }
}

fn rule_of(rules: &[FieldRule], field: &str) -> Option<String> {
    rules
        .iter()
        .find(|r| r.field == field)
        .map(|r| r.rule.to_string())
}

fn assert_disjoint_subset(table: &TableModel, sets: [&[String]; 3]) {
    let columns: BTreeSet<&str> = table.column_names().collect();
    let mut seen = BTreeSet::new();
    for set in sets {
        for name in set {
            assert!(columns.contains(name.as_str()), "{name} is not a column");
            assert!(seen.insert(name.clone()), "{name} appears in two partitions");
        }
    }
}

#[test]
fn model_guards_incrementing_primary_key_by_default() {
    let table = posts();
    let def = ModelBuilder.build(&table, &GenerateOptions::default()).unwrap();
    assert!(def.is_built());
    assert_eq!(def.class_name(), "Post");
    assert_eq!(def.namespace(), "app::models");
    let payload = model_payload(&def);
    assert_eq!(payload.guarded, vec!["id".to_string()]);
    assert!(!payload.fillable.contains(&"id".to_string()));
    assert_eq!(payload.fillable.len(), 5);
}

#[test]
fn partition_precedence_is_guarded_then_hidden() {
    let table = posts();
    let options = GenerateOptions {
        hidden: Some(vec!["api_token".into(), "slug".into(), "missing".into()]),
        guarded: Some(vec!["slug".into(), "id".into()]),
        ..Default::default()
    };
    let model = ModelBuilder.build(&table, &options).unwrap();
    let payload = model_payload(&model);
    assert_eq!(payload.guarded, vec!["id".to_string(), "slug".to_string()]);
    assert_eq!(payload.hidden, vec!["api_token".to_string()]);
    let visible: Vec<String> = payload.visible().map(str::to_string).collect();
    assert_disjoint_subset(&table, [&visible, &payload.hidden, &payload.guarded]);

    let dto = DtoBuilder.build(&table, &options).unwrap();
    let payload = dto_payload(&dto);
    let visible: Vec<String> = payload.attributes.iter().map(|a| a.internal.clone()).collect();
    assert_disjoint_subset(&table, [&visible, &payload.hidden, &payload.guarded]);
}

#[test]
fn dto_defaults_to_camel_case_identity_mapping() {
    let table = posts();
    let options = GenerateOptions {
        hidden: Some(vec!["api_token".into()]),
        ..Default::default()
    };
    let def = DtoBuilder.build(&table, &options).unwrap();
    assert_eq!(def.class_name(), "PostDto");
    let payload = dto_payload(&def);
    assert_eq!(payload.external_key("author_id"), Some("authorId"));
    assert_eq!(payload.external_key("id"), Some("id"));
    assert_eq!(payload.external_key("api_token"), None);
}

#[test]
fn dto_explicit_attributes_skip_non_visible_columns() {
    let table = posts();
    let mut attributes = BTreeMap::new();
    attributes.insert("writer".to_string(), "author_id".to_string());
    attributes.insert("token".to_string(), "api_token".to_string());
    attributes.insert("ghost".to_string(), "nope".to_string());
    let options = GenerateOptions {
        attributes: Some(attributes),
        guarded: Some(vec!["api_token".into()]),
        ..Default::default()
    };
    let payload = dto_payload(&DtoBuilder.build(&table, &options).unwrap()).clone();
    assert_eq!(
        payload.attributes,
        vec![AttributeMapping {
            external: "writer".into(),
            internal: "author_id".into(),
        }]
    );
}

#[test]
fn view_model_rules_skip_key_and_follow_clause_order() {
    let table = posts();
    let def = ViewModelBuilder.build(&table, &GenerateOptions::default()).unwrap();
    let payload = view_model_payload(&def);
    assert_eq!(rule_of(&payload.create_rules, "id"), None);
    assert_eq!(
        rule_of(&payload.create_rules, "editor_id").as_deref(),
        Some("nullable|integer|exists:people,id")
    );
    assert_eq!(
        rule_of(&payload.create_rules, "slug").as_deref(),
        Some("required|string|max:80|unique:posts,slug")
    );
    let update = payload.update_rules.as_ref().unwrap();
    assert_eq!(
        rule_of(update, "author_id").as_deref(),
        Some("sometimes|integer|exists:people,id")
    );
}

#[test]
fn view_model_overrides_replace_and_append() {
    let table = posts();
    let mut options = GenerateOptions::default();
    options.rules.create.insert("slug".into(), "required|alpha_dash".into());
    options.rules.create.insert("password_confirmation".into(), "required".into());
    let payload = view_model_payload(&ViewModelBuilder.build(&table, &options).unwrap()).clone();
    assert_eq!(rule_of(&payload.create_rules, "slug").as_deref(), Some("required|alpha_dash"));
    assert_eq!(
        payload.create_rules.last().map(|r| r.field.as_str()),
        Some("password_confirmation")
    );
}

#[test]
fn single_action_shares_one_rule_set() {
    let table = posts();
    let options = GenerateOptions {
        single_action: true,
        ..Default::default()
    };
    let payload = view_model_payload(&ViewModelBuilder.build(&table, &options).unwrap()).clone();
    assert!(payload.update_rules.is_none());
    assert_eq!(payload.rules(RuleMode::Update), payload.rules(RuleMode::Create));
}

#[test]
fn service_defaults_to_all_actions_and_generated_model() {
    let table = posts();
    let def = ServiceBuilder.build(&table, &GenerateOptions::default()).unwrap();
    let ComponentPayload::Service(payload) = def.payload().unwrap() else {
        panic!("expected service payload");
    };
    assert_eq!(payload.model_class, "app::models::Post");
    assert_eq!(payload.actions.len(), 4);

    let options = GenerateOptions {
        actions: Some(vec![ActionKind::Select]),
        ..Default::default()
    };
    let def = ServiceBuilder.build(&table, &options).unwrap();
    let ComponentPayload::Service(payload) = def.payload().unwrap() else {
        panic!("expected service payload");
    };
    assert!(!payload.supports(ActionKind::Delete));
    let err = ServiceContract::try_from(&def)
        .unwrap()
        .check(ActionKind::Delete)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedAction { ref action, .. } if action == "delete"));
}

#[test]
fn controller_route_names() {
    let table = posts();
    let def = ControllerBuilder::default()
        .build(&table, &GenerateOptions::default())
        .unwrap();
    assert_eq!(def.class_name(), "PostsController");
    let ComponentPayload::Controller(payload) = def.payload().unwrap() else {
        panic!("expected controller payload");
    };
    assert_eq!(payload.route_name, "posts");
    assert!(payload.service.is_none());

    let blank = GenerateOptions {
        controller_name: Some(String::new()),
        ..Default::default()
    };
    let def = ControllerBuilder::default().build(&table, &blank).unwrap();
    assert_eq!(def.class_name(), "TestController");
    let ComponentPayload::Controller(payload) = def.payload().unwrap() else {
        panic!("expected controller payload");
    };
    assert_eq!(payload.route_name, "test");

    let def = ControllerBuilder::default()
        .with_fallback_name("HomeController")
        .build(&table, &blank)
        .unwrap();
    let ComponentPayload::Controller(payload) = def.payload().unwrap() else {
        panic!("expected controller payload");
    };
    assert_eq!(payload.route_name, "home");
}

#[test]
fn unbuilt_definition_refuses_serialization() {
    let def = ComponentDefinition::new(ComponentKind::Dto, "PostDto", "app::dto", posts());
    assert!(!def.is_built());
    assert!(matches!(def.to_json(), Err(Error::Build { .. })));
    assert!(serde_json::to_string(&def).is_err());
}

#[test]
fn builds_are_deterministic() {
    let table = posts();
    let options = GenerateOptions {
        sub_namespace: Some("blog".into()),
        ..Default::default()
    };
    for kind in ComponentKind::ALL {
        let first = builder_for(kind).build(&table, &options).unwrap();
        let second = builder_for(kind).build(&posts(), &options).unwrap();
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap(), "{kind}");
        assert_eq!(first.module(), Some("blog"));
    }
}

#[test]
fn builders_share_the_table() {
    let table = posts();
    let def = ModelBuilder.build(&table, &GenerateOptions::default()).unwrap();
    assert!(Arc::ptr_eq(&table, &def.table_handle()));
}
