use askama::Template;

use crate::cache::RouteDescriptor;
use crate::components::naming::sanitize_field_name;
use crate::components::{
    ComponentDefinition, ComponentPayload, ControllerPayload, DtoPayload, FieldRule,
    ModelPayload, ServicePayload, ViewModelPayload,
};
use crate::error::{Error, Result};
use crate::rules::map_type;
use crate::schema::{ColumnDefinition, TableModel};

/// Field of a generated struct
#[derive(Debug, Clone)]
pub struct FieldView {
    /// Rust identifier
    pub ident: String,
    /// Source column
    pub column: String,
    /// Serialized key (column name or external DTO key)
    pub key: String,
    /// Whether `key` differs from `ident` and needs `#[serde(rename)]`
    pub renamed: bool,
    /// Rust type, wrapped in `Option` for nullable columns
    pub ty: String,
    /// Skipped on serialization
    pub hidden: bool,
}

impl FieldView {
    fn new(column: &ColumnDefinition, key: &str, hidden: bool) -> Self {
        let ident = sanitize_field_name(&column.name);
        let base = map_type(&column.native_type).0.rust_type();
        let ty = if column.nullable {
            format!("Option<{base}>")
        } else {
            base.to_string()
        };
        Self {
            renamed: ident.trim_start_matches("r#") != key,
            ident,
            column: column.name.clone(),
            key: key.to_string(),
            ty,
            hidden,
        }
    }
}

/// Rule entry as Rust string literals
#[derive(Debug, Clone)]
pub struct RuleView {
    pub field: String,
    pub rule: String,
}

/// Route entry as Rust string literals
#[derive(Debug, Clone)]
pub struct RouteView {
    pub name: String,
    pub path: String,
    pub controller: String,
}

/// Template data for a generated model struct
#[derive(Template)]
#[template(path = "model.rs.txt", escape = "none")]
pub struct ModelTemplateData {
    pub class_name: String,
    pub table: String,
    pub primary_key: String,
    pub increments: bool,
    pub fields: Vec<FieldView>,
    pub fillable: String,
    pub hidden: String,
    pub guarded: String,
    pub relations: String,
}

/// Template data for a generated DTO struct
#[derive(Template)]
#[template(path = "dto.rs.txt", escape = "none")]
pub struct DtoTemplateData {
    pub class_name: String,
    pub table: String,
    pub fields: Vec<FieldView>,
}

/// Template data for generated validation rule tables
#[derive(Template)]
#[template(path = "view_model.rs.txt", escape = "none")]
pub struct ViewModelTemplateData {
    pub class_name: String,
    pub table: String,
    pub create_rules: Vec<RuleView>,
    pub update_rules: Vec<RuleView>,
    pub single_action: bool,
}

/// Template data for a generated service
#[derive(Template)]
#[template(path = "service.rs.txt", escape = "none")]
pub struct ServiceTemplateData {
    pub class_name: String,
    pub table: String,
    pub model_class: String,
    pub actions: String,
}

/// Template data for a generated controller
#[derive(Template)]
#[template(path = "controller.rs.txt", escape = "none")]
pub struct ControllerTemplateData {
    pub class_name: String,
    pub table: String,
    pub route_name: String,
    pub service: String,
    pub view_model: String,
    pub dto: String,
}

/// Template data for the route registry
#[derive(Template)]
#[template(path = "routes.rs.txt", escape = "none")]
pub struct RoutesTemplateData {
    pub routes: Vec<RouteView>,
}

/// Turns a built component into source text.
pub trait Renderer {
    /// # Errors
    ///
    /// [`Error::Build`] for unbuilt components, [`Error::Render`] when the
    /// template fails.
    fn render(&self, component: &ComponentDefinition) -> Result<String>;
}

/// [`Renderer`] backed by the askama templates under `templates/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl Renderer for TemplateRenderer {
    fn render(&self, component: &ComponentDefinition) -> Result<String> {
        let class_name = component.class_name().to_string();
        let table = component.table();
        let rendered = match component.payload()? {
            ComponentPayload::Model(payload) => model_data(class_name.clone(), table, payload).render(),
            ComponentPayload::Dto(payload) => dto_data(class_name.clone(), table, payload).render(),
            ComponentPayload::ViewModel(payload) => {
                view_model_data(class_name.clone(), table, payload).render()
            }
            ComponentPayload::Service(payload) => {
                service_data(class_name.clone(), table, payload).render()
            }
            ComponentPayload::Controller(payload) => {
                controller_data(class_name.clone(), table, payload).render()
            }
        };
        rendered.map_err(|source| Error::Render {
            class: class_name,
            source,
        })
    }
}

/// Render the route registry source.
pub fn render_routes(routes: &[RouteDescriptor]) -> Result<String> {
    RoutesTemplateData {
        routes: routes
            .iter()
            .map(|r| RouteView {
                name: literal(&r.name),
                path: literal(&r.path),
                controller: literal(&r.controller),
            })
            .collect(),
    }
    .render()
    .map_err(|source| Error::Render {
        class: "routes".into(),
        source,
    })
}

/// Rust string literal for `s`.
fn literal(s: &str) -> String {
    format!("{s:?}")
}

fn literal_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| literal(s.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn option_literal(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("Some({})", literal(v)),
        None => "None".to_string(),
    }
}

fn model_data(class_name: String, table: &TableModel, payload: &ModelPayload) -> ModelTemplateData {
    let fields = table
        .columns()
        .iter()
        .map(|c| FieldView::new(c, &c.name, payload.hidden.contains(&c.name)))
        .collect();
    ModelTemplateData {
        class_name,
        table: table.name().to_string(),
        primary_key: option_literal(table.primary_key()),
        increments: table.increments(),
        fields,
        fillable: literal_list(&payload.fillable),
        hidden: literal_list(&payload.hidden),
        guarded: literal_list(&payload.guarded),
        relations: literal_list(&payload.relations),
    }
}

fn dto_data(class_name: String, table: &TableModel, payload: &DtoPayload) -> DtoTemplateData {
    let fields = payload
        .attributes
        .iter()
        .filter_map(|a| table.column(&a.internal).map(|c| FieldView::new(c, &a.external, false)))
        .collect();
    DtoTemplateData {
        class_name,
        table: table.name().to_string(),
        fields,
    }
}

fn rule_views(rules: &[FieldRule]) -> Vec<RuleView> {
    rules
        .iter()
        .map(|r| RuleView {
            field: literal(&r.field),
            rule: literal(&r.rule.to_string()),
        })
        .collect()
}

fn view_model_data(
    class_name: String,
    table: &TableModel,
    payload: &ViewModelPayload,
) -> ViewModelTemplateData {
    ViewModelTemplateData {
        class_name,
        table: table.name().to_string(),
        create_rules: rule_views(&payload.create_rules),
        update_rules: payload.update_rules.as_deref().map(rule_views).unwrap_or_default(),
        single_action: payload.single_action,
    }
}

fn service_data(class_name: String, table: &TableModel, payload: &ServicePayload) -> ServiceTemplateData {
    let actions: Vec<&str> = payload.actions.iter().map(|a| a.as_str()).collect();
    ServiceTemplateData {
        class_name,
        table: table.name().to_string(),
        model_class: literal(&payload.model_class),
        actions: literal_list(&actions),
    }
}

fn controller_data(
    class_name: String,
    table: &TableModel,
    payload: &ControllerPayload,
) -> ControllerTemplateData {
    ControllerTemplateData {
        class_name,
        table: table.name().to_string(),
        route_name: payload.route_name.clone(),
        service: option_literal(payload.service.as_deref()),
        view_model: option_literal(payload.view_model.as_deref()),
        dto: option_literal(payload.dto.as_deref()),
    }
}
