//! # Components Module
//!
//! Builders turning a [`TableModel`] plus [`GenerateOptions`] into
//! [`ComponentDefinition`]s, one builder per output kind.
//!
//! A definition starts *unbuilt* (identity only) and becomes *built* exactly
//! once, when its builder attaches the kind-specific payload. Only built
//! definitions serialize; everything downstream (cache, plugins) relies on
//! that.
//!
//! Builders are pure: no I/O and no shared state. The table model is shared
//! read-only through an [`Arc`].

use std::fmt;
use std::sync::Arc;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::error::{Error, Result};
use crate::schema::TableModel;

pub mod controller;
pub mod dto;
pub mod model;
pub mod naming;
pub mod options;
pub mod service;
pub mod view_model;

#[cfg(test)]
mod tests;

pub use controller::{ControllerBuilder, ControllerPayload};
pub use dto::{AttributeMapping, DtoBuilder, DtoPayload};
pub use model::{ModelBuilder, ModelPayload};
pub use options::{GenerateOptions, RuleOverrides, TableOverrides, DEFAULT_NAMESPACE};
pub use service::{ActionKind, ServiceBuilder, ServicePayload};
pub use view_model::{FieldRule, ViewModelBuilder, ViewModelPayload};

/// Output kind of a generated component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Model,
    Dto,
    ViewModel,
    Service,
    Controller,
}

impl ComponentKind {
    /// Every kind, in dependency order (a controller refers to the others).
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Model,
        ComponentKind::Dto,
        ComponentKind::ViewModel,
        ComponentKind::Service,
        ComponentKind::Controller,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Model => "model",
            ComponentKind::Dto => "dto",
            ComponentKind::ViewModel => "view_model",
            ComponentKind::Service => "service",
            ComponentKind::Controller => "controller",
        }
    }

    /// Namespace segment(s) appended to the root namespace for this kind.
    pub fn namespace_suffix(self) -> &'static str {
        match self {
            ComponentKind::Model => "models",
            ComponentKind::Dto => "dto",
            ComponentKind::ViewModel => "http::view_models",
            ComponentKind::Service => "services",
            ComponentKind::Controller => "http::controllers",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific content of a built definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentPayload {
    Model(ModelPayload),
    Dto(DtoPayload),
    ViewModel(ViewModelPayload),
    Service(ServicePayload),
    Controller(ControllerPayload),
}

impl ComponentPayload {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentPayload::Model(_) => ComponentKind::Model,
            ComponentPayload::Dto(_) => ComponentKind::Dto,
            ComponentPayload::ViewModel(_) => ComponentKind::ViewModel,
            ComponentPayload::Service(_) => ComponentKind::Service,
            ComponentPayload::Controller(_) => ComponentKind::Controller,
        }
    }
}

/// One generated artifact: identity plus, once built, its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDefinition {
    kind: ComponentKind,
    class_name: String,
    namespace: String,
    module: Option<String>,
    table: Arc<TableModel>,
    payload: Option<ComponentPayload>,
}

impl ComponentDefinition {
    /// Unbuilt definition for `table`.
    pub fn new(
        kind: ComponentKind,
        class_name: impl Into<String>,
        namespace: impl Into<String>,
        table: Arc<TableModel>,
    ) -> Self {
        Self {
            kind,
            class_name: class_name.into(),
            namespace: namespace.into(),
            module: None,
            table,
            payload: None,
        }
    }

    /// Tag the definition with a module name passed along to plugins.
    pub fn with_module(mut self, module: Option<String>) -> Self {
        self.module = module.filter(|m| !m.trim().is_empty());
        self
    }

    /// Attach the payload, moving the definition to the built state.
    pub(crate) fn complete(mut self, payload: ComponentPayload) -> Self {
        debug_assert_eq!(payload.kind(), self.kind);
        debug_assert!(self.payload.is_none(), "component built twice");
        self.payload = Some(payload);
        self
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn table(&self) -> &TableModel {
        &self.table
    }

    /// Shared handle to the source table.
    pub fn table_handle(&self) -> Arc<TableModel> {
        Arc::clone(&self.table)
    }

    pub fn is_built(&self) -> bool {
        self.payload.is_some()
    }

    /// `namespace::ClassName`
    pub fn qualified_name(&self) -> String {
        naming::qualify(&self.namespace, &self.class_name)
    }

    /// The payload, or [`Error::Build`] while the definition is unbuilt.
    pub fn payload(&self) -> Result<&ComponentPayload> {
        self.payload.as_ref().ok_or_else(|| self.build_error())
    }

    /// Fail with [`Error::Build`] unless the definition is built.
    pub fn ensure_built(&self) -> Result<()> {
        self.payload().map(|_| ())
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// [`Error::Build`] when the definition is unbuilt; the check happens
    /// before serialization starts.
    pub fn to_json(&self) -> Result<String> {
        self.ensure_built()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn build_error(&self) -> Error {
        Error::Build {
            kind: self.kind.to_string(),
            class: self.class_name.clone(),
        }
    }
}

#[derive(Serialize)]
struct BuiltComponent<'a> {
    kind: ComponentKind,
    class_name: &'a str,
    namespace: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<&'a str>,
    table: &'a str,
    payload: &'a ComponentPayload,
}

impl Serialize for ComponentDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let payload = self
            .payload
            .as_ref()
            .ok_or_else(|| S::Error::custom(self.build_error()))?;
        BuiltComponent {
            kind: self.kind,
            class_name: &self.class_name,
            namespace: &self.namespace,
            module: self.module.as_deref(),
            table: self.table.name(),
            payload,
        }
        .serialize(serializer)
    }
}

/// Produces one kind of [`ComponentDefinition`] from a table.
pub trait ComponentBuilder {
    fn kind(&self) -> ComponentKind;

    /// Build a definition for `table`.
    ///
    /// The returned definition is always built.
    fn build(&self, table: &Arc<TableModel>, options: &GenerateOptions) -> Result<ComponentDefinition>;
}

/// Default builder for `kind`.
pub fn builder_for(kind: ComponentKind) -> Box<dyn ComponentBuilder> {
    match kind {
        ComponentKind::Model => Box::new(ModelBuilder),
        ComponentKind::Dto => Box::new(DtoBuilder),
        ComponentKind::ViewModel => Box::new(ViewModelBuilder),
        ComponentKind::Service => Box::new(ServiceBuilder),
        ComponentKind::Controller => Box::new(ControllerBuilder::default()),
    }
}

/// Unbuilt definition carrying the conventional class name and namespace.
pub(crate) fn unbuilt(
    kind: ComponentKind,
    table: &Arc<TableModel>,
    options: &GenerateOptions,
) -> ComponentDefinition {
    ComponentDefinition::new(
        kind,
        options.class_name_for(kind, table.name()),
        options.namespace_for(kind),
        Arc::clone(table),
    )
    .with_module(options.sub_namespace.clone())
}

/// Columns split into three disjoint sets, each in table column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributePartition {
    pub visible: Vec<String>,
    pub hidden: Vec<String>,
    pub guarded: Vec<String>,
}

impl AttributePartition {
    /// Classify every column of `table`.
    ///
    /// A column named in both lists is guarded; names that are not columns
    /// of the table are ignored.
    pub fn classify(table: &TableModel, hidden: &[String], guarded: &[String]) -> Self {
        for name in hidden.iter().chain(guarded) {
            if table.column(name).is_none() {
                warn!(table = table.name(), column = %name, "Ignoring unknown column in attribute list");
            }
        }
        let mut partition = Self::default();
        for column in table.column_names() {
            let owned = column.to_string();
            if guarded.iter().any(|g| g == column) {
                partition.guarded.push(owned);
            } else if hidden.iter().any(|h| h == column) {
                partition.hidden.push(owned);
            } else {
                partition.visible.push(owned);
            }
        }
        partition
    }
}

/// Guarded columns when the caller does not name any: the primary key of an
/// auto-incrementing table.
pub(crate) fn default_guarded(table: &TableModel) -> Vec<String> {
    match table.primary_key() {
        Some(pk) if table.increments() => vec![pk.to_string()],
        _ => Vec::new(),
    }
}
