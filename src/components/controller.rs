//! Controller builder: wires service, view model and DTO behind a route.

use std::sync::Arc;

use serde::Serialize;

use super::naming::{create_route_name, FALLBACK_CONTROLLER_NAME};
use super::{
    unbuilt, ComponentBuilder, ComponentDefinition, ComponentKind, ComponentPayload,
    GenerateOptions,
};
use crate::error::Result;
use crate::schema::TableModel;

/// Bound references; an absent one makes the generated handler pass the
/// request through unchanged for that concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControllerPayload {
    pub service: Option<String>,
    pub view_model: Option<String>,
    pub dto: Option<String>,
    pub route_name: String,
}

#[derive(Debug, Clone)]
pub struct ControllerBuilder {
    fallback_name: String,
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self {
            fallback_name: FALLBACK_CONTROLLER_NAME.to_string(),
        }
    }
}

impl ControllerBuilder {
    /// Use `name` instead of [`FALLBACK_CONTROLLER_NAME`] for blank controller names.
    pub fn with_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = name.into();
        self
    }

    pub fn fallback_name(&self) -> &str {
        &self.fallback_name
    }
}

impl ComponentBuilder for ControllerBuilder {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Controller
    }

    fn build(&self, table: &Arc<TableModel>, options: &GenerateOptions) -> Result<ComponentDefinition> {
        let mut definition = unbuilt(ComponentKind::Controller, table, options);
        // An explicitly blank name falls back; an absent one follows the table.
        if let Some(name) = &options.controller_name {
            let name = name.trim();
            let class = if name.is_empty() { self.fallback_name.as_str() } else { name };
            definition = ComponentDefinition::new(
                ComponentKind::Controller,
                class,
                definition.namespace(),
                Arc::clone(table),
            )
            .with_module(options.sub_namespace.clone());
        }
        let route_name = create_route_name(definition.class_name(), &self.fallback_name);

        let payload = ControllerPayload {
            service: options.service_class.clone(),
            view_model: options.view_model_class.clone(),
            dto: options.dto_class.clone(),
            route_name,
        };
        Ok(definition.complete(ComponentPayload::Controller(payload)))
    }
}
