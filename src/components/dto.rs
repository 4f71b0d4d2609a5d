//! DTO builder: external key to column mapping for API payloads.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::naming::to_lower_camel_case;
use super::{
    unbuilt, AttributePartition, ComponentBuilder, ComponentDefinition, ComponentKind,
    ComponentPayload, GenerateOptions,
};
use crate::error::Result;
use crate::schema::TableModel;

/// `external` is the key seen by API clients, `internal` the column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeMapping {
    pub external: String,
    pub internal: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DtoPayload {
    /// Only visible columns appear here.
    pub attributes: Vec<AttributeMapping>,
    pub hidden: Vec<String>,
    pub guarded: Vec<String>,
}

impl DtoPayload {
    /// External key mapped to `column`, if the column is exposed.
    pub fn external_key(&self, column: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.internal == column)
            .map(|a| a.external.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DtoBuilder;

impl ComponentBuilder for DtoBuilder {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Dto
    }

    fn build(&self, table: &Arc<TableModel>, options: &GenerateOptions) -> Result<ComponentDefinition> {
        let guarded = options.guarded.clone().unwrap_or_default();
        let hidden = options.hidden.clone().unwrap_or_default();
        let partition = AttributePartition::classify(table, &hidden, &guarded);

        let attributes = match &options.attributes {
            Some(map) => map
                .iter()
                .filter(|(external, internal)| {
                    let exposed = partition.visible.contains(internal);
                    if !exposed {
                        warn!(
                            table = table.name(),
                            external = %external,
                            column = %internal,
                            "Dropping attribute that does not map to a visible column"
                        );
                    }
                    exposed
                })
                .map(|(external, internal)| AttributeMapping {
                    external: external.clone(),
                    internal: internal.clone(),
                })
                .collect(),
            None => partition
                .visible
                .iter()
                .map(|column| AttributeMapping {
                    external: to_lower_camel_case(column),
                    internal: column.clone(),
                })
                .collect(),
        };

        let payload = DtoPayload {
            attributes,
            hidden: partition.hidden,
            guarded: partition.guarded,
        };
        Ok(unbuilt(ComponentKind::Dto, table, options).complete(ComponentPayload::Dto(payload)))
    }
}
