//! Model builder: persistence-facing struct with mass-assignment lists.

use std::sync::Arc;

use serde::Serialize;

use super::{
    default_guarded, unbuilt, AttributePartition, ComponentBuilder, ComponentDefinition,
    ComponentKind, ComponentPayload, GenerateOptions,
};
use crate::error::Result;
use crate::schema::TableModel;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelPayload {
    /// Every column that is not guarded (hidden columns stay assignable).
    pub fillable: Vec<String>,
    pub hidden: Vec<String>,
    pub guarded: Vec<String>,
    /// Relation method names, taken verbatim from the options.
    pub relations: Vec<String>,
}

impl ModelPayload {
    /// Columns exposed on serialization: fillable minus hidden.
    pub fn visible(&self) -> impl Iterator<Item = &str> {
        self.fillable
            .iter()
            .filter(|c| !self.hidden.contains(c))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBuilder;

impl ComponentBuilder for ModelBuilder {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Model
    }

    fn build(&self, table: &Arc<TableModel>, options: &GenerateOptions) -> Result<ComponentDefinition> {
        let guarded = options.guarded.clone().unwrap_or_else(|| default_guarded(table));
        let hidden = options.hidden.clone().unwrap_or_default();
        let partition = AttributePartition::classify(table, &hidden, &guarded);

        let fillable = table
            .column_names()
            .filter(|c| !partition.guarded.iter().any(|g| g == c))
            .map(str::to_string)
            .collect();

        let payload = ModelPayload {
            fillable,
            hidden: partition.hidden,
            guarded: partition.guarded,
            relations: options.relations.clone(),
        };
        Ok(unbuilt(ComponentKind::Model, table, options).complete(ComponentPayload::Model(payload)))
    }
}
