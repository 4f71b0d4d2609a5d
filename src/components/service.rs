//! Service builder: binds a model and declares the accepted actions.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    unbuilt, ComponentBuilder, ComponentDefinition, ComponentKind, ComponentPayload,
    GenerateOptions,
};
use crate::error::{Error, Result};
use crate::schema::TableModel;

/// Request-level operation a service may handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    Select,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Create,
        ActionKind::Update,
        ActionKind::Delete,
        ActionKind::Select,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::Select => "select",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(ActionKind::Create),
            "update" => Ok(ActionKind::Update),
            "delete" => Ok(ActionKind::Delete),
            "select" => Ok(ActionKind::Select),
            other => Err(Error::Config(format!("unknown action kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePayload {
    /// Qualified model class the service operates on.
    pub model_class: String,
    pub actions: BTreeSet<ActionKind>,
}

impl ServicePayload {
    pub fn supports(&self, action: ActionKind) -> bool {
        self.actions.contains(&action)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceBuilder;

impl ComponentBuilder for ServiceBuilder {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Service
    }

    fn build(&self, table: &Arc<TableModel>, options: &GenerateOptions) -> Result<ComponentDefinition> {
        let model_class = options
            .model_class
            .clone()
            .unwrap_or_else(|| options.generated_reference(ComponentKind::Model, table.name()));
        let actions = match &options.actions {
            Some(actions) => actions.iter().copied().collect(),
            None => ActionKind::ALL.into_iter().collect(),
        };
        let payload = ServicePayload {
            model_class,
            actions,
        };
        Ok(unbuilt(ComponentKind::Service, table, options).complete(ComponentPayload::Service(payload)))
    }
}
