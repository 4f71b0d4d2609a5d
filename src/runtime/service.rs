//! Request-time dispatch for generated services.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::warn;

use crate::components::{ActionKind, ComponentDefinition, ComponentPayload};
use crate::error::{Error, Result};

/// Name and accepted actions of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContract {
    name: String,
    actions: BTreeSet<ActionKind>,
}

impl ServiceContract {
    pub fn new(name: impl Into<String>, actions: impl IntoIterator<Item = ActionKind>) -> Self {
        Self {
            name: name.into(),
            actions: actions.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &BTreeSet<ActionKind> {
        &self.actions
    }

    /// # Errors
    ///
    /// [`Error::UnsupportedAction`] naming the action and this service.
    pub fn check(&self, action: ActionKind) -> Result<()> {
        if self.actions.contains(&action) {
            Ok(())
        } else {
            warn!(service = %self.name, %action, "Rejected unsupported action");
            Err(Error::unsupported_action(action, &self.name))
        }
    }
}

impl TryFrom<&ComponentDefinition> for ServiceContract {
    type Error = Error;

    /// Contract declared by a built service definition.
    fn try_from(definition: &ComponentDefinition) -> Result<Self> {
        match definition.payload()? {
            ComponentPayload::Service(payload) => Ok(Self::new(
                definition.qualified_name(),
                payload.actions.iter().copied(),
            )),
            other => Err(Error::Config(format!(
                "{} is a {}, not a service",
                definition.qualified_name(),
                other.kind()
            ))),
        }
    }
}

/// A service able to execute actions on JSON input.
pub trait ServiceHandler {
    fn contract(&self) -> &ServiceContract;

    /// Execute an action already known to be supported.
    fn handle(&self, action: ActionKind, input: &Value) -> Result<Value>;

    /// Check `action` against the contract, then [`handle`](Self::handle) it.
    ///
    /// An unsupported action fails this request only; the handler stays usable.
    fn dispatch(&self, action: ActionKind, input: &Value) -> Result<Value> {
        self.contract().check(action)?;
        self.handle(action, input)
    }
}
