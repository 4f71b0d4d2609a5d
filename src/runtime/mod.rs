//! # Runtime Module
//!
//! Request-time counterparts of generated services and view models: action
//! dispatch against a declared contract, and validation of JSON input with
//! the generated rule expressions.

mod service;
mod validation;
mod view_model;

pub use crate::components::ActionKind;
pub use service::{ServiceContract, ServiceHandler};
pub use validation::{validate_value, FieldOutcome, ValidationReport};
pub use view_model::{Anonymous, AuthContext, AuthenticatedUser, InputSource, ViewModel};
