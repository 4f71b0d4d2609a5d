//! Request view models composed from input and authentication capabilities.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::validation::{validate_value, ValidationReport};
use crate::components::{FieldRule, ViewModelPayload};
use crate::rules::RuleMode;

/// Read access to request input.
pub trait InputSource {
    fn value(&self, key: &str) -> Option<&Value>;

    fn has(&self, key: &str) -> bool {
        self.value(key).is_some()
    }
}

impl InputSource for Map<String, Value> {
    fn value(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl InputSource for BTreeMap<String, Value> {
    fn value(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl InputSource for Value {
    fn value(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(key))
    }
}

/// Identity of the caller, when there is one.
pub trait AuthContext {
    fn user_id(&self) -> Option<&str>;

    fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }
}

/// Unauthenticated caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl AuthContext for Anonymous {
    fn user_id(&self) -> Option<&str> {
        None
    }
}

/// Caller known by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl AuthContext for AuthenticatedUser {
    fn user_id(&self) -> Option<&str> {
        Some(&self.0)
    }
}

/// Rules of a generated view model bound to one request.
///
/// Input and authentication are held as separate capabilities and reached
/// through explicit calls; the view model adds validation on top.
#[derive(Debug, Clone)]
pub struct ViewModel<I, A = Anonymous> {
    input: I,
    auth: A,
    rules: ViewModelPayload,
}

impl<I: InputSource, A: AuthContext> ViewModel<I, A> {
    pub fn new(rules: ViewModelPayload, input: I, auth: A) -> Self {
        Self { input, auth, rules }
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.input.value(key)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.auth.user_id()
    }

    pub fn rules(&self, mode: RuleMode) -> &[FieldRule] {
        self.rules.rules(mode)
    }

    /// Validate the input against the create or update rules.
    pub fn validate(&self, mode: RuleMode) -> ValidationReport {
        let mut report = ValidationReport::default();
        for FieldRule { field, rule } in self.rules(mode) {
            report.record(field, validate_value(rule, self.input.value(field)));
        }
        report
    }

    /// Input restricted to fields that carry a rule.
    pub fn validated(&self, mode: RuleMode) -> Map<String, Value> {
        self.rules(mode)
            .iter()
            .filter_map(|r| self.input.value(&r.field).map(|v| (r.field.clone(), v.clone())))
            .collect()
    }
}
