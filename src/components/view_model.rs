//! ViewModel builder: per-field validation rules for create and update requests.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::{
    default_guarded, unbuilt, ComponentBuilder, ComponentDefinition, ComponentKind,
    ComponentPayload, GenerateOptions,
};
use crate::error::Result;
use crate::rules::{column_rule, RuleExpression, RuleMode};
use crate::schema::TableModel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    pub field: String,
    pub rule: RuleExpression,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewModelPayload {
    pub create_rules: Vec<FieldRule>,
    /// `None` when one rule set serves both actions.
    pub update_rules: Option<Vec<FieldRule>>,
    pub single_action: bool,
}

impl ViewModelPayload {
    /// Rules for `mode`; single-action view models answer with the shared set.
    pub fn rules(&self, mode: RuleMode) -> &[FieldRule] {
        match (mode, &self.update_rules) {
            (RuleMode::Update, Some(update)) => update,
            _ => &self.create_rules,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewModelBuilder;

impl ViewModelBuilder {
    fn rules_for(
        table: &TableModel,
        fields: &[String],
        mode: RuleMode,
        overrides: &BTreeMap<String, String>,
    ) -> Vec<FieldRule> {
        let mut rules: Vec<FieldRule> = fields
            .iter()
            .filter_map(|field| table.column(field))
            .map(|column| FieldRule {
                field: column.name.clone(),
                rule: match overrides.get(&column.name) {
                    Some(expr) => RuleExpression::parse(expr),
                    None => column_rule(table, column, mode),
                },
            })
            .collect();
        // Overrides for fields that are not derived columns are appended as-is.
        for (field, expr) in overrides {
            if !fields.contains(field) {
                rules.push(FieldRule {
                    field: field.clone(),
                    rule: RuleExpression::parse(expr),
                });
            }
        }
        rules
    }
}

impl ComponentBuilder for ViewModelBuilder {
    fn kind(&self) -> ComponentKind {
        ComponentKind::ViewModel
    }

    fn build(&self, table: &Arc<TableModel>, options: &GenerateOptions) -> Result<ComponentDefinition> {
        let guarded = options.guarded.clone().unwrap_or_else(|| default_guarded(table));
        let fields: Vec<String> = table
            .column_names()
            .filter(|c| !table.is_primary_key(c) && !guarded.iter().any(|g| g == c))
            .map(str::to_string)
            .collect();

        let create_rules = Self::rules_for(table, &fields, RuleMode::Create, &options.rules.create);
        let update_rules = (!options.single_action)
            .then(|| Self::rules_for(table, &fields, RuleMode::Update, &options.rules.update));

        let payload = ViewModelPayload {
            create_rules,
            update_rules,
            single_action: options.single_action,
        };
        Ok(unbuilt(ComponentKind::ViewModel, table, options)
            .complete(ComponentPayload::ViewModel(payload)))
    }
}
