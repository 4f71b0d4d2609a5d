//! Generation request options consumed by the component builders.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::service::ActionKind;
use super::ComponentKind;
use super::naming::{qualify, singular, to_pascal_case};

/// Namespace used when the caller does not name one.
pub const DEFAULT_NAMESPACE: &str = "app";

/// Per-field rule overrides, replacing the derived expression verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOverrides {
    #[serde(default)]
    pub create: BTreeMap<String, String>,
    #[serde(default)]
    pub update: BTreeMap<String, String>,
}

/// Options for one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Root namespace, e.g. `app` or `crate::domain`.
    pub namespace: String,
    /// Optional module tag appended to every component namespace.
    pub sub_namespace: Option<String>,
    pub rules: RuleOverrides,
    /// External key -> column name map for DTOs.
    pub attributes: Option<BTreeMap<String, String>>,
    /// Replaces the builder's default hidden set when present.
    pub hidden: Option<Vec<String>>,
    /// Replaces the builder's default guarded set when present.
    pub guarded: Option<Vec<String>>,
    /// Relation method names declared on the model.
    pub relations: Vec<String>,
    pub model_class: Option<String>,
    pub service_class: Option<String>,
    pub view_model_class: Option<String>,
    pub dto_class: Option<String>,
    /// Controller name; derived from the table when absent.
    pub controller_name: Option<String>,
    /// Actions the service accepts; all four when absent.
    pub actions: Option<Vec<ActionKind>>,
    pub single_action: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            sub_namespace: None,
            rules: RuleOverrides::default(),
            attributes: None,
            hidden: None,
            guarded: None,
            relations: Vec::new(),
            model_class: None,
            service_class: None,
            view_model_class: None,
            dto_class: None,
            controller_name: None,
            actions: None,
            single_action: false,
        }
    }
}

/// Per-table overrides layered on top of [`GenerateOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOverrides {
    pub rules: Option<RuleOverrides>,
    pub attributes: Option<BTreeMap<String, String>>,
    pub hidden: Option<Vec<String>>,
    pub guarded: Option<Vec<String>>,
    pub relations: Option<Vec<String>>,
    pub controller_name: Option<String>,
    pub actions: Option<Vec<ActionKind>>,
    pub single_action: Option<bool>,
}

impl GenerateOptions {
    /// Copy of these options with `overrides` applied.
    pub fn merged(&self, overrides: &TableOverrides) -> Self {
        let mut merged = self.clone();
        if let Some(rules) = &overrides.rules {
            merged.rules = rules.clone();
        }
        if overrides.attributes.is_some() {
            merged.attributes = overrides.attributes.clone();
        }
        if overrides.hidden.is_some() {
            merged.hidden = overrides.hidden.clone();
        }
        if overrides.guarded.is_some() {
            merged.guarded = overrides.guarded.clone();
        }
        if let Some(relations) = &overrides.relations {
            merged.relations = relations.clone();
        }
        if overrides.controller_name.is_some() {
            merged.controller_name = overrides.controller_name.clone();
        }
        if overrides.actions.is_some() {
            merged.actions = overrides.actions.clone();
        }
        if let Some(single_action) = overrides.single_action {
            merged.single_action = single_action;
        }
        merged
    }

    /// Namespace a component of `kind` lives in.
    pub fn namespace_for(&self, kind: ComponentKind) -> String {
        let mut ns = qualify(&self.namespace, kind.namespace_suffix());
        if let Some(sub) = self.sub_namespace.as_deref().filter(|s| !s.trim().is_empty()) {
            ns = qualify(&ns, sub.trim());
        }
        ns
    }

    /// Class name the builder for `kind` gives to `table`.
    pub fn class_name_for(&self, kind: ComponentKind, table: &str) -> String {
        let entity = to_pascal_case(&singular(table));
        match kind {
            ComponentKind::Model => entity,
            ComponentKind::Dto => format!("{entity}Dto"),
            ComponentKind::ViewModel => format!("{entity}ViewModel"),
            ComponentKind::Service => format!("{entity}Service"),
            ComponentKind::Controller => format!("{}Controller", to_pascal_case(table)),
        }
    }

    /// Fully qualified reference to the generated `kind` component of `table`.
    pub fn generated_reference(&self, kind: ComponentKind, table: &str) -> String {
        qualify(&self.namespace_for(kind), &self.class_name_for(kind, table))
    }

    /// Bind every sibling reference that is not already set to the component
    /// generated for `table` in the same batch.
    pub fn bind_generated(&self, table: &str, kinds: &[ComponentKind]) -> Self {
        let mut bound = self.clone();
        let reference = |kind| kinds.contains(&kind).then(|| self.generated_reference(kind, table));
        if bound.model_class.is_none() {
            bound.model_class = reference(ComponentKind::Model);
        }
        if bound.service_class.is_none() {
            bound.service_class = reference(ComponentKind::Service);
        }
        if bound.view_model_class.is_none() {
            bound.view_model_class = reference(ComponentKind::ViewModel);
        }
        if bound.dto_class.is_none() {
            bound.dto_class = reference(ComponentKind::Dto);
        }
        bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_follow_kind_and_sub_namespace() {
        let mut options = GenerateOptions::default();
        assert_eq!(options.namespace_for(ComponentKind::Model), "app::models");
        assert_eq!(
            options.namespace_for(ComponentKind::Controller),
            "app::http::controllers"
        );
        options.sub_namespace = Some("billing".into());
        assert_eq!(options.namespace_for(ComponentKind::Dto), "app::dto::billing");
    }

    #[test]
    fn class_names_per_kind() {
        let options = GenerateOptions::default();
        assert_eq!(options.class_name_for(ComponentKind::Model, "posts"), "Post");
        assert_eq!(options.class_name_for(ComponentKind::Dto, "blog_posts"), "BlogPostDto");
        assert_eq!(
            options.class_name_for(ComponentKind::Controller, "people"),
            "PeopleController"
        );
    }

    #[test]
    fn bind_generated_keeps_explicit_references() {
        let options = GenerateOptions {
            service_class: Some("crate::custom::PostService".into()),
            ..Default::default()
        };
        let bound = options.bind_generated(
            "posts",
            &[ComponentKind::Model, ComponentKind::Service, ComponentKind::Controller],
        );
        assert_eq!(bound.model_class.as_deref(), Some("app::models::Post"));
        assert_eq!(bound.service_class.as_deref(), Some("crate::custom::PostService"));
        assert!(bound.dto_class.is_none());
        assert!(bound.view_model_class.is_none());
    }

    #[test]
    fn table_overrides_replace_only_what_they_set() {
        let base = GenerateOptions {
            hidden: Some(vec!["password".into()]),
            relations: vec!["author".into()],
            ..Default::default()
        };
        let merged = base.merged(&TableOverrides {
            relations: Some(vec!["tags".into()]),
            single_action: Some(true),
            ..Default::default()
        });
        assert_eq!(merged.hidden, Some(vec!["password".to_string()]));
        assert_eq!(merged.relations, vec!["tags".to_string()]);
        assert!(merged.single_action);
    }
}
