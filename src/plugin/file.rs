//! Source file emitter.

use std::path::{Path, PathBuf};

use tracing::info;

use super::paths::component_path;
use super::templates::{Renderer, TemplateRenderer};
use super::{write_file, EmitOutcome, Plugin};
use crate::components::ComponentDefinition;
use crate::error::Result;

/// Renders components to `.rs` files under an output directory.
///
/// Existing files are left alone unless `force` is set, so hand edits to
/// generated code survive a rerun.
#[derive(Debug, Clone)]
pub struct FilePlugin<R = TemplateRenderer> {
    output: PathBuf,
    force: bool,
    renderer: R,
}

impl FilePlugin {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self::with_renderer(output, TemplateRenderer)
    }
}

impl<R: Renderer> FilePlugin<R> {
    pub fn with_renderer(output: impl Into<PathBuf>, renderer: R) -> Self {
        Self {
            output: output.into(),
            force: false,
            renderer,
        }
    }

    /// Overwrite existing files.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Where `component` is written.
    pub fn target(&self, component: &ComponentDefinition) -> PathBuf {
        component_path(&self.output, component.namespace(), component.class_name())
    }
}

impl<R: Renderer> Plugin for FilePlugin<R> {
    fn emit(&self, component: &ComponentDefinition, module: Option<&str>) -> Result<EmitOutcome> {
        component.ensure_built()?;
        let path = self.target(component);
        if path.exists() && !self.force {
            info!(path = %path.display(), "Skipping existing file");
            return Ok(EmitOutcome::Skipped(path));
        }
        let source = self.renderer.render(component)?;
        write_file(&path, source)?;
        info!(
            path = %path.display(),
            class = component.class_name(),
            module = module.unwrap_or_default(),
            "Generated {}",
            component.kind()
        );
        Ok(EmitOutcome::Written(path))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::sync::Arc;

    use super::*;
    use crate::components::{builder_for, ComponentKind, GenerateOptions};
    use crate::error::Error;
    use crate::schema::{ColumnDefinition, NativeType, TableModel, TableModelRecord};

    fn table() -> Arc<TableModel> {
        Arc::new(
            TableModel::try_from(TableModelRecord {
                name: "invoices".into(),
                primary_key: Some("id".into()),
                columns: vec![
                    ColumnDefinition::new("id", NativeType::BigInt).primary_key(),
                    ColumnDefinition::new("total", NativeType::Decimal {
                        precision: Some(10),
                        scale: Some(2),
                    }),
                ],
                increments: true,
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn writes_under_aligned_path_and_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let options = GenerateOptions {
            sub_namespace: Some("billing".into()),
            ..Default::default()
        };
        let def = builder_for(ComponentKind::Model).build(&table(), &options).unwrap();
        let plugin = FilePlugin::new(dir.path().join("src"));

        let written = plugin.emit(&def, def.module()).unwrap();
        let expected = dir.path().join("src/models/billing/invoice.rs");
        assert_eq!(written, EmitOutcome::Written(expected.clone()));
        assert!(std::fs::read_to_string(&expected)
            .unwrap()
            .contains("pub total: f64,"));

        std::fs::write(&expected, "// edited").unwrap();
        assert_eq!(
            plugin.emit(&def, def.module()).unwrap(),
            EmitOutcome::Skipped(expected.clone())
        );
        assert_eq!(std::fs::read_to_string(&expected).unwrap(), "// edited");

        let forced = plugin.clone().force(true);
        assert!(matches!(forced.emit(&def, None).unwrap(), EmitOutcome::Written(_)));
        assert_ne!(std::fs::read_to_string(&expected).unwrap(), "// edited");
    }

    #[test]
    fn unbuilt_component_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let def = ComponentDefinition::new(ComponentKind::Dto, "InvoiceDto", "app::dto", table());
        let plugin = FilePlugin::new(dir.path());
        assert!(matches!(plugin.emit(&def, None), Err(Error::Build { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
