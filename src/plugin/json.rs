//! Serialized definition emitter, for tooling that consumes the model
//! rather than the generated source.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{write_file, EmitOutcome, Plugin};
use crate::components::ComponentDefinition;
use crate::error::Result;

/// Writes `<output>/<kind>[/<module>]/<Class>.json`, always overwriting.
#[derive(Debug, Clone)]
pub struct JsonPlugin {
    output: PathBuf,
}

impl JsonPlugin {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Plugin for JsonPlugin {
    fn emit(&self, component: &ComponentDefinition, module: Option<&str>) -> Result<EmitOutcome> {
        let json = component.to_json()?;
        let mut dir = self.output.join(component.kind().as_str());
        if let Some(module) = module {
            dir.push(module);
        }
        let path = dir.join(format!("{}.json", component.class_name()));
        write_file(&path, json)?;
        info!(path = %path.display(), class = component.class_name(), "Wrote definition");
        Ok(EmitOutcome::Written(path))
    }
}
