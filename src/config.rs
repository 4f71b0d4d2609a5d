//! Generator configuration file
//!
//! Optional `schemaforge.toml` (or `.yaml` / `.yml`) next to where the
//! generator runs:
//!
//! ```toml
//! [connection]
//! driver = "sqlite"
//! dbname = "database/app.sqlite"
//!
//! [generate]
//! namespace = "app"
//! output = "src"
//! components = ["model", "dto", "controller"]
//! exclude = ["^legacy_"]
//! hidden = ["password"]
//!
//! [cache]
//! root = ".schemaforge"
//!
//! [tables.posts]
//! relations = ["author", "tags"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::cache::DEFAULT_CACHE_DIR;
use crate::components::{ComponentKind, GenerateOptions, TableOverrides};
use crate::error::{Error, IoErrorKind, Result};

/// File names probed, in order, when no path is given.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["schemaforge.toml", "schemaforge.yaml", "schemaforge.yml"];

/// `[connection]`: driver option keys with scalar values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ConnectionSection(BTreeMap<String, Value>);

impl ConnectionSection {
    /// Value of `key` as a string; numbers and booleans are stringified.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// `[generate]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenerateSection {
    #[serde(flatten)]
    pub options: GenerateOptions,
    /// Source output directory.
    pub output: Option<PathBuf>,
    /// Component kinds to build; all when empty.
    pub components: Vec<ComponentKind>,
    /// Extra table exclusion patterns, on top of the defaults.
    pub exclude: Vec<String>,
    pub force: bool,
    /// Also write JSON definitions under this directory.
    pub json_output: Option<PathBuf>,
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub root: PathBuf,
    pub enabled: bool,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_CACHE_DIR),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub connection: ConnectionSection,
    pub generate: GenerateSection,
    pub cache: CacheSection,
    /// Per-table overrides keyed by table name.
    pub tables: BTreeMap<String, TableOverrides>,
}

/// Load a configuration file
///
/// The format follows the extension: `.yaml` / `.yml` are YAML, anything
/// else TOML.
///
/// # Returns
///
/// `Ok(None)` if the file doesn't exist (not an error), `Err` if it exists but
/// cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<Option<GeneratorConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        std::fs::read_to_string(path).map_err(|e| Error::io(IoErrorKind::Readable, path, e))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    let parsed = if is_yaml {
        serde_yaml::from_str(&contents).map_err(|e| e.to_string())
    } else {
        toml::from_str(&contents).map_err(|e| e.to_string())
    };
    parsed
        .map(Some)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Resolve the configuration path
///
/// Priority:
/// 1. Explicitly provided path (via CLI), whether or not it exists
/// 2. First of [`CONFIG_FILE_NAMES`] present in `dir`
/// 3. None (no config)
pub fn resolve_config_path(explicit: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Environment variable consulted for a driver option key.
pub fn env_key(key: &str) -> String {
    match key {
        "connectionURL" | "url" => "DB_URL".to_string(),
        other => format!("DB_{}", other.to_ascii_uppercase()),
    }
}

/// Fallback for driver option resolution: the `[connection]` section, then
/// `env` under [`env_key`].
pub fn fallback_lookup<'a, E>(config: Option<&'a GeneratorConfig>, env: E) -> impl Fn(&str) -> Option<String> + 'a
where
    E: Fn(&str) -> Option<String> + 'a,
{
    move |key| {
        config
            .and_then(|c| c.connection.get(key))
            .or_else(|| env(&env_key(key)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::components::ActionKind;
    use tempfile::tempdir;

    const TOML: &str = r#"
[connection]
driver = "mysql"
host = "db.internal"
port = 3306

[generate]
namespace = "crate::domain"
sub_namespace = "blog"
output = "src"
components = ["model", "controller"]
exclude = ["^legacy_"]
hidden = ["password"]
force = true

[generate.rules.create]
slug = "required|alpha_dash"

[cache]
enabled = false

[tables.posts]
relations = ["author"]
actions = ["select"]
"#;

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_config(&dir.path().join("schemaforge.toml")).unwrap().is_none());
    }

    #[test]
    fn parses_toml_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schemaforge.toml");
        std::fs::write(&path, TOML).unwrap();
        let config = load_config(&path).unwrap().unwrap();

        assert_eq!(config.connection.get("port").as_deref(), Some("3306"));
        let generate = &config.generate;
        assert_eq!(generate.options.namespace, "crate::domain");
        assert_eq!(generate.options.sub_namespace.as_deref(), Some("blog"));
        assert_eq!(generate.options.hidden, Some(vec!["password".to_string()]));
        assert_eq!(generate.options.rules.create["slug"], "required|alpha_dash");
        assert_eq!(generate.components, vec![ComponentKind::Model, ComponentKind::Controller]);
        assert!(generate.force);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.root, PathBuf::from(DEFAULT_CACHE_DIR));
        assert_eq!(config.tables["posts"].actions, Some(vec![ActionKind::Select]));
    }

    #[test]
    fn parses_yaml_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schemaforge.yml");
        std::fs::write(&path, "generate:\n  namespace: billing\n  single_action: true\n").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.generate.options.namespace, "billing");
        assert!(config.generate.options.single_action);
        assert!(config.cache.enabled);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schemaforge.toml");
        std::fs::write(&path, "[generate\nnamespace=").unwrap();
        assert!(matches!(load_config(&path), Err(Error::Config(_))));
    }

    #[test]
    fn config_path_priority() {
        let dir = tempdir().unwrap();
        assert_eq!(resolve_config_path(None, dir.path()), None);
        std::fs::write(dir.path().join("schemaforge.yaml"), "").unwrap();
        assert_eq!(
            resolve_config_path(None, dir.path()),
            Some(dir.path().join("schemaforge.yaml"))
        );
        let explicit = dir.path().join("custom.toml");
        assert_eq!(resolve_config_path(Some(&explicit), dir.path()), Some(explicit));
    }

    #[test]
    fn fallback_prefers_config_then_environment() {
        let config = GeneratorConfig {
            connection: serde_json::from_str(r#"{"host": "from-config"}"#).unwrap(),
            ..Default::default()
        };
        let env = |key: &str| match key {
            "DB_HOST" => Some("from-env".to_string()),
            "DB_USER" => Some("forge".to_string()),
            "DB_URL" => Some("sqlite:///tmp/app.db".to_string()),
            _ => None,
        };
        let lookup = fallback_lookup(Some(&config), env);
        assert_eq!(lookup("host").as_deref(), Some("from-config"));
        assert_eq!(lookup("user").as_deref(), Some("forge"));
        assert_eq!(lookup("connectionURL").as_deref(), Some("sqlite:///tmp/app.db"));
        assert_eq!(lookup("dbname"), None);
    }
}
