//! # Cache
//!
//! Persists table models and derived routes between runs so a second
//! generation can skip catalog introspection.
//!
//! Every [`Cacheable`] type owns one fixed file under the cache root
//! (`<root>/components.json`, `<root>/routes.json`). A missing file means
//! "no cache"; only an existing file that cannot be read is an error.
//! Writers are not coordinated: run one generation per cache root at a time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, IoErrorKind, Result};
use crate::schema::TableModel;

/// Directory used when no cache root is configured.
pub const DEFAULT_CACHE_DIR: &str = ".schemaforge";

/// A value the [`Cache`] can persist.
pub trait Cacheable: Serialize + DeserializeOwned {
    /// Logical key; also the file stem under the cache root.
    const KEY: &'static str;
}

/// Tables captured by the last introspection, with the namespace and the
/// exclude patterns they were generated under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentsCache {
    pub tables: Vec<TableModel>,
    pub namespace: String,
    #[serde(default)]
    pub sub_namespace: Option<String>,
    /// Sorted exclude patterns of the filter that selected `tables`.
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl ComponentsCache {
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(TableModel::name)
    }
}

impl Cacheable for ComponentsCache {
    const KEY: &'static str = "components";
}

/// One routable controller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Dash-delimited route token, e.g. `blog-posts`.
    pub name: String,
    /// URL path, e.g. `/blog-posts`.
    pub path: String,
    /// Qualified controller class.
    pub controller: String,
    /// Table the controller was generated for.
    #[serde(default)]
    pub table: String,
}

impl RouteDescriptor {
    pub fn new(table: impl Into<String>, name: impl Into<String>, controller: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: format!("/{name}"),
            name,
            controller: controller.into(),
            table: table.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutesCache {
    pub routes: Vec<RouteDescriptor>,
}

impl Cacheable for RoutesCache {
    const KEY: &'static str = "routes";
}

/// File-backed cache rooted at one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic file path for `T`.
    pub fn path_for<T: Cacheable>(&self) -> PathBuf {
        self.root.join(format!("{}.json", T::KEY))
    }

    /// Write `value`, replacing any previous entry of the same kind.
    ///
    /// The payload is serialized before the filesystem is touched, so a
    /// serialization failure leaves the previous entry in place.
    ///
    /// # Errors
    ///
    /// [`Error::Serialization`] or [`Error::Io`] with [`IoErrorKind::Writable`].
    pub fn dump<T: Cacheable>(&self, value: &T) -> Result<PathBuf> {
        let path = self.path_for::<T>();
        let bytes = serde_json::to_vec_pretty(value)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(IoErrorKind::Writable, parent, e))?;
        }
        fs::write(&path, bytes).map_err(|e| Error::io(IoErrorKind::Writable, &path, e))?;
        debug!(path = %path.display(), key = T::KEY, "Cache entry written");
        Ok(path)
    }

    /// Read the entry for `T`; `Ok(None)` when it was never written.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the entry exists but its metadata or content cannot
    /// be read, [`Error::Serialization`] when the content does not decode.
    pub fn load<T: Cacheable>(&self) -> Result<Option<T>> {
        let path = self.path_for::<T>();
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), key = T::KEY, "No cache entry");
                return Ok(None);
            }
            Err(e) => return Err(Error::io(IoErrorKind::Metadata, &path, e)),
        };
        if !metadata.is_file() {
            return Err(Error::io(
                IoErrorKind::Readable,
                &path,
                io::Error::other("not a regular file"),
            ));
        }
        let contents =
            fs::read_to_string(&path).map_err(|e| Error::io(IoErrorKind::Readable, &path, e))?;
        let value = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), key = T::KEY, "Cache hit");
        Ok(Some(value))
    }
}
