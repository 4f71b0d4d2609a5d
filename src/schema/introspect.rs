//! Schema introspection: the catalog collaborator contract and the lazy
//! table walker built on top of it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// One column as reported by the catalog, type still in native spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumn {
    pub name: String,
    /// Declared type, e.g. `VARCHAR(255)` or `decimal(10,2)`.
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// Primary key as reported by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPrimaryKey {
    pub columns: Vec<String>,
    /// Whether the key is generated by the database.
    pub auto_increment: bool,
}

/// Foreign key as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawForeignKey {
    pub columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
}

/// Everything the catalog knows about one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTableDescriptor {
    pub name: String,
    pub columns: Vec<RawColumn>,
    pub primary_key: RawPrimaryKey,
    pub unique_keys: Vec<Vec<String>>,
    pub foreign_keys: Vec<RawForeignKey>,
}

/// Database client collaborator.
///
/// Implementations must surface client failures (including timeouts) as
/// errors rather than swallowing them.
pub trait CatalogSource {
    /// Names of all user tables, in a stable order.
    fn table_names(&self) -> Result<Vec<String>>;

    fn columns(&self, table: &str) -> Result<Vec<RawColumn>>;

    fn primary_key(&self, table: &str) -> Result<RawPrimaryKey>;

    fn unique_keys(&self, table: &str) -> Result<Vec<Vec<String>>>;

    fn foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>>;
}

impl<T: CatalogSource + ?Sized> CatalogSource for &T {
    fn table_names(&self) -> Result<Vec<String>> {
        (**self).table_names()
    }

    fn columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        (**self).columns(table)
    }

    fn primary_key(&self, table: &str) -> Result<RawPrimaryKey> {
        (**self).primary_key(table)
    }

    fn unique_keys(&self, table: &str) -> Result<Vec<Vec<String>>> {
        (**self).unique_keys(table)
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>> {
        (**self).foreign_keys(table)
    }
}

impl<T: CatalogSource + ?Sized> CatalogSource for Box<T> {
    fn table_names(&self) -> Result<Vec<String>> {
        (**self).table_names()
    }

    fn columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        (**self).columns(table)
    }

    fn primary_key(&self, table: &str) -> Result<RawPrimaryKey> {
        (**self).primary_key(table)
    }

    fn unique_keys(&self, table: &str) -> Result<Vec<Vec<String>>> {
        (**self).unique_keys(table)
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>> {
        (**self).foreign_keys(table)
    }
}

/// Lazy sequence of [`RawTableDescriptor`]s.
///
/// Table names are fetched on the first call to `next`. The predicate runs
/// before any per-table query, so excluded tables never cost a column or
/// constraint lookup. Not restartable: create a new one to re-query.
pub struct TableIter<'a, S, P> {
    source: &'a S,
    predicate: P,
    names: Option<std::vec::IntoIter<String>>,
    failed: bool,
}

impl<S, P> Iterator for TableIter<'_, S, P>
where
    S: CatalogSource,
    P: FnMut(&str) -> bool,
{
    type Item = Result<RawTableDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.names.is_none() {
            match self.source.table_names() {
                Ok(names) => self.names = Some(names.into_iter()),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
        let names = self.names.as_mut()?;
        for name in names.by_ref() {
            if !(self.predicate)(&name) {
                debug!(table = %name, "Skipping filtered table");
                continue;
            }
            let described = describe_table(self.source, &name);
            if described.is_err() {
                self.failed = true;
            }
            return Some(described);
        }
        None
    }
}

/// Walk the catalog, yielding one descriptor per table accepted by `predicate`.
pub fn list_tables<S, P>(source: &S, predicate: P) -> TableIter<'_, S, P>
where
    S: CatalogSource,
    P: FnMut(&str) -> bool,
{
    TableIter {
        source,
        predicate,
        names: None,
        failed: false,
    }
}

fn describe_table<S: CatalogSource>(source: &S, name: &str) -> Result<RawTableDescriptor> {
    let columns = source.columns(name)?;
    let primary_key = source.primary_key(name)?;
    let unique_keys = source.unique_keys(name)?;
    let foreign_keys = source.foreign_keys(name)?;
    debug!(
        table = name,
        columns = columns.len(),
        foreign_keys = foreign_keys.len(),
        "Described table"
    );
    Ok(RawTableDescriptor {
        name: name.to_string(),
        columns,
        primary_key,
        unique_keys,
        foreign_keys,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct CountingCatalog {
        tables: Vec<String>,
        calls: RefCell<HashMap<(String, &'static str), usize>>,
        fail_on: Option<String>,
    }

    impl CountingCatalog {
        fn with_tables(tables: &[&str]) -> Self {
            Self {
                tables: tables.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            }
        }

        fn record(&self, table: &str, what: &'static str) {
            *self
                .calls
                .borrow_mut()
                .entry((table.to_string(), what))
                .or_default() += 1;
        }

        fn count(&self, table: &str, what: &'static str) -> usize {
            self.calls
                .borrow()
                .get(&(table.to_string(), what))
                .copied()
                .unwrap_or(0)
        }
    }

    impl CatalogSource for CountingCatalog {
        fn table_names(&self) -> Result<Vec<String>> {
            Ok(self.tables.clone())
        }

        fn columns(&self, table: &str) -> Result<Vec<RawColumn>> {
            self.record(table, "columns");
            if self.fail_on.as_deref() == Some(table) {
                return Err(Error::catalog(table, rusqlite::Error::InvalidQuery));
            }
            Ok(vec![RawColumn {
                name: "id".into(),
                data_type: "INTEGER".into(),
                nullable: false,
                default: None,
            }])
        }

        fn primary_key(&self, table: &str) -> Result<RawPrimaryKey> {
            self.record(table, "primary_key");
            Ok(RawPrimaryKey {
                columns: vec!["id".into()],
                auto_increment: true,
            })
        }

        fn unique_keys(&self, table: &str) -> Result<Vec<Vec<String>>> {
            self.record(table, "unique_keys");
            Ok(vec![])
        }

        fn foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>> {
            self.record(table, "foreign_keys");
            Ok(vec![])
        }
    }

    #[test]
    fn filtered_tables_never_resolve_constraints() {
        let catalog = CountingCatalog::with_tables(&["auth_tokens", "people", "posts"]);
        let names: Vec<String> = list_tables(&catalog, |t| t != "auth_tokens")
            .map(|r| r.unwrap().name)
            .collect();

        assert_eq!(names, vec!["people", "posts"]);
        assert_eq!(catalog.count("auth_tokens", "columns"), 0);
        assert_eq!(catalog.count("auth_tokens", "foreign_keys"), 0);
        assert_eq!(catalog.count("auth_tokens", "unique_keys"), 0);
        assert_eq!(catalog.count("people", "foreign_keys"), 1);
    }

    #[test]
    fn iteration_is_lazy() {
        let catalog = CountingCatalog::with_tables(&["people", "posts"]);
        let mut iter = list_tables(&catalog, |_| true);
        assert_eq!(catalog.count("people", "columns"), 0);
        iter.next().unwrap().unwrap();
        assert_eq!(catalog.count("people", "columns"), 1);
        assert_eq!(catalog.count("posts", "columns"), 0);
    }

    #[test]
    fn predicate_runs_once_per_table() {
        let catalog = CountingCatalog::with_tables(&["a", "b", "c"]);
        let mut seen = Vec::new();
        let count = list_tables(&catalog, |t| {
            seen.push(t.to_string());
            true
        })
        .count();
        assert_eq!(count, 3);
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn failure_is_surfaced_and_ends_the_walk() {
        let mut catalog = CountingCatalog::with_tables(&["people", "posts", "tags"]);
        catalog.fail_on = Some("posts".into());
        let results: Vec<_> = list_tables(&catalog, |_| true).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(Error::Catalog { table: Some(ref t), .. }) if t == "posts"
        ));
        assert_eq!(catalog.count("tags", "columns"), 0);
    }
}
