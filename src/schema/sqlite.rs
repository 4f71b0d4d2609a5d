//! Built-in [`CatalogSource`] for SQLite databases.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::info;
use url::Url;

use super::introspect::{CatalogSource, RawColumn, RawForeignKey, RawPrimaryKey};
use crate::driver::DriverConfig;
use crate::error::{Error, Result};

/// Catalog reader over a SQLite connection.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open an existing database file read-only.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::io(
                crate::error::IoErrorKind::Missing,
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "database file not found"),
            ));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        info!(path = %path.display(), "Opened SQLite catalog");
        Ok(Self { conn })
    }

    /// Wrap an already open connection (in-memory databases, tests).
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn pragma(&self, pragma: &str, table: &str) -> String {
        format!("PRAGMA {pragma}(\"{}\")", table.replace('"', "\"\""))
    }
}

impl CatalogSource for SqliteCatalog {
    fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        let sql = self.pragma("table_info", table);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| Error::catalog(table, e))?;
        let columns = stmt
            .query_map([], |row| {
                let notnull: i64 = row.get(3)?;
                let pk: i64 = row.get(5)?;
                Ok(RawColumn {
                    name: row.get(1)?,
                    data_type: row.get(2)?,
                    // SQLite lets primary key columns hold NULL unless declared otherwise,
                    // but generated code treats keys as required.
                    nullable: notnull == 0 && pk == 0,
                    default: row.get(4)?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| Error::catalog(table, e))?;
        Ok(columns)
    }

    fn primary_key(&self, table: &str) -> Result<RawPrimaryKey> {
        let sql = self.pragma("table_info", table);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| Error::catalog(table, e))?;
        let mut keyed = stmt
            .query_map([], |row| {
                let pk: i64 = row.get(5)?;
                let name: String = row.get(1)?;
                let data_type: String = row.get(2)?;
                Ok((pk, name, data_type))
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| Error::catalog(table, e))?
            .into_iter()
            .filter(|(pk, _, _)| *pk > 0)
            .collect::<Vec<_>>();
        keyed.sort_by_key(|(pk, _, _)| *pk);

        // A lone INTEGER PRIMARY KEY aliases the rowid and is generated on insert.
        let auto_increment = keyed.len() == 1 && keyed[0].2.eq_ignore_ascii_case("integer");
        Ok(RawPrimaryKey {
            columns: keyed.into_iter().map(|(_, name, _)| name).collect(),
            auto_increment,
        })
    }

    fn unique_keys(&self, table: &str) -> Result<Vec<Vec<String>>> {
        let sql = self.pragma("index_list", table);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| Error::catalog(table, e))?;
        // origin: c = CREATE INDEX, u = UNIQUE constraint, pk = primary key
        let indexes = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let unique: i64 = row.get(2)?;
                let origin: String = row.get(3)?;
                Ok((name, unique != 0 && origin != "pk"))
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| Error::catalog(table, e))?;

        let mut keys = Vec::new();
        for (index, unique) in indexes {
            if !unique {
                continue;
            }
            let sql = self.pragma("index_info", &index);
            let mut stmt = self
                .conn
                .prepare(&sql)
                .map_err(|e| Error::catalog(table, e))?;
            let mut columns = stmt
                .query_map([], |row| {
                    let seq: i64 = row.get(0)?;
                    let name: Option<String> = row.get(2)?;
                    Ok((seq, name))
                })
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(|e| Error::catalog(table, e))?;
            columns.sort_by_key(|(seq, _)| *seq);
            // Expression indexes have no column name; they cannot become rules.
            let names: Option<Vec<String>> = columns.into_iter().map(|(_, n)| n).collect();
            if let Some(names) = names {
                keys.push(names);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>> {
        let sql = self.pragma("foreign_key_list", table);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| Error::catalog(table, e))?;
        let mut rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let seq: i64 = row.get(1)?;
                let foreign_table: String = row.get(2)?;
                let from: String = row.get(3)?;
                let to: Option<String> = row.get(4)?;
                Ok((id, seq, foreign_table, from, to))
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| Error::catalog(table, e))?;
        rows.sort_by_key(|(id, seq, ..)| (*id, *seq));

        let mut keys: Vec<(i64, RawForeignKey)> = Vec::new();
        for (id, _, foreign_table, from, to) in rows {
            // A missing target column means the parent's primary key.
            let to = match to {
                Some(to) => to,
                None => self
                    .primary_key(&foreign_table)?
                    .columns
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| "rowid".to_string()),
            };
            match keys.last_mut() {
                Some((last, key)) if *last == id => {
                    key.columns.push(from);
                    key.foreign_columns.push(to);
                }
                _ => keys.push((
                    id,
                    RawForeignKey {
                        columns: vec![from],
                        foreign_table,
                        foreign_columns: vec![to],
                    },
                )),
            }
        }
        Ok(keys.into_iter().map(|(_, key)| key).collect())
    }
}

/// Open the catalog matching a resolved driver configuration.
///
/// # Errors
///
/// [`Error::MissingCapability`] for drivers without a built-in catalog,
/// [`Error::Config`] when no database file can be determined.
pub fn open_catalog(config: &DriverConfig) -> Result<SqliteCatalog> {
    match config {
        DriverConfig::Url { url } => {
            let path = sqlite_path_from_url(url)?;
            SqliteCatalog::open(&path)
        }
        DriverConfig::Params { driver, dbname, .. } => {
            if driver != "pdo_sqlite" {
                return Err(Error::MissingCapability(format!(
                    "no catalog client available for driver {driver}"
                )));
            }
            let dbname = dbname
                .as_deref()
                .ok_or_else(|| Error::Config("pdo_sqlite requires a dbname (database file path)".into()))?;
            SqliteCatalog::open(Path::new(dbname))
        }
    }
}

fn sqlite_path_from_url(raw: &str) -> Result<PathBuf> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("invalid connection URL: {e}")))?;
    if url.scheme() != "sqlite" {
        return Err(Error::MissingCapability(format!(
            "no catalog client available for scheme {}",
            url.scheme()
        )));
    }
    // sqlite:///abs/path.db -> /abs/path.db ; sqlite://relative.db -> relative.db
    let mut path = String::new();
    if let Some(host) = url.host_str() {
        path.push_str(host);
    }
    path.push_str(url.path());
    if path.is_empty() {
        return Err(Error::Config(format!("connection URL {raw} has no database path")));
    }
    Ok(PathBuf::from(path))
}
