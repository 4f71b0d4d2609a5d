//! Language-neutral schema metadata: columns, key constraints and the
//! canonical per-table model consumed by the component builders.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Native column type tag, normalized across database vendors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum NativeType {
    /// Long text, optionally with a declared length.
    Text(Option<u32>),
    /// Bounded character data.
    Varchar(Option<u32>),
    /// Integer with an optional display width.
    Integer(Option<u32>),
    BigInt,
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    /// Date and time with an optional format string.
    DateTime(Option<String>),
    Date,
    Boolean,
    Enum(Vec<String>),
    /// Anything the mapper does not recognize; treated as a string.
    Unknown(String),
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Text(None) => f.write_str("text"),
            NativeType::Text(Some(n)) => write!(f, "text:{n}"),
            NativeType::Varchar(None) => f.write_str("varchar"),
            NativeType::Varchar(Some(n)) => write!(f, "varchar:{n}"),
            NativeType::Integer(None) => f.write_str("integer"),
            NativeType::Integer(Some(n)) => write!(f, "integer:{n}"),
            NativeType::BigInt => f.write_str("bigint"),
            NativeType::Decimal {
                precision: Some(p),
                scale: Some(s),
            } => write!(f, "decimal:{p},{s}"),
            NativeType::Decimal {
                precision: Some(p),
                scale: None,
            } => write!(f, "decimal:{p}"),
            NativeType::Decimal { .. } => f.write_str("decimal"),
            NativeType::DateTime(None) => f.write_str("datetime"),
            NativeType::DateTime(Some(format)) => write!(f, "datetime:{format}"),
            NativeType::Date => f.write_str("date"),
            NativeType::Boolean => f.write_str("boolean"),
            NativeType::Enum(values) => write!(f, "enum:{}", values.join(",")),
            NativeType::Unknown(raw) => write!(f, "unknown:{raw}"),
        }
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub native_type: NativeType,
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ColumnDefinition {
    /// A non-null, non-key column without default.
    pub fn new(name: impl Into<String>, native_type: NativeType) -> Self {
        Self {
            name: name.into(),
            native_type,
            nullable: false,
            primary_key: false,
            default: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Plain-data form of a [`ForeignKeyConstraint`], validated on conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRecord {
    pub local_table: String,
    pub local_columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
}

/// Referential relationship between two tables.
///
/// Local and foreign column lists always have the same arity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ForeignKeyRecord", into = "ForeignKeyRecord")]
pub struct ForeignKeyConstraint {
    local_table: String,
    local_columns: Vec<String>,
    foreign_table: String,
    foreign_columns: Vec<String>,
}

impl ForeignKeyConstraint {
    /// # Errors
    ///
    /// [`Error::Config`] when the column lists are empty or differ in length.
    pub fn new(
        local_table: impl Into<String>,
        local_columns: Vec<String>,
        foreign_table: impl Into<String>,
        foreign_columns: Vec<String>,
    ) -> Result<Self> {
        let local_table = local_table.into();
        let foreign_table = foreign_table.into();
        if local_columns.is_empty() || local_columns.len() != foreign_columns.len() {
            return Err(Error::Config(format!(
                "foreign key {local_table}({}) -> {foreign_table}({}) has mismatched column arity",
                local_columns.join(","),
                foreign_columns.join(",")
            )));
        }
        Ok(Self {
            local_table,
            local_columns,
            foreign_table,
            foreign_columns,
        })
    }

    pub fn local_table(&self) -> &str {
        &self.local_table
    }

    pub fn local_columns(&self) -> &[String] {
        &self.local_columns
    }

    pub fn foreign_table(&self) -> &str {
        &self.foreign_table
    }

    pub fn foreign_columns(&self) -> &[String] {
        &self.foreign_columns
    }

    /// Foreign column paired with `local`, if `local` takes part in this key.
    pub fn foreign_column_for(&self, local: &str) -> Option<&str> {
        self.local_columns
            .iter()
            .position(|c| c == local)
            .map(|i| self.foreign_columns[i].as_str())
    }
}

impl TryFrom<ForeignKeyRecord> for ForeignKeyConstraint {
    type Error = Error;

    fn try_from(record: ForeignKeyRecord) -> Result<Self> {
        Self::new(
            record.local_table,
            record.local_columns,
            record.foreign_table,
            record.foreign_columns,
        )
    }
}

impl From<ForeignKeyConstraint> for ForeignKeyRecord {
    fn from(fk: ForeignKeyConstraint) -> Self {
        Self {
            local_table: fk.local_table,
            local_columns: fk.local_columns,
            foreign_table: fk.foreign_table,
            foreign_columns: fk.foreign_columns,
        }
    }
}

/// Set of columns whose combined value is unique within a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueKeyConstraint {
    pub table: String,
    pub columns: Vec<String>,
}

impl UniqueKeyConstraint {
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }
}

/// Plain-data form of a [`TableModel`], validated on conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableModelRecord {
    pub name: String,
    #[serde(default)]
    pub primary_key: Option<String>,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyConstraint>,
    #[serde(default)]
    pub unique_keys: Vec<UniqueKeyConstraint>,
    #[serde(default)]
    pub increments: bool,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Canonical, serializable representation of one table.
///
/// Never mutated after construction; rebuilding means creating a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableModelRecord", into = "TableModelRecord")]
pub struct TableModel {
    name: String,
    primary_key: Option<String>,
    columns: Vec<ColumnDefinition>,
    foreign_keys: Vec<ForeignKeyConstraint>,
    unique_keys: Vec<UniqueKeyConstraint>,
    increments: bool,
    namespace: Option<String>,
}

impl TableModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary key column name; `None` for keyless tables.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyConstraint] {
        &self.foreign_keys
    }

    pub fn unique_keys(&self) -> &[UniqueKeyConstraint] {
        &self.unique_keys
    }

    pub fn increments(&self) -> bool {
        self.increments
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.as_deref() == Some(column)
    }
}

impl TryFrom<TableModelRecord> for TableModel {
    type Error = Error;

    fn try_from(record: TableModelRecord) -> Result<Self> {
        if record.name.trim().is_empty() {
            return Err(Error::Config("table name must not be empty".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for column in &record.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::Config(format!(
                    "table {} declares column {} twice",
                    record.name, column.name
                )));
            }
        }
        if let Some(pk) = &record.primary_key {
            if !seen.contains(pk.as_str()) {
                return Err(Error::Config(format!(
                    "table {} primary key {pk} is not one of its columns",
                    record.name
                )));
            }
        }
        Ok(Self {
            name: record.name,
            primary_key: record.primary_key,
            columns: record.columns,
            foreign_keys: record.foreign_keys,
            unique_keys: record.unique_keys,
            increments: record.increments,
            namespace: record.namespace,
        })
    }
}

impl From<TableModel> for TableModelRecord {
    fn from(model: TableModel) -> Self {
        Self {
            name: model.name,
            primary_key: model.primary_key,
            columns: model.columns,
            foreign_keys: model.foreign_keys,
            unique_keys: model.unique_keys,
            increments: model.increments,
            namespace: model.namespace,
        }
    }
}
