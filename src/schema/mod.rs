//! # Schema Module
//!
//! Catalog introspection and the canonical table model.
//!
//! - [`introspect`] - the [`CatalogSource`] collaborator and the lazy [`list_tables`] walker
//! - [`sqlite`] - built-in catalog for SQLite databases
//! - [`filter`] - table name predicates
//! - [`types`] - columns, constraints and [`TableModel`]

pub mod filter;
pub mod introspect;
pub mod sqlite;
pub mod types;

pub use filter::{TableFilter, DEFAULT_EXCLUDES};
pub use introspect::{
    list_tables, CatalogSource, RawColumn, RawForeignKey, RawPrimaryKey, RawTableDescriptor,
    TableIter,
};
pub use sqlite::{open_catalog, SqliteCatalog};
pub use types::{
    ColumnDefinition, ForeignKeyConstraint, ForeignKeyRecord, NativeType, TableModel,
    TableModelRecord, UniqueKeyConstraint,
};
