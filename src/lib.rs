//! # schemaforge
//!
//! **schemaforge** generates application boilerplate (data models, DTOs,
//! request view models, services and controllers) from the catalog of an
//! existing relational database.
//!
//! ## Overview
//!
//! A run takes one snapshot of the schema, turns every table into a
//! serializable [`TableModel`](schema::TableModel), builds component
//! definitions from it and hands them to every registered emitter. Table
//! models and routes are cached on disk so that a second run does not touch
//! the database.
//!
//! ## Architecture
//!
//! - **[`driver`]** - Normalizes connection options into a driver configuration
//! - **[`schema`]** - Lazy, filter-first catalog introspection and the table model
//! - **[`rules`]** - Native type parsing, generic types and validation rule expressions
//! - **[`components`]** - Model, DTO, view model, service and controller builders
//! - **[`cache`]** - JSON cache for table models and routes
//! - **[`plugin`]** - Plugin registry, askama-rendered source files and JSON definitions
//! - **[`pipeline`]** - End-to-end generation entry point
//! - **[`runtime`]** - Request-time action dispatch and input validation
//! - **[`config`]** - `schemaforge.toml` / `.yaml` configuration
//! - **[`logging`]** - tracing subscriber setup
//! - **[`cli`]** - The `schemaforge` command line
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as CLI<br/>(schemaforge)
//!     participant Pipeline as pipeline::Pipeline
//!     participant Cache as cache::Cache
//!     participant Catalog as schema::list_tables
//!     participant Rules as rules::table_model
//!     participant Builders as components::*Builder
//!     participant Plugins as plugin::PluginRegistry
//!
//!     CLI->>Pipeline: run(filter, connect, registry)
//!     Pipeline->>Cache: load::<ComponentsCache>()
//!     alt cache miss
//!         Pipeline->>Catalog: list_tables(source, predicate)
//!         Catalog-->>Pipeline: RawTableDescriptor (filtered first)
//!         Pipeline->>Rules: table_model(raw, sub_namespace)
//!         Pipeline->>Cache: dump(ComponentsCache)
//!     end
//!     Pipeline->>Builders: build(Arc<TableModel>, options)
//!     Builders-->>Pipeline: ComponentDefinition
//!     Pipeline->>Plugins: generate(components)
//!     Plugins-->>Pipeline: BatchReport
//!     Pipeline->>Cache: dump(RoutesCache)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use schemaforge::components::GenerateOptions;
//! use schemaforge::pipeline::Pipeline;
//! use schemaforge::plugin::{FilePlugin, PluginRegistry};
//! use schemaforge::schema::{SqliteCatalog, TableFilter};
//!
//! # fn main() -> schemaforge::Result<()> {
//! let mut registry = PluginRegistry::new();
//! registry.register("file", FilePlugin::new("src"));
//!
//! let filter = TableFilter::with_defaults(["^tmp_"])?;
//! let report = Pipeline::new(GenerateOptions::default()).run(
//!     &filter,
//!     || SqliteCatalog::open("database/app.sqlite".as_ref()),
//!     &registry,
//! )?;
//! report.batch.into_result()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`Result`] with the crate [`Error`]. Unknown
//! native column types never fail a run; they map to strings with a warning.

pub mod cache;
pub mod cli;
pub mod components;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod plugin;
pub mod rules;
pub mod runtime;
pub mod schema;

pub use error::{Error, IoErrorKind, Result};
