//! # Generation Pipeline
//!
//! One synchronous batch per request:
//!
//! 1. table models come from the components cache or, on a miss, from the
//!    catalog (introspection + type mapping), and are written back to the cache
//! 2. each table is shared through an [`Arc`] by the requested builders
//! 3. the [`PluginRegistry`] emits every component through every plugin
//! 4. controllers yield the route list, cached and rendered as `routes.rs`
//!
//! The catalog connection is opened lazily, so a cache hit never touches the
//! database.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{Cache, ComponentsCache, RouteDescriptor, RoutesCache};
use crate::components::{
    builder_for, ComponentDefinition, ComponentKind, ComponentPayload, ControllerBuilder,
    GenerateOptions, TableOverrides, ComponentBuilder,
};
use crate::error::Result;
use crate::plugin::{render_routes, write_file, BatchReport, PluginRegistry};
use crate::rules::table_model;
use crate::schema::{list_tables, CatalogSource, TableFilter, TableModel};

/// File name of the rendered route registry.
pub const ROUTES_FILE: &str = "routes.rs";

/// Where the table models of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    Cache,
    Catalog,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct GenerationReport {
    pub tables: Vec<String>,
    pub source: TableSource,
    pub components: Vec<ComponentDefinition>,
    pub batch: BatchReport,
    pub routes: Vec<RouteDescriptor>,
    pub routes_file: Option<PathBuf>,
}

/// Configured generation run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: GenerateOptions,
    overrides: BTreeMap<String, TableOverrides>,
    kinds: Vec<ComponentKind>,
    cache: Option<Cache>,
    refresh: bool,
    controllers: ControllerBuilder,
    routes_dir: Option<PathBuf>,
}

impl Pipeline {
    /// Pipeline building every component kind, without cache.
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            overrides: BTreeMap::new(),
            kinds: ComponentKind::ALL.to_vec(),
            cache: None,
            refresh: false,
            controllers: ControllerBuilder::default(),
            routes_dir: None,
        }
    }

    /// Restrict the run to `kinds`; an empty list keeps all kinds.
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = ComponentKind>) -> Self {
        let mut kinds: Vec<ComponentKind> = kinds.into_iter().collect();
        kinds.sort();
        kinds.dedup();
        if !kinds.is_empty() {
            self.kinds = kinds;
        }
        self
    }

    pub fn with_overrides(mut self, overrides: BTreeMap<String, TableOverrides>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Ignore cached table models (they are still rewritten).
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_controller_builder(mut self, builder: ControllerBuilder) -> Self {
        self.controllers = builder;
        self
    }

    /// Render `routes.rs` into `dir` at the end of the run.
    pub fn with_routes_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.routes_dir = Some(dir.into());
        self
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Table models for this run, from the cache when possible.
    ///
    /// `connect` is only called on a cache miss.
    pub fn load_tables<S, F>(&self, filter: &TableFilter, connect: F) -> Result<(Vec<TableModel>, TableSource)>
    where
        S: CatalogSource,
        F: FnOnce() -> Result<S>,
    {
        if let Some(tables) = self.cached_tables(filter)? {
            return Ok((tables, TableSource::Cache));
        }

        let source = connect()?;
        let sub_namespace = self.options.sub_namespace.as_deref();
        let tables = list_tables(&source, |name| filter.accepts(name))
            .map(|raw| {
                let raw = raw?;
                info!(table = %raw.name, columns = raw.columns.len(), "Introspected table");
                table_model(raw, sub_namespace)
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(cache) = &self.cache {
            // A narrowed selection would shadow the full table set on the next run.
            if filter.is_restricted() {
                debug!("Table selection is restricted, components cache left untouched");
            } else {
                cache.dump(&ComponentsCache {
                    tables: tables.clone(),
                    namespace: self.options.namespace.clone(),
                    sub_namespace: self.options.sub_namespace.clone(),
                    excludes: filter.exclude_patterns(),
                })?;
            }
        }
        Ok((tables, TableSource::Catalog))
    }

    fn cached_tables(&self, filter: &TableFilter) -> Result<Option<Vec<TableModel>>> {
        let Some(cache) = self.cache.as_ref().filter(|_| !self.refresh) else {
            return Ok(None);
        };
        let Some(entry) = cache.load::<ComponentsCache>()? else {
            return Ok(None);
        };
        if entry.namespace != self.options.namespace || entry.sub_namespace != self.options.sub_namespace {
            debug!(
                cached = %entry.namespace,
                requested = %self.options.namespace,
                "Cached tables belong to another namespace, introspecting"
            );
            return Ok(None);
        }
        if entry.excludes != filter.exclude_patterns() {
            debug!("Exclude patterns changed since the tables were cached, introspecting");
            return Ok(None);
        }
        let tables: Vec<TableModel> = entry
            .tables
            .into_iter()
            .filter(|t| filter.accepts(t.name()))
            .collect();
        info!(tables = tables.len(), "Loaded table models from cache");
        Ok(Some(tables))
    }

    /// Build the configured components for every table.
    pub fn build(&self, tables: Vec<TableModel>) -> Result<Vec<ComponentDefinition>> {
        let mut components = Vec::with_capacity(tables.len() * self.kinds.len());
        for table in tables.into_iter().map(Arc::new) {
            let options = match self.overrides.get(table.name()) {
                Some(overrides) => self.options.merged(overrides),
                None => self.options.clone(),
            }
            .bind_generated(table.name(), &self.kinds);

            for &kind in &self.kinds {
                let component = match kind {
                    ComponentKind::Controller => self.controllers.build(&table, &options)?,
                    other => builder_for(other).build(&table, &options)?,
                };
                debug!(table = table.name(), class = component.class_name(), "Built {kind}");
                components.push(component);
            }
        }
        Ok(components)
    }

    /// Run the whole batch.
    ///
    /// Emission failures are collected in the report rather than returned;
    /// use [`BatchReport::into_result`] to turn them into an error.
    pub fn run<S, F>(&self, filter: &TableFilter, connect: F, registry: &PluginRegistry) -> Result<GenerationReport>
    where
        S: CatalogSource,
        F: FnOnce() -> Result<S>,
    {
        let (tables, source) = self.load_tables(filter, connect)?;
        let table_names: Vec<String> = tables.iter().map(|t| t.name().to_string()).collect();
        let components = self.build(tables)?;
        let batch = registry.generate(&components);

        let (routes, complete) = self.route_registry(filter, &table_names, routes_for(&components))?;
        if let Some(cache) = &self.cache {
            cache.dump(&RoutesCache {
                routes: routes.clone(),
            })?;
        }
        let routes_file = match &self.routes_dir {
            Some(dir) if complete => Some(write_routes(dir, &routes)?),
            Some(dir) => {
                debug!(dir = %dir.display(), "Partial run without a cache, routes.rs left untouched");
                None
            }
            None => None,
        };

        info!(
            tables = table_names.len(),
            components = components.len(),
            written = batch.written().count(),
            skipped = batch.skipped().count(),
            failed = batch.failures.len(),
            "Generation finished"
        );
        Ok(GenerationReport {
            tables: table_names,
            source,
            components,
            batch,
            routes,
            routes_file,
        })
    }

    /// Routes of every generated controller after this run.
    ///
    /// A run over all tables that builds controllers owns the whole registry.
    /// Any other run only replaces the routes of the tables it rebuilt
    /// controllers for and keeps the cached rest. The flag is `false` when
    /// the result may be missing routes because no cache backs the merge.
    fn route_registry(
        &self,
        filter: &TableFilter,
        tables: &[String],
        fresh: Vec<RouteDescriptor>,
    ) -> Result<(Vec<RouteDescriptor>, bool)> {
        let builds_controllers = self.kinds.contains(&ComponentKind::Controller);
        if builds_controllers && !filter.is_restricted() {
            return Ok((fresh, true));
        }
        let Some(cache) = &self.cache else {
            return Ok((fresh, false));
        };
        let previous = cache.load::<RoutesCache>()?.unwrap_or_default().routes;
        let mut routes: Vec<RouteDescriptor> = previous
            .into_iter()
            .filter(|r| !(builds_controllers && tables.contains(&r.table)))
            .filter(|r| fresh.iter().all(|f| f.name != r.name))
            .collect();
        routes.extend(fresh);
        routes.sort();
        routes.dedup();
        debug!(routes = routes.len(), "Merged routes with the cached registry");
        Ok((routes, true))
    }
}

/// One route per built controller, sorted by name.
pub fn routes_for(components: &[ComponentDefinition]) -> Vec<RouteDescriptor> {
    let mut routes: Vec<RouteDescriptor> = components
        .iter()
        .filter_map(|c| match c.payload() {
            Ok(ComponentPayload::Controller(payload)) => {
                Some(RouteDescriptor::new(c.table().name(), &payload.route_name, c.qualified_name()))
            }
            _ => None,
        })
        .collect();
    routes.sort();
    routes
}

/// Render and write `routes.rs` into `dir`.
pub fn write_routes(dir: &Path, routes: &[RouteDescriptor]) -> Result<PathBuf> {
    let path = dir.join(ROUTES_FILE);
    write_file(&path, render_routes(routes)?)?;
    info!(path = %path.display(), routes = routes.len(), "Generated route registry");
    Ok(path)
}
