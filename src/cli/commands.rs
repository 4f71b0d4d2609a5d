use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use crate::cache::{Cache, RoutesCache};
use crate::components::ComponentKind;
use crate::config::{fallback_lookup, load_config, resolve_config_path, GeneratorConfig};
use crate::driver::{self, DriverOptions};
use crate::pipeline::{GenerationReport, Pipeline, TableSource};
use crate::plugin::{FilePlugin, JsonPlugin, PluginRegistry};
use crate::schema::{open_catalog, CatalogSource, SqliteCatalog, TableFilter};

/// Output directory used when neither the flag nor the config names one.
pub const DEFAULT_OUTPUT_DIR: &str = "src";

/// Command-line interface for schemaforge
#[derive(Parser, Debug)]
#[command(name = "schemaforge", version)]
#[command(about = "Generate application components from a database schema", long_about = None)]
pub struct Cli {
    /// Configuration file (default: schemaforge.toml / .yaml in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Connection flags, mirroring the driver option keys.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    /// Connection URL; every other connection flag is ignored when set
    #[arg(long)]
    pub url: Option<String>,
    /// Driver name, with or without the `pdo_` prefix
    #[arg(long)]
    pub driver: Option<String>,
    /// Database name (database file for sqlite)
    #[arg(long)]
    pub dbname: Option<String>,
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<String>,
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub charset: Option<String>,
    #[arg(long)]
    pub server_version: Option<String>,
}

impl ConnectionArgs {
    pub fn to_options(&self) -> DriverOptions {
        DriverOptions {
            connection_url: self.url.clone(),
            driver: self.driver.clone(),
            dbname: self.dbname.clone(),
            host: self.host.clone(),
            port: self.port.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            charset: self.charset.clone(),
            server_version: self.server_version.clone(),
        }
    }
}

/// Flags of `schemaforge generate`
#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Source output directory (default: src)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Root namespace of generated components
    #[arg(long)]
    pub namespace: Option<String>,

    /// Module tag appended to every component namespace
    #[arg(long)]
    pub sub_namespace: Option<String>,

    /// Limit generation to specific component kinds (comma-separated or repeated)
    #[arg(long, value_enum, num_args = 1.., value_delimiter = ',')]
    pub only: Option<Vec<OnlyPart>>,

    /// Generate only these tables (comma-separated or repeated)
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Additional table exclusion patterns (regular expressions)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Re-introspect even when cached table models exist
    #[arg(long, default_value_t = false)]
    pub refresh: bool,

    /// Do not read or write the cache
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Overwrite existing source files
    #[arg(short, long, default_value_t = false)]
    pub force: bool,

    /// Also write JSON component definitions under this directory
    #[arg(long)]
    pub json: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate components from the database schema
    Generate(GenerateArgs),
    /// Print the routes recorded by the last generation run
    Routes {
        /// Cache directory (default: from config, then .schemaforge)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// List the tables that would be generated
    Tables {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Additional table exclusion patterns (regular expressions)
        #[arg(long)]
        exclude: Vec<String>,
    },
}

/// Component kinds selectable with `--only`
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OnlyPart {
    /// Data models
    Model,
    /// Data-transfer objects
    Dto,
    /// Request validation view models
    ViewModel,
    /// Service handlers
    Service,
    /// Request controllers
    Controller,
}

impl OnlyPart {
    pub fn kind(self) -> ComponentKind {
        match self {
            OnlyPart::Model => ComponentKind::Model,
            OnlyPart::Dto => ComponentKind::Dto,
            OnlyPart::ViewModel => ComponentKind::ViewModel,
            OnlyPart::Service => ComponentKind::Service,
            OnlyPart::Controller => ComponentKind::Controller,
        }
    }
}

/// Load the configuration file for a run
///
/// An explicitly requested file must exist; an auto-detected one is optional.
pub fn load_generator_config(explicit: Option<&Path>, dir: &Path) -> Result<Option<GeneratorConfig>> {
    let Some(path) = resolve_config_path(explicit, dir) else {
        debug!("No configuration file found");
        return Ok(None);
    };
    if explicit.is_some() && !path.exists() {
        bail!("Config file not found: {}", path.display());
    }
    let config = load_config(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    if config.is_some() {
        info!(path = %path.display(), "Loaded configuration");
    }
    Ok(config)
}

/// Execute the parsed command
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file is missing (when explicit) or malformed
/// - Connection options cannot be resolved or the catalog cannot be opened
/// - Any component fails to build or emit
pub fn run_cli(cli: &Cli) -> Result<()> {
    let config = load_generator_config(cli.config.as_deref(), Path::new("."))?;
    match &cli.command {
        Commands::Generate(args) => {
            let report = run_generate(args, config.as_ref())?;
            print_summary(&report);
            report
                .batch
                .into_result()
                .context("Some components could not be emitted")?;
            Ok(())
        }
        Commands::Routes { cache_dir } => {
            let root = cache_dir
                .clone()
                .or_else(|| config.as_ref().map(|c| c.cache.root.clone()))
                .unwrap_or_else(|| GeneratorConfig::default().cache.root);
            let cache = Cache::new(root);
            let Some(entry) = cache.load::<RoutesCache>().context("Failed to read routes cache")? else {
                bail!(
                    "No cached routes under {}; run `schemaforge generate` first",
                    cache.root().display()
                );
            };
            for route in entry.routes {
                println!("{:<24} {:<24} {}", route.name, route.path, route.controller);
            }
            Ok(())
        }
        Commands::Tables {
            connection,
            exclude,
        } => {
            let defaults = GeneratorConfig::default();
            let file = config.as_ref().unwrap_or(&defaults);
            let filter = TableFilter::with_defaults(file.generate.exclude.iter().chain(exclude))
                .context("Invalid exclude pattern")?;
            let catalog = connect(connection, config.as_ref())?;
            let names = catalog.table_names().context("Failed to list tables")?;
            for name in names.iter().filter(|n| filter.accepts(n)) {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn connect(connection: &ConnectionArgs, config: Option<&GeneratorConfig>) -> Result<SqliteCatalog> {
    let lookup = fallback_lookup(config, |key| std::env::var(key).ok());
    let driver = driver::resolve(&connection.to_options(), lookup)
        .context("Failed to resolve connection options")?;
    open_catalog(&driver).context("Failed to open database catalog")
}

/// Run `generate`: CLI flags win over the `[generate]` section.
fn run_generate(args: &GenerateArgs, config: Option<&GeneratorConfig>) -> Result<GenerationReport> {
    let defaults = GeneratorConfig::default();
    let file = config.unwrap_or(&defaults);

    let mut options = file.generate.options.clone();
    if let Some(namespace) = &args.namespace {
        options.namespace = namespace.clone();
    }
    if let Some(sub_namespace) = &args.sub_namespace {
        options.sub_namespace = Some(sub_namespace.clone());
    }

    let output = args
        .output
        .clone()
        .or_else(|| file.generate.output.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let kinds: Vec<ComponentKind> = match &args.only {
        Some(parts) => parts.iter().map(|p| p.kind()).collect(),
        None => file.generate.components.clone(),
    };
    let filter = TableFilter::with_defaults(file.generate.exclude.iter().chain(&args.exclude))
        .and_then(|f| f.only(&args.tables))
        .context("Invalid table selection")?;

    let mut pipeline = Pipeline::new(options)
        .kinds(kinds)
        .with_overrides(file.tables.clone())
        .refresh(args.refresh)
        .with_routes_dir(output.clone());
    if file.cache.enabled && !args.no_cache {
        pipeline = pipeline.with_cache(Cache::new(file.cache.root.clone()));
    }

    let mut registry = PluginRegistry::new();
    registry.register("file", FilePlugin::new(output).force(args.force || file.generate.force));
    if let Some(dir) = args.json.as_ref().or(file.generate.json_output.as_ref()) {
        registry.register("json", JsonPlugin::new(dir.clone()));
    }

    // Only opened on a cache miss.
    let connect = || {
        let lookup = fallback_lookup(config, |key| std::env::var(key).ok());
        driver::resolve(&args.connection.to_options(), lookup).and_then(|d| open_catalog(&d))
    };
    pipeline
        .run(&filter, connect, &registry)
        .context("Generation failed")
}

fn print_summary(report: &GenerationReport) {
    let source = match report.source {
        TableSource::Cache => "cache",
        TableSource::Catalog => "database",
    };
    for path in report.batch.written() {
        println!("  wrote   {}", path.display());
    }
    for path in report.batch.skipped() {
        println!("  skipped {} (exists, use --force)", path.display());
    }
    if let Some(path) = &report.routes_file {
        println!("  routes  {}", path.display());
    }
    println!(
        "Generated {} component(s) for {} table(s) from {source}",
        report.components.len(),
        report.tables.len()
    );
}
