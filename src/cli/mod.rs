//! # CLI Module
//!
//! Command-line front end of the `schemaforge` binary. It only turns flags and
//! the optional configuration file into library calls; all generation logic
//! lives in [`crate::pipeline`].
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Introspect the database (or reuse the components cache) and emit
//! components:
//!
//! ```bash
//! schemaforge generate --driver sqlite --dbname database/app.sqlite --output src
//! ```
//!
//! Options:
//! - `--url`, `--driver`, `--dbname`, `--host`, `--port`, `--user`, `--password`,
//!   `--charset`, `--server-version` - connection options; unset ones fall back to
//!   the `[connection]` section and then `DB_*` environment variables
//! - `--output <DIR>` - source output directory (default: `src`)
//! - `--namespace`, `--sub-namespace` - root namespace and module tag
//! - `--only <KINDS>` - component kinds: model, dto, view-model, service, controller
//! - `--tables <NAMES>` - restrict to these tables
//! - `--exclude <REGEX>` - extra table exclusion patterns
//! - `--refresh` - ignore cached table models
//! - `--no-cache` - neither read nor write the cache
//! - `--force` - overwrite existing source files
//! - `--json <DIR>` - also write JSON component definitions
//!
//! ### `routes`
//!
//! Print the routes recorded by the last `generate` run.
//!
//! ### `tables`
//!
//! List the tables `generate` would consider after filtering.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use clap::Parser;
//! use schemaforge::cli::{run_cli, Cli};
//!
//! let cli = Cli::parse();
//! run_cli(&cli)?;
//! ```

mod commands;


pub use commands::{
    load_generator_config, run_cli, Cli, Commands, ConnectionArgs, GenerateArgs, OnlyPart,
    DEFAULT_OUTPUT_DIR,
};
