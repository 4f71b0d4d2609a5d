use clap::Parser;
use schemaforge::cli::{run_cli, Cli};
use schemaforge::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_config(&LogConfig::from_env().verbose(cli.verbose))?;

    if let Err(err) = run_cli(&cli) {
        // Context first, then the library error with its source chain.
        match err.downcast_ref::<schemaforge::Error>() {
            Some(inner) => eprintln!("{err}\n{}", inner.format_detailed()),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
    Ok(())
}
