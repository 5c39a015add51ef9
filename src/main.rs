// CLI binary entry point for podchapters
//
// This is the main entry point for the podchapters command-line tool.

mod cli;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Config;

fn init_tracing(config: &Config) {
    let default = if config.verbose {
        "podchapters=debug,info"
    } else if config.quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(&config);

    cli::commands::run(&config).with_context(|| format!("{} failed", config.command.name()))?;
    Ok(())
}
