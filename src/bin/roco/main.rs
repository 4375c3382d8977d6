//! roco CLI - build, cache and index composable robot components

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use rocolib::cache::CacheError;
use rocolib::core::FactoryError;
use rocolib::db::StoreError;
use rocolib::util::diagnostic::{emit, Diagnostic};

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("rocolib=debug")
    } else {
        EnvFilter::new("rocolib=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let color = !cli.no_color;
    if let Err(e) = run(cli) {
        emit(&diagnostic_for(&e), color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = commands::context(cli.paths, cli.verbose, !cli.no_color)?;

    match cli.command {
        Commands::List(args) => commands::list::execute(args, &ctx),
        Commands::Check => commands::check::execute(&ctx),
        Commands::Make(args) => commands::make::execute(args, &ctx),
        Commands::Sync(args) => commands::sync::execute(args, &ctx),
        Commands::Query(args) => commands::query::execute(args, &ctx),
        Commands::Filter(args) => commands::filter::execute(args, &ctx),
        Commands::Cache(args) => commands::cache::execute(args, &ctx),
    }
}

/// Library errors carry their own suggestions; anything else is shown with
/// its context chain.
fn diagnostic_for(err: &anyhow::Error) -> Diagnostic {
    if let Some(e) = err.downcast_ref::<FactoryError>() {
        e.to_diagnostic()
    } else if let Some(e) = err.downcast_ref::<CacheError>() {
        e.to_diagnostic()
    } else if let Some(e) = err.downcast_ref::<StoreError>() {
        e.to_diagnostic()
    } else if let Some(e) = err.downcast_ref::<commands::query::NotIndexed>() {
        e.to_diagnostic()
    } else {
        Diagnostic::error(format!("{:#}", err))
    }
}
