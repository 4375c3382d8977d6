//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rocolib::ParamValue;

/// roco - build, cache and index composable robot components
#[derive(Parser)]
#[command(name = "roco")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Location overrides; each beats the configuration files.
#[derive(Args, Default)]
pub struct PathArgs {
    /// Directory holding declarative component files
    #[arg(long, global = true, env = "ROCO_LIBRARY")]
    pub library: Option<PathBuf>,

    /// Instance cache directory
    #[arg(long, global = true, env = "ROCO_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// SQLite index file
    #[arg(long, global = true, env = "ROCO_DATABASE")]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available component definitions
    List(ListArgs),

    /// Parse every declarative component file and report errors
    Check,

    /// Build a component (or load it from the cache)
    Make(MakeArgs),

    /// Build components and write them into the index
    Sync(SyncArgs),

    /// Show a component as stored in the index
    Query(QueryArgs),

    /// List components that have a capability
    Filter(FilterArgs),

    /// Manage the instance cache
    Cache(CacheArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Show where each definition comes from and whether it is cached
    #[arg(long)]
    pub long: bool,
}

#[derive(Args)]
pub struct MakeArgs {
    /// Component name
    pub name: String,

    /// Rebuild and overwrite any cached snapshot
    #[arg(long)]
    pub remake: bool,

    /// Override a parameter (or `name`) on a fresh build, e.g. `--set voltage=24`
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(String, ParamValue)>,

    /// Serve a cached instance even when overrides are given
    #[arg(long)]
    pub ignore_overrides: bool,

    /// Print the full component as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Components to synchronize (defaults to every definition)
    pub names: Vec<String>,

    /// Rebuild instead of using cached snapshots
    #[arg(long)]
    pub remake: bool,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Component name
    pub name: String,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Capability key, or `all`
    pub capability: String,

    /// Query the index instead of building definitions
    #[arg(long)]
    pub stored: bool,
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List cached snapshots
    List,

    /// Remove one cached snapshot
    Remove(CacheRemoveArgs),

    /// Remove every cached snapshot
    Clear,

    /// Print the cache directory
    Path,
}

#[derive(Args)]
pub struct CacheRemoveArgs {
    /// Component name
    pub name: String,
}

/// Parse `key=value`; the value is typed the way a declarative file would be.
fn parse_override(raw: &str) -> Result<(String, ParamValue), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), ParamValue::parse(value.trim())))
        }
        _ => Err(format!("expected KEY=VALUE, got `{}`", raw)),
    }
}
