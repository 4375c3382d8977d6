//! Command implementations

pub mod cache;
pub mod check;
pub mod filter;
pub mod list;
pub mod make;
pub mod query;
pub mod sync;

use anyhow::Result;

use crate::cli::PathArgs;
use rocolib::db::{ComponentStore, StoreOptions};
use rocolib::ops::{ComponentFactory, GetOptions, Skip};
use rocolib::util::diagnostic::Diagnostic;
use rocolib::util::GlobalContext;
use rocolib::{ComponentQueryItem, ComponentRegistry, InstanceCache};

/// Build the context: configuration files first, then command line paths.
pub fn context(paths: PathArgs, verbose: bool, color: bool) -> Result<GlobalContext> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);
    ctx.set_color(color);
    ctx.load_config();

    let config = ctx.config_mut();
    if let Some(library) = paths.library {
        config.library.path = Some(library);
    }
    if let Some(dir) = paths.cache_dir {
        config.cache.dir = Some(dir);
    }
    if let Some(database) = paths.database {
        config.database.path = Some(database);
    }
    Ok(ctx)
}

pub fn registry(ctx: &GlobalContext) -> Result<ComponentRegistry> {
    ComponentRegistry::discover(&ctx.library_dir())
}

pub fn factory<'r>(ctx: &GlobalContext, registry: &'r ComponentRegistry) -> ComponentFactory<'r> {
    ComponentFactory::new(registry, InstanceCache::new(ctx.cache_dir()))
}

/// Factory options with the configured override policy.
pub fn get_options(ctx: &GlobalContext, remake: bool) -> GetOptions {
    GetOptions {
        remake,
        override_policy: ctx.config().override_policy(),
        ..GetOptions::default()
    }
}

pub fn open_store(ctx: &GlobalContext) -> Result<ComponentStore> {
    let config = ctx.config();
    let options = StoreOptions {
        busy_timeout: config.busy_timeout(),
        retry: config.retry_policy(),
    };
    Ok(ComponentStore::open(&ctx.database_path(), &options)?)
}

/// One warning listing every skipped name with its reason.
pub fn skipped_diagnostic(skipped: &[Skip]) -> Diagnostic {
    skipped.iter().fold(
        Diagnostic::warning(format!("{} component(s) skipped", skipped.len())),
        |diag, skip| diag.with_context(format!("{}: {}", skip.name, skip.reason)),
    )
}

/// Print a projection as an indented listing.
pub fn print_item(item: &ComponentQueryItem) {
    use rocolib::HasCapabilities;

    println!("{}", item.name());
    print_section("interfaces", item.interfaces().iter());
    print_section("parameters", item.parameters().iter());
    print_section("composables", item.composables().iter());
}

fn print_section<'a>(title: &str, rows: impl Iterator<Item = (&'a String, &'a String)>) {
    let rows: Vec<_> = rows.collect();
    if rows.is_empty() {
        return;
    }
    println!("  {}:", title);
    for (key, value) in rows {
        println!("    {} = {}", key, value);
    }
}
