//! `roco list` command

use anyhow::Result;

use crate::cli::ListArgs;
use rocolib::core::DefinitionOrigin;
use rocolib::util::GlobalContext;
use rocolib::InstanceCache;

pub fn execute(args: ListArgs, ctx: &GlobalContext) -> Result<()> {
    let registry = super::registry(ctx)?;

    if registry.is_empty() {
        eprintln!("No component definitions found");
        return Ok(());
    }

    let cache = InstanceCache::new(ctx.cache_dir());
    for name in registry.names() {
        if !args.long {
            println!("{}", name);
            continue;
        }

        let origin = match registry.resolve(&name).map(|d| d.origin()) {
            Some(DefinitionOrigin::Declarative(path)) => path.display().to_string(),
            _ => "built-in".to_string(),
        };
        // Names that are not valid cache keys can never be cached
        let cached = if cache.exists(&name).unwrap_or(false) {
            " (cached)"
        } else {
            ""
        };
        println!("{:<20} {}{}", name, origin, cached);
    }

    Ok(())
}
