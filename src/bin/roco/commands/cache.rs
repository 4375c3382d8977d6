//! `roco cache` command
//!
//! Manage the instance cache (one snapshot per component name).

use anyhow::Result;

use crate::cli::{CacheArgs, CacheCommands};
use rocolib::util::GlobalContext;
use rocolib::InstanceCache;

pub fn execute(args: CacheArgs, ctx: &GlobalContext) -> Result<()> {
    let cache = InstanceCache::new(ctx.cache_dir());

    match args.command {
        CacheCommands::List => list_cache(&cache),
        CacheCommands::Remove(remove) => {
            if cache.remove(&remove.name)? {
                eprintln!("     Removed {}", remove.name);
            } else {
                eprintln!("     `{}` is not cached", remove.name);
            }
            Ok(())
        }
        CacheCommands::Clear => {
            let removed = cache.clear()?;
            eprintln!("     Removed {} snapshot(s)", removed);
            Ok(())
        }
        CacheCommands::Path => {
            println!("{}", cache.dir().display());
            Ok(())
        }
    }
}

fn list_cache(cache: &InstanceCache) -> Result<()> {
    let names = cache.list()?;
    if names.is_empty() {
        eprintln!("Cache is empty ({})", cache.dir().display());
        return Ok(());
    }

    for name in names {
        let size = cache
            .snapshot_path(&name)
            .ok()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);
        println!("{:<20} {}", name, format_size(size));
    }
    Ok(())
}

/// Format a byte count for display.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MiB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
