//! `roco filter` command

use anyhow::Result;

use crate::cli::FilterArgs;
use rocolib::ops::{filter_by_capability, filter_stored};
use rocolib::util::diagnostic::emit;
use rocolib::util::GlobalContext;
use rocolib::HasCapabilities;

pub fn execute(args: FilterArgs, ctx: &GlobalContext) -> Result<()> {
    let (names, skipped, summary) = if args.stored {
        let store = super::open_store(ctx)?;
        let report = filter_stored(&store, store.stored_names()?, &args.capability);
        let names: Vec<String> = report
            .matched
            .iter()
            .map(|item| item.name().to_string())
            .collect();
        (names, report.skipped.clone(), report.summary())
    } else {
        let registry = super::registry(ctx)?;
        let factory = super::factory(ctx, &registry);
        let report = filter_by_capability(&factory, &args.capability);
        let names: Vec<String> = report
            .matched
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        (names, report.skipped.clone(), report.summary())
    };

    for name in &names {
        println!("{}", name);
    }

    if !skipped.is_empty() {
        emit(&super::skipped_diagnostic(&skipped), ctx.color());
    }
    eprintln!("     {}", summary);
    Ok(())
}
