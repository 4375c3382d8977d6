//! `roco sync` command

use anyhow::Result;

use crate::cli::SyncArgs;
use rocolib::db::Table;
use rocolib::ops::build_each;
use rocolib::util::diagnostic::emit;
use rocolib::util::GlobalContext;

pub fn execute(args: SyncArgs, ctx: &GlobalContext) -> Result<()> {
    let registry = super::registry(ctx)?;
    let factory = super::factory(ctx, &registry);
    let opts = super::get_options(ctx, args.remake);

    let names = if args.names.is_empty() {
        registry.names()
    } else {
        args.names
    };

    let built = build_each(&factory, &names, &opts);
    if !built.skipped.is_empty() {
        emit(&super::skipped_diagnostic(&built.skipped), ctx.color());
    }

    let mut store = super::open_store(ctx)?;
    let report = store.build_database(&built.matched)?;

    eprintln!(
        "     Indexed {} component(s) into {}",
        built.matched.len(),
        ctx.database_path().display()
    );
    for table in Table::ALL {
        let inserted = report.get(table);
        if inserted > 0 {
            eprintln!("     {:>5} new row(s) in {}", inserted, table.as_str());
        }
    }
    Ok(())
}
