//! `roco make` command

use anyhow::Result;

use crate::cli::MakeArgs;
use rocolib::ops::OverridePolicy;
use rocolib::util::GlobalContext;
use rocolib::ComponentQueryItem;

pub fn execute(args: MakeArgs, ctx: &GlobalContext) -> Result<()> {
    let registry = super::registry(ctx)?;
    let factory = super::factory(ctx, &registry);

    let mut opts = super::get_options(ctx, args.remake);
    opts.overrides = args.overrides.into_iter().collect();
    if args.ignore_overrides {
        opts.override_policy = OverridePolicy::Ignore;
    }

    let component = factory.get(&args.name, &opts)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&component)?);
    } else {
        super::print_item(&ComponentQueryItem::project(&component));
    }
    Ok(())
}
