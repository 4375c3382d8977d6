//! `roco query` command

use anyhow::Result;

use crate::cli::QueryArgs;
use rocolib::util::diagnostic::{suggestions, Diagnostic};
use rocolib::util::GlobalContext;

pub fn execute(args: QueryArgs, ctx: &GlobalContext) -> Result<()> {
    let store = super::open_store(ctx)?;

    let Some(item) = store.query_by_name(&args.name)? else {
        return Err(NotIndexed(args.name).into());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        super::print_item(&item);
    }
    Ok(())
}

/// The component has never been synchronized.
#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not in the index")]
pub struct NotIndexed(pub String);

impl NotIndexed {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string()).with_suggestion(suggestions::NOT_STORED)
    }
}
