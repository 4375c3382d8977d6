//! `roco check` command

use anyhow::{bail, Result};

use rocolib::library::check_library;
use rocolib::util::GlobalContext;

pub fn execute(ctx: &GlobalContext) -> Result<()> {
    let library_dir = ctx.library_dir();
    let failures = check_library(&library_dir)?;

    if failures.is_empty() {
        eprintln!("     Checked {}", library_dir.display());
        return Ok(());
    }

    let count = failures.len();
    for failure in failures {
        eprintln!("{:?}", miette::Report::new(failure));
    }
    bail!("{} component file(s) failed to parse", count)
}
