use std::path::Path;

use cabinet_core::commands;

use crate::dispatch::Context;

pub(crate) fn run_export(
    ctx: &Context,
    unit: &str,
    output: Option<&Path>,
    dir: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = ctx.open_store()?;
    let written = commands::export::run(&store, unit, output, !dir)?;
    println!("Exported to {}", written.display());
    Ok(())
}

pub(crate) fn run_batch_export(
    ctx: &Context,
    dest: &Path,
    dir: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = ctx.open_store()?;
    let written = commands::export::run_batch(&store, dest, !dir)?;
    for path in &written {
        println!("Exported to {}", path.display());
    }
    println!("{} game(s) exported", written.len());
    Ok(())
}
