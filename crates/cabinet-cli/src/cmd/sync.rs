use cabinet_core::commands;

use crate::dispatch::Context;

pub(crate) fn run_sync(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.open_store()?;
    let stats = commands::sync::run(&mut store)?;
    if stats.is_noop() {
        println!("Backups already up to date.");
    } else {
        println!(
            "Backups: {} created, {} refreshed, {} pruned",
            stats.created, stats.refreshed, stats.pruned
        );
    }
    Ok(())
}

pub(crate) fn run_restore(ctx: &Context, unit: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.open_store()?;
    let entry = commands::restore::run(&mut store, unit)?;
    println!(
        "Restored '{}' as {}",
        entry.descriptor.name, entry.identifier
    );
    Ok(())
}
