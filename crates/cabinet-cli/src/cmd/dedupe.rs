use cabinet_core::commands;

use crate::dispatch::Context;
use crate::prompt::confirm;

pub(crate) fn run_dedupe(ctx: &Context, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.open_store()?;
    let groups = commands::dedupe::find_duplicates(&store)?;
    if groups.is_empty() {
        println!("No duplicates found.");
        return Ok(());
    }

    for group in &groups {
        let (keep, extra) = group.identifiers.split_at(1);
        println!("keep {}, remove {}", keep.join(""), extra.join(", "));
    }
    let count: usize = groups.iter().map(|g| g.identifiers.len() - 1).sum();
    if !confirm(&format!("Uninstall {count} duplicate(s)?"), yes)? {
        eprintln!("Aborted.");
        return Ok(());
    }

    let removed = commands::dedupe::run(&mut store)?;
    println!("Removed {} duplicate(s)", removed.len());
    Ok(())
}
