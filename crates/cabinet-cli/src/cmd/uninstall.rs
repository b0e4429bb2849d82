use cabinet_core::commands;

use crate::dispatch::Context;
use crate::prompt::confirm;

pub(crate) fn run_uninstall(
    ctx: &Context,
    unit: &str,
    keep_backup: bool,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.open_store()?;
    let entry = store.resolve(unit)?;
    let question = if keep_backup {
        format!("Uninstall '{}' ({})?", entry.descriptor.name, entry.identifier)
    } else {
        format!(
            "Uninstall '{}' ({}) and delete its backup?",
            entry.descriptor.name, entry.identifier
        )
    };
    let identifier = entry.identifier.clone();
    if !confirm(&question, yes)? {
        eprintln!("Aborted.");
        return Ok(());
    }

    let removed = commands::uninstall::run(&mut store, &identifier, keep_backup)?;
    println!("Uninstalled {}", removed.identifier);
    if keep_backup && store.backup_path(&removed.identifier).is_file() {
        println!("Backup kept; `cabinet restore {}` brings it back.", removed.identifier);
    }
    Ok(())
}
