use comfy_table::Cell;

use cabinet_core::commands;

use crate::dispatch::Context;
use crate::format::format_bytes;
use crate::table::CliTableTheme;

pub(crate) fn run_backups(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let store = ctx.open_store()?;
    let backups = commands::backups::run(&store)?;
    if backups.is_empty() {
        println!("No backups found.");
        return Ok(());
    }

    let theme = CliTableTheme::detect();
    let mut table = theme.new_data_table(&["#", "ID", "Size", "Installed"]);
    for backup in &backups {
        table.add_row(vec![
            Cell::new(backup.position),
            Cell::new(&backup.identifier),
            Cell::new(format_bytes(backup.size)),
            Cell::new(if backup.installed { "yes" } else { "no" }),
        ]);
    }
    println!("{table}");
    Ok(())
}
