use cabinet_core::commands;

use crate::dispatch::Context;
use crate::format::format_bytes;
use crate::table::{add_kv_row, CliTableTheme};

pub(crate) fn run_info(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.open_store()?;
    store.save()?;
    let info = commands::info::run(&store)?;

    let theme = CliTableTheme::detect();
    let mut table = theme.new_kv_table();
    add_kv_row(&mut table, theme, "Store", info.root.display());
    add_kv_row(&mut table, theme, "Index", info.index_path.display());
    add_kv_row(&mut table, theme, "Games", info.unit_count);
    add_kv_row(&mut table, theme, "Live size", format_bytes(info.live_size));
    add_kv_row(&mut table, theme, "Backups", info.backup_count);
    add_kv_row(&mut table, theme, "Backup size", format_bytes(info.backup_size));
    add_kv_row(&mut table, theme, "Orphaned backups", info.orphaned_backups);
    add_kv_row(&mut table, theme, "Without backup", info.units_without_backup);
    add_kv_row(&mut table, theme, "Runtimes", info.runtime_count);
    println!("{table}");
    Ok(())
}
