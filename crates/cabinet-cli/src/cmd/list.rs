use comfy_table::Cell;

use cabinet_core::commands;

use crate::dispatch::Context;
use crate::format::{format_time, or_dash};
use crate::table::CliTableTheme;

pub(crate) fn run_list(ctx: &Context, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.open_store()?;
    store.save()?;
    let units = commands::list::run(&store);
    if units.is_empty() {
        println!("No games installed.");
        return Ok(());
    }

    let theme = CliTableTheme::detect();
    let headers: &[&str] = if verbose {
        &["#", "ID", "Name", "Author", "Generator", "Version", "Language", "Installed", "Backup"]
    } else {
        &["#", "ID", "Name", "Author", "Language"]
    };
    let mut table = theme.new_data_table(headers);

    for unit in &units {
        let d = &unit.descriptor;
        let mut row = vec![
            Cell::new(unit.position),
            Cell::new(&unit.identifier),
            Cell::new(&d.name),
            Cell::new(d.author_or_unknown()),
        ];
        if verbose {
            row.push(Cell::new(or_dash(d.generator.as_deref())));
            row.push(Cell::new(or_dash(d.version.as_deref())));
            let language = match d.language_version.as_deref() {
                Some(v) => format!("{} {v}", d.language),
                None => d.language.clone(),
            };
            row.push(Cell::new(language));
            row.push(Cell::new(format_time(unit.installed_at)));
            row.push(Cell::new(if unit.backed_up { "yes" } else { "no" }));
        } else {
            row.push(Cell::new(&d.language));
        }
        table.add_row(row);
    }
    println!("{table}");
    Ok(())
}
