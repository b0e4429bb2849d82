use std::process::{Command, Stdio};

use comfy_table::Cell;
use tracing::debug;

use cabinet_core::commands::play::resolve_runtime_entry;

use crate::dispatch::Context;
use crate::table::CliTableTheme;

pub(crate) fn run_play(
    ctx: &Context,
    unit: &str,
    args: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.open_store()?;
    store.save()?;
    let entry = resolve_runtime_entry(&store, unit)?;
    debug!(
        interpreter = %entry.interpreter,
        entry = %entry.entry_file.display(),
        "launching"
    );

    let status = Command::new(&entry.interpreter)
        .arg(&entry.entry_file)
        .args(args)
        .current_dir(&entry.working_dir)
        .status()
        .map_err(|e| format!("cannot start '{}': {e}", entry.interpreter))?;
    if !status.success() {
        return Err(format!("'{}' exited with {status}", entry.identifier).into());
    }
    Ok(())
}

/// Run `<command> --version` and return its first output line.
fn probe(command: &str) -> Option<String> {
    let output = Command::new(command)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    Some(
        String::from_utf8_lossy(&text)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
    )
}

pub(crate) fn run_check(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let runtimes = ctx.runtimes();
    let theme = CliTableTheme::detect();
    let mut table = theme.new_data_table(&["Language", "Command", "Status"]);
    let mut missing = 0usize;
    for (language, spec) in runtimes.iter() {
        let status = match probe(&spec.command) {
            Some(version) if !version.is_empty() => version,
            Some(_) => "available".to_string(),
            None => {
                missing += 1;
                "not found".to_string()
            }
        };
        table.add_row(vec![
            Cell::new(language),
            Cell::new(&spec.command),
            Cell::new(status),
        ]);
    }
    println!("{table}");
    if missing > 0 {
        eprintln!("{missing} interpreter(s) unavailable");
    }
    Ok(())
}
