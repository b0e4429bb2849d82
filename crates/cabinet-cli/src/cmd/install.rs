use std::path::Path;

use cabinet_core::classify::Classification;
use cabinet_core::commands::install::{self, InstallOptions, InstallReport};

use crate::dispatch::Context;

fn options(ctx: &Context, collection: bool, no_backup: bool) -> InstallOptions {
    InstallOptions {
        force_collection: collection,
        backup: ctx.config.backup.on_install && !no_backup,
    }
}

fn print_report(report: &InstallReport) {
    for issue in &report.issues {
        eprintln!(
            "Warning: skipped {}: {}",
            issue.manifest_path.display(),
            issue.error
        );
    }
    for unit in &report.installed {
        println!("Installed '{}' as {}", unit.name, unit.identifier);
    }
    if report.classification == Classification::Collection {
        println!(
            "Collection: {} game(s) installed from {}",
            report.installed.len(),
            report.origin
        );
    }
}

pub(crate) fn run_install(
    ctx: &Context,
    source: &str,
    collection: bool,
    no_backup: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.open_store()?;
    let report = install::run(
        &mut store,
        source,
        &ctx.config.fetch,
        options(ctx, collection, no_backup),
    )?;
    print_report(&report);
    Ok(())
}

pub(crate) fn run_batch_install(
    ctx: &Context,
    path: &Path,
    archives: bool,
    no_backup: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.open_store()?;
    // Each source must hold a single game; collections are installed one by one.
    let report = install::run_batch(
        &mut store,
        path,
        archives,
        &ctx.config.fetch,
        options(ctx, false, no_backup),
    )?;

    for outcome in &report.outcomes {
        if let Ok(r) = &outcome.result {
            print_report(r);
        }
    }
    let failures: Vec<_> = report.failures().collect();
    for (origin, error) in &failures {
        eprintln!("Failed: {origin}: {error}");
    }
    println!(
        "Batch finished: {} installed, {} failed",
        report.installed_count(),
        failures.len()
    );
    if !failures.is_empty() {
        return Err(format!("{} source(s) failed to install", failures.len()).into());
    }
    Ok(())
}
