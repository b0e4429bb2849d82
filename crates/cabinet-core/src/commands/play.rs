use std::path::PathBuf;

use crate::error::{CabinetError, Result};
use crate::runtime::find_entry_file;
use crate::store::Store;

/// Everything needed to launch an installed unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEntry {
    pub identifier: String,
    /// Interpreter command from the runtime table.
    pub interpreter: String,
    /// Absolute path of the entry file.
    pub entry_file: PathBuf,
    /// Directory the interpreter should run in.
    pub working_dir: PathBuf,
}

/// Resolve the entry file and interpreter for an installed unit.
///
/// Launching is left to the caller.
pub fn resolve_runtime_entry(store: &Store, selector: &str) -> Result<RuntimeEntry> {
    let entry = store.resolve(selector)?;
    let language = &entry.descriptor.language;
    let runtime = store.runtimes().get(language).ok_or_else(|| {
        CabinetError::validation(
            store.unit_dir(&entry.identifier),
            format!("no runtime configured for language '{language}'"),
        )
    })?;

    let unit_dir = store.unit_dir(&entry.identifier);
    let entry_dir = entry.descriptor.entry_dir(&unit_dir);
    if !entry_dir.is_dir() {
        return Err(CabinetError::NotFound(format!(
            "entry directory '{}' of '{}' does not exist",
            entry_dir.display(),
            entry.identifier
        )));
    }
    let entry_file = find_entry_file(&entry_dir, runtime)?.ok_or_else(|| {
        CabinetError::NotFound(format!(
            "no {} entry file in '{}'",
            runtime.extension,
            entry_dir.display()
        ))
    })?;

    Ok(RuntimeEntry {
        identifier: entry.identifier.clone(),
        interpreter: runtime.command.clone(),
        entry_file: std::fs::canonicalize(&entry_file)?,
        working_dir: std::fs::canonicalize(&entry_dir)?,
    })
}
