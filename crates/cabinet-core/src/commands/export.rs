use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::store::Store;

/// Run `cabinet export`. Without a destination the export lands in the
/// current directory.
pub fn run(
    store: &Store,
    selector: &str,
    destination: Option<&Path>,
    as_archive: bool,
) -> Result<PathBuf> {
    let identifier = store.resolve(selector)?.identifier.clone();
    store.export(&identifier, destination.unwrap_or(Path::new(".")), as_archive)
}

/// Export every installed unit into `destination`, creating it if needed.
///
/// Stops at the first failure; exports already written are left in place.
pub fn run_batch(store: &Store, destination: &Path, as_archive: bool) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(destination)?;
    let mut written = Vec::with_capacity(store.units().len());
    for entry in store.units() {
        written.push(store.export(&entry.identifier, destination, as_archive)?);
    }
    info!(count = written.len(), destination = %destination.display(), "batch export finished");
    Ok(written)
}
