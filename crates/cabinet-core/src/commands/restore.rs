use tracing::info;

use crate::archive;
use crate::checksum::checksum_file;
use crate::error::{CabinetError, Result};
use crate::manifest::UnitDescriptor;
use crate::store::{IndexEntry, Store};

/// Run `cabinet restore`: rebuild a live unit strictly from its backup.
///
/// Never overwrites: an installed unit or an existing live directory with
/// the same identifier is a conflict.
pub fn run(store: &mut Store, selector: &str) -> Result<IndexEntry> {
    let identifier = store.resolve_backup(selector)?;
    if store.get(&identifier).is_some() || store.unit_dir(&identifier).exists() {
        return Err(CabinetError::Conflict(format!(
            "'{identifier}' is already installed; uninstall it first"
        )));
    }

    let backup_path = store.backup_path(&identifier);
    let incoming = store.incoming_dir()?;
    archive::extract(&backup_path, incoming.path())?;
    let descriptor = UnitDescriptor::load_from_dir(incoming.path(), store.runtimes())?;
    let checksum = checksum_file(&backup_path)?;

    let entry = store
        .commit_incoming(incoming, &identifier, descriptor, Some(checksum))?
        .clone();
    info!(%identifier, "restored from backup");
    Ok(entry)
}
