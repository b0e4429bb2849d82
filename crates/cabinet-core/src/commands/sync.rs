use std::fs;

use tracing::{debug, info};

use crate::archive::CanonicalArchive;
use crate::checksum::checksum_file;
use crate::error::Result;
use crate::store::Store;

/// Counters reported by `cabinet sync`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Backups written for units that had none.
    pub created: usize,
    /// Backups rewritten because the live content changed.
    pub refreshed: usize,
    /// Backups deleted because their unit is no longer installed.
    pub pruned: usize,
}

impl SyncStats {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.refreshed == 0 && self.pruned == 0
    }
}

/// Run `cabinet sync`: bring `backups/` in line with `live/`.
///
/// An archive whose bytes already equal the canonical archive of the live
/// directory is left untouched, so a repeated sync writes nothing.
pub fn run(store: &mut Store) -> Result<SyncStats> {
    let mut stats = SyncStats::default();

    let identifiers: Vec<String> = store
        .units()
        .iter()
        .map(|u| u.identifier.clone())
        .collect();

    for identifier in &identifiers {
        let fresh = CanonicalArchive::build(&store.unit_dir(identifier))?;
        let backup_path = store.backup_path(identifier);

        if !backup_path.is_file() {
            fresh.write_to(&backup_path)?;
            debug!(%identifier, "backup created");
            stats.created += 1;
        } else if checksum_file(&backup_path)? != fresh.checksum {
            fresh.write_to(&backup_path)?;
            debug!(%identifier, "backup refreshed");
            stats.refreshed += 1;
        }
        store.set_backup_checksum(identifier, Some(fresh.checksum));
    }

    for identifier in store.backup_identifiers()? {
        if store.get(&identifier).is_none() {
            fs::remove_file(store.backup_path(&identifier))?;
            debug!(%identifier, "orphaned backup pruned");
            stats.pruned += 1;
        }
    }

    store.save()?;
    info!(
        created = stats.created,
        refreshed = stats.refreshed,
        pruned = stats.pruned,
        "sync finished"
    );
    Ok(stats)
}
