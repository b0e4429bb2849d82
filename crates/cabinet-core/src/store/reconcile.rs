use std::collections::HashSet;
use std::fs;

use tracing::{debug, warn};

use super::index::{live_path_for, IndexEntry};
use super::{Store, INCOMING_PREFIX, REMOVING_PREFIX};
use crate::error::Result;
use crate::ident::slugify;
use crate::manifest::UnitDescriptor;

/// Changes made while bringing the index in line with the disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Index entries whose live directory was missing or did not match, and
    /// repeated identifiers (only the first entry for an identifier is kept).
    pub dropped: Vec<String>,
    /// Valid live directories that had no index entry.
    pub adopted: Vec<String>,
    /// Leftovers of interrupted installs or removals that were deleted.
    pub cleaned: usize,
    /// Recorded checksums cleared because the backup file is gone.
    pub cleared_checksums: usize,
    /// Entries whose stored `path` field was rewritten.
    pub repaired_paths: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
            && self.adopted.is_empty()
            && self.cleared_checksums == 0
            && self.repaired_paths == 0
    }
}

pub(super) fn reconcile(store: &mut Store) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();

    // Leftovers from interrupted operations.
    for entry in fs::read_dir(&store.live_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(INCOMING_PREFIX) || name.starts_with(REMOVING_PREFIX) {
            warn!(path = %entry.path().display(), "removing leftover from interrupted operation");
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
            report.cleaned += 1;
        }
    }

    // Index entries must be unique and match their live directory.
    let mut kept: Vec<IndexEntry> = Vec::with_capacity(store.index.units.len());
    let mut seen: HashSet<String> = HashSet::new();
    for mut entry in std::mem::take(&mut store.index.units) {
        if !seen.insert(entry.identifier.clone()) {
            warn!(identifier = %entry.identifier, "dropping duplicate index entry");
            report.dropped.push(entry.identifier);
            continue;
        }
        let dir = store.unit_dir(&entry.identifier);
        if !dir.is_dir() {
            warn!(identifier = %entry.identifier, "dropping index entry: live directory missing");
            report.dropped.push(entry.identifier);
            continue;
        }
        match UnitDescriptor::load_from_dir(&dir, &store.runtimes) {
            Ok(on_disk) if on_disk == entry.descriptor => {
                let expected = live_path_for(&entry.identifier);
                if entry.path != expected {
                    entry.path = expected;
                    report.repaired_paths += 1;
                }
                kept.push(entry);
            }
            Ok(_) => {
                warn!(identifier = %entry.identifier, "dropping index entry: manifest changed on disk");
                report.dropped.push(entry.identifier);
            }
            Err(e) => {
                warn!(identifier = %entry.identifier, error = %e, "dropping index entry: manifest unreadable");
                report.dropped.push(entry.identifier);
            }
        }
    }
    store.index.units = kept;

    // Valid live directories nobody indexed.
    let mut names: Vec<String> = fs::read_dir(&store.live_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    for name in names {
        if store.index.contains(&name) {
            continue;
        }
        if slugify(&name) != name {
            debug!(%name, "ignoring live directory with a non-identifier name");
            continue;
        }
        match UnitDescriptor::load_from_dir(&store.unit_dir(&name), &store.runtimes) {
            Ok(descriptor) => {
                warn!(identifier = %name, "adopting unindexed live directory");
                store.index.insert(IndexEntry::new(&name, descriptor, None));
                report.adopted.push(name);
            }
            Err(e) => {
                debug!(identifier = %name, error = %e, "leaving invalid live directory alone");
            }
        }
    }

    // Checksums only make sense while the archive exists.
    let backups_dir = store.backups_dir.clone();
    for entry in store.index.units.iter_mut() {
        if entry.backup_checksum.is_some() {
            let path = backups_dir.join(format!(
                "{}{}",
                entry.identifier,
                crate::archive::ARCHIVE_SUFFIX
            ));
            if !path.is_file() {
                warn!(identifier = %entry.identifier, "backup archive missing; clearing checksum");
                entry.backup_checksum = None;
                report.cleared_checksums += 1;
            }
        }
    }

    Ok(report)
}
