pub mod export;
pub mod index;
mod reconcile;
pub mod resolve;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::archive::{CanonicalArchive, ARCHIVE_SUFFIX};
use crate::config::StoreConfig;
use crate::error::{CabinetError, Result};
use crate::fsutil::copy_tree;
use crate::manifest::{self, UnitDescriptor, MANIFEST_FILE};
use crate::runtime::RuntimeTable;

pub use self::index::{IndexEntry, StoreIndex, INDEX_FILE};
pub use self::reconcile::ReconcileReport;

pub const LIVE_DIR: &str = "live";
pub const BACKUPS_DIR: &str = "backups";

pub(crate) const INCOMING_PREFIX: &str = ".incoming-";
pub(crate) const REMOVING_PREFIX: &str = ".removing-";

/// An opened store root: `live/`, `backups/` and `index.json`.
///
/// Every engine operation takes the store explicitly; nothing about the
/// current store is kept in process-wide state.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    live_dir: PathBuf,
    backups_dir: PathBuf,
    index_path: PathBuf,
    index: StoreIndex,
    runtimes: RuntimeTable,
    dirty: bool,
    reconcile_report: ReconcileReport,
}

impl Store {
    pub fn open(config: &StoreConfig, runtimes: RuntimeTable) -> Result<Self> {
        Self::open_at(&config.root_path(), runtimes)
    }

    /// Open (creating if needed) the store rooted at `root` and reconcile
    /// its index against what is actually on disk.
    pub fn open_at(root: &Path, runtimes: RuntimeTable) -> Result<Self> {
        let live_dir = root.join(LIVE_DIR);
        let backups_dir = root.join(BACKUPS_DIR);
        fs::create_dir_all(&live_dir)?;
        fs::create_dir_all(&backups_dir)?;
        let index_path = root.join(INDEX_FILE);
        let index = StoreIndex::load(&index_path)?;

        let mut store = Store {
            root: root.to_path_buf(),
            live_dir,
            backups_dir,
            index_path,
            index,
            runtimes,
            dirty: false,
            reconcile_report: ReconcileReport::default(),
        };
        let report = reconcile::reconcile(&mut store)?;
        if !report.is_clean() {
            store.dirty = true;
        }
        store.reconcile_report = report;
        debug!(root = %store.root.display(), units = store.index.len(), "store opened");
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn live_dir(&self) -> &Path {
        &self.live_dir
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn runtimes(&self) -> &RuntimeTable {
        &self.runtimes
    }

    /// What start-up reconciliation changed.
    pub fn reconcile_report(&self) -> &ReconcileReport {
        &self.reconcile_report
    }

    /// Installed units in installation order.
    pub fn units(&self) -> &[IndexEntry] {
        &self.index.units
    }

    pub fn get(&self, identifier: &str) -> Option<&IndexEntry> {
        self.index.find(identifier)
    }

    pub fn unit_dir(&self, identifier: &str) -> PathBuf {
        self.live_dir.join(identifier)
    }

    pub fn backup_path(&self, identifier: &str) -> PathBuf {
        self.backups_dir.join(format!("{identifier}{ARCHIVE_SUFFIX}"))
    }

    /// Whether the index has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the index if anything changed since it was last saved.
    pub fn save(&mut self) -> Result<()> {
        if self.dirty {
            self.commit_index()?;
        }
        Ok(())
    }

    fn commit_index(&mut self) -> Result<()> {
        self.index.save(&self.index_path)?;
        self.dirty = false;
        debug!(path = %self.index_path.display(), "index saved");
        Ok(())
    }

    /// Identifiers a new unit must not use: indexed units, anything present
    /// under `live/`, and retained backups.
    pub fn taken_identifiers(&self) -> Result<HashSet<String>> {
        let mut taken = self.index.identifiers();
        for entry in fs::read_dir(&self.live_dir)? {
            let entry = entry?;
            taken.insert(entry.file_name().to_string_lossy().to_string());
        }
        taken.extend(self.backup_identifiers()?);
        Ok(taken)
    }

    /// Identifiers of every archive in `backups/`, in lexical order.
    pub fn backup_identifiers(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(id) = name.strip_suffix(ARCHIVE_SUFFIX) {
                if !id.is_empty() && !id.starts_with('.') {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub(crate) fn set_backup_checksum(&mut self, identifier: &str, checksum: Option<String>) {
        if let Some(entry) = self.index.find_mut(identifier) {
            if entry.backup_checksum != checksum {
                entry.backup_checksum = checksum;
                self.dirty = true;
            }
        }
    }

    /// A fresh directory inside `live/` that is removed unless committed.
    pub(crate) fn incoming_dir(&self) -> Result<TempDir> {
        Ok(tempfile::Builder::new()
            .prefix(INCOMING_PREFIX)
            .tempdir_in(&self.live_dir)?)
    }

    fn ensure_vacant(&self, identifier: &str) -> Result<()> {
        if self.index.contains(identifier) {
            return Err(CabinetError::Conflict(format!(
                "'{identifier}' is already installed"
            )));
        }
        if self.unit_dir(identifier).symlink_metadata().is_ok() {
            return Err(CabinetError::Conflict(format!(
                "'{}' already exists",
                self.unit_dir(identifier).display()
            )));
        }
        Ok(())
    }

    /// Move a fully prepared incoming directory to `live/<identifier>` and
    /// record it in the index.
    pub(crate) fn commit_incoming(
        &mut self,
        incoming: TempDir,
        identifier: &str,
        descriptor: UnitDescriptor,
        backup_checksum: Option<String>,
    ) -> Result<&IndexEntry> {
        self.ensure_vacant(identifier)?;
        let final_dir = self.unit_dir(identifier);
        fs::rename(incoming.path(), &final_dir)?;
        // The guard's path is gone now, so dropping it removes nothing.
        drop(incoming);

        self.index
            .insert(IndexEntry::new(identifier, descriptor, backup_checksum));
        self.dirty = true;
        if let Err(e) = self.commit_index() {
            self.index.remove(identifier);
            if let Err(cleanup) = fs::remove_dir_all(&final_dir) {
                warn!(path = %final_dir.display(), %cleanup, "failed to roll back live directory");
            }
            return Err(e);
        }
        self.index
            .find(identifier)
            .ok_or_else(|| CabinetError::NotFound(identifier.to_string()))
    }

    /// Install a copy of `source_dir` under `identifier`.
    ///
    /// The copy is assembled in `live/.incoming-*`, given a canonical
    /// manifest, and only then renamed into place. With `backup`, the backup
    /// archive is written before the index records the unit.
    pub fn add(
        &mut self,
        identifier: &str,
        descriptor: &UnitDescriptor,
        source_dir: &Path,
        backup: bool,
    ) -> Result<&IndexEntry> {
        self.ensure_vacant(identifier)?;

        let incoming = self.incoming_dir()?;
        copy_tree(source_dir, incoming.path())?;
        manifest::write_canonical(incoming.path(), descriptor)?;
        fs::File::open(incoming.path().join(MANIFEST_FILE))?.sync_all()?;

        let backup_path = self.backup_path(identifier);
        let checksum = if backup {
            let archive = CanonicalArchive::build(incoming.path())?;
            archive.write_to(&backup_path)?;
            debug!(identifier, checksum = %archive.checksum, "backup written");
            Some(archive.checksum)
        } else {
            None
        };

        let committed = self.commit_incoming(incoming, identifier, descriptor.clone(), checksum);
        if committed.is_err() && backup {
            if let Err(cleanup) = fs::remove_file(&backup_path) {
                warn!(path = %backup_path.display(), %cleanup, "failed to roll back backup archive");
            }
        }
        let entry = committed?;
        info!(identifier = %entry.identifier, name = %entry.descriptor.name, "installed");
        Ok(entry)
    }

    /// Delete a unit's live directory and index entry, and its backup unless
    /// `keep_backup` is set.
    pub fn remove(&mut self, identifier: &str, keep_backup: bool) -> Result<IndexEntry> {
        if !self.index.contains(identifier) {
            return Err(CabinetError::NotFound(format!(
                "no installed unit '{identifier}'"
            )));
        }

        let live = self.unit_dir(identifier);
        let removing = self
            .live_dir
            .join(format!("{REMOVING_PREFIX}{identifier}"));
        if removing.exists() {
            fs::remove_dir_all(&removing)?;
        }
        let moved = if live.exists() {
            fs::rename(&live, &removing)?;
            true
        } else {
            false
        };

        if !keep_backup {
            let backup = self.backup_path(identifier);
            match fs::remove_file(&backup) {
                Ok(()) => debug!(path = %backup.display(), "backup deleted"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        let entry = self
            .index
            .remove(identifier)
            .ok_or_else(|| CabinetError::NotFound(identifier.to_string()))?;
        self.dirty = true;
        self.commit_index()?;

        if moved {
            fs::remove_dir_all(&removing)?;
        }
        info!(identifier, keep_backup, "uninstalled");
        Ok(entry)
    }
}
