use std::path::PathBuf;

use crate::error::Result;
use crate::fsutil::tree_size;
use crate::store::Store;

/// Store statistics for the `info` command.
#[derive(Debug, Clone)]
pub struct StoreInfo {
    pub root: PathBuf,
    pub index_path: PathBuf,
    pub unit_count: usize,
    pub live_size: u64,
    pub backup_count: usize,
    pub backup_size: u64,
    pub orphaned_backups: usize,
    pub units_without_backup: usize,
    pub runtime_count: usize,
}

/// Run `cabinet info`.
pub fn run(store: &Store) -> Result<StoreInfo> {
    let backups = store.backup_identifiers()?;
    let mut backup_size = 0u64;
    for identifier in &backups {
        backup_size = backup_size.saturating_add(std::fs::metadata(store.backup_path(identifier))?.len());
    }

    let orphaned_backups = backups.iter().filter(|id| store.get(id).is_none()).count();
    let units_without_backup = store
        .units()
        .iter()
        .filter(|u| !store.backup_path(&u.identifier).is_file())
        .count();

    Ok(StoreInfo {
        root: store.root().to_path_buf(),
        index_path: store.index_path().to_path_buf(),
        unit_count: store.units().len(),
        live_size: tree_size(store.live_dir()),
        backup_count: backups.len(),
        backup_size,
        orphaned_backups,
        units_without_backup,
        runtime_count: store.runtimes().languages().count(),
    })
}
