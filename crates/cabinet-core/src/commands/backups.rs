use crate::error::Result;
use crate::store::Store;

/// One archive in `backups/`.
#[derive(Debug, Clone)]
pub struct BackupListing {
    /// 1-based position in lexical order, usable as a restore selector.
    pub position: usize,
    pub identifier: String,
    pub size: u64,
    pub installed: bool,
}

/// Run `cabinet backups`.
pub fn run(store: &Store) -> Result<Vec<BackupListing>> {
    store
        .backup_identifiers()?
        .into_iter()
        .enumerate()
        .map(|(i, identifier)| -> Result<BackupListing> {
            let size = std::fs::metadata(store.backup_path(&identifier))?.len();
            Ok(BackupListing {
                position: i + 1,
                installed: store.get(&identifier).is_some(),
                identifier,
                size,
            })
        })
        .collect()
}
