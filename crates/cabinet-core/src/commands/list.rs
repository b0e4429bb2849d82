use chrono::{DateTime, Utc};

use crate::manifest::UnitDescriptor;
use crate::store::Store;

/// One row of `cabinet list`.
#[derive(Debug, Clone)]
pub struct UnitListing {
    /// 1-based position, usable as a selector.
    pub position: usize,
    pub identifier: String,
    pub descriptor: UnitDescriptor,
    pub installed_at: DateTime<Utc>,
    pub backed_up: bool,
}

/// Installed units in installation order.
pub fn run(store: &Store) -> Vec<UnitListing> {
    store
        .units()
        .iter()
        .enumerate()
        .map(|(i, entry)| UnitListing {
            position: i + 1,
            identifier: entry.identifier.clone(),
            descriptor: entry.descriptor.clone(),
            installed_at: entry.installed_at,
            backed_up: store.backup_path(&entry.identifier).is_file(),
        })
        .collect()
}
