use crate::error::Result;
use crate::store::{IndexEntry, Store};

/// Run `cabinet uninstall`. Returns the removed index entry.
pub fn run(store: &mut Store, selector: &str, keep_backup: bool) -> Result<IndexEntry> {
    let identifier = store.resolve(selector)?.identifier.clone();
    store.remove(&identifier, keep_backup)
}
