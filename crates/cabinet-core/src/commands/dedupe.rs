use std::collections::HashMap;

use tracing::info;

use crate::error::Result;
use crate::store::Store;

/// Installed units whose manifests are identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub fingerprint: String,
    /// In installation order; the first one is the one kept by [`run`].
    pub identifiers: Vec<String>,
}

/// Group installed units by the hash of their canonical manifest.
pub fn find_duplicates(store: &Store) -> Result<Vec<DuplicateGroup>> {
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut by_fingerprint: HashMap<String, usize> = HashMap::new();

    for entry in store.units() {
        let fingerprint = entry.descriptor.fingerprint()?;
        match by_fingerprint.get(&fingerprint) {
            Some(&i) => groups[i].identifiers.push(entry.identifier.clone()),
            None => {
                by_fingerprint.insert(fingerprint.clone(), groups.len());
                groups.push(DuplicateGroup {
                    fingerprint,
                    identifiers: vec![entry.identifier.clone()],
                });
            }
        }
    }

    groups.retain(|g| g.identifiers.len() > 1);
    Ok(groups)
}

/// Run `cabinet dedupe`: uninstall all but the first unit of each group.
///
/// Returns the identifiers removed.
pub fn run(store: &mut Store) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for group in find_duplicates(store)? {
        for identifier in group.identifiers.into_iter().skip(1) {
            store.remove(&identifier, false)?;
            removed.push(identifier);
        }
    }
    info!(removed = removed.len(), "dedupe finished");
    Ok(removed)
}
