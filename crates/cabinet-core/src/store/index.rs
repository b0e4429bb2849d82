use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fsutil::atomic_write;
use crate::manifest::UnitDescriptor;

pub const INDEX_FILE: &str = "index.json";
pub const INDEX_VERSION: u32 = 1;

/// The store index: every installed unit, in installation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreIndex {
    pub version: u32,
    pub units: Vec<IndexEntry>,
}

/// A single installed unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub identifier: String,
    pub descriptor: UnitDescriptor,
    pub installed_at: DateTime<Utc>,
    /// Live directory relative to the store root.
    pub path: String,
    /// Checksum of the backup archive last written for this unit.
    #[serde(default)]
    pub backup_checksum: Option<String>,
}

impl IndexEntry {
    pub fn new(identifier: &str, descriptor: UnitDescriptor, backup_checksum: Option<String>) -> Self {
        Self {
            identifier: identifier.to_string(),
            descriptor,
            installed_at: Utc::now(),
            path: live_path_for(identifier),
            backup_checksum,
        }
    }
}

pub(crate) fn live_path_for(identifier: &str) -> String {
    format!("live/{identifier}")
}

impl StoreIndex {
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            units: Vec::new(),
        }
    }

    /// Load the index, or an empty one if the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let index: StoreIndex = serde_json::from_slice(&bytes)?;
        if index.version != INDEX_VERSION {
            return Err(<serde_json::Error as serde::de::Error>::custom(format!(
                "unsupported index version {} (expected {INDEX_VERSION})",
                index.version
            ))
            .into());
        }
        Ok(index)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        atomic_write(path, &bytes)
    }

    pub fn find(&self, identifier: &str) -> Option<&IndexEntry> {
        self.units.iter().find(|u| u.identifier == identifier)
    }

    pub fn find_mut(&mut self, identifier: &str) -> Option<&mut IndexEntry> {
        self.units.iter_mut().find(|u| u.identifier == identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.find(identifier).is_some()
    }

    /// Append an entry. Callers guarantee the identifier is not present.
    pub fn insert(&mut self, entry: IndexEntry) {
        debug_assert!(!self.contains(&entry.identifier));
        self.units.push(entry);
    }

    /// Remove a unit by identifier. Returns the removed entry, or None if not found.
    pub fn remove(&mut self, identifier: &str) -> Option<IndexEntry> {
        let pos = self.units.iter().position(|u| u.identifier == identifier)?;
        Some(self.units.remove(pos))
    }

    pub fn identifiers(&self) -> HashSet<String> {
        self.units.iter().map(|u| u.identifier.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Default for StoreIndex {
    fn default() -> Self {
        Self::new()
    }
}
