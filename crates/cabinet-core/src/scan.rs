use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::CabinetError;
use crate::manifest::{UnitDescriptor, MANIFEST_FILE};
use crate::runtime::RuntimeTable;

/// A unit found in a source tree whose manifest validated.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub unit_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub descriptor: UnitDescriptor,
    pub entry_dir: PathBuf,
}

/// A manifest that failed validation. Reported, never fatal to the scan.
#[derive(Debug)]
pub struct ScanIssue {
    pub manifest_path: PathBuf,
    pub error: CabinetError,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub candidates: Vec<Candidate>,
    pub issues: Vec<ScanIssue>,
}

impl ScanReport {
    pub fn valid_count(&self) -> usize {
        self.candidates.len()
    }
}

/// Walk `root` in lexical order and validate every `game.json` found.
///
/// Symlinks are not followed. Directories that cannot be read are skipped
/// with a warning.
pub fn scan(root: &Path, runtimes: &RuntimeTable) -> ScanReport {
    let mut report = ScanReport::default();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%err, root = %root.display(), "skipping unreadable path during scan");
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() != MANIFEST_FILE {
            continue;
        }

        let manifest_path = entry.path().to_path_buf();
        let unit_dir = match manifest_path.parent() {
            Some(dir) => dir.to_path_buf(),
            None => continue,
        };

        match UnitDescriptor::load(&manifest_path, runtimes) {
            Ok(descriptor) => {
                debug!(path = %manifest_path.display(), name = %descriptor.name, "found unit");
                let entry_dir = descriptor.entry_dir(&unit_dir);
                report.candidates.push(Candidate {
                    unit_dir,
                    manifest_path,
                    descriptor,
                    entry_dir,
                });
            }
            Err(error) => {
                warn!(path = %manifest_path.display(), %error, "skipping invalid manifest");
                report.issues.push(ScanIssue {
                    manifest_path,
                    error,
                });
            }
        }
    }

    report
}
