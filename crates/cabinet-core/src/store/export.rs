use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::Store;
use crate::archive::{CanonicalArchive, ARCHIVE_SUFFIX};
use crate::error::{CabinetError, Result};
use crate::fsutil::copy_tree;

impl Store {
    /// Where an export of `identifier` to `destination` lands: inside it when
    /// it is an existing directory, otherwise at `destination` itself.
    pub fn export_target(identifier: &str, destination: &Path, as_archive: bool) -> PathBuf {
        if destination.is_dir() {
            if as_archive {
                destination.join(format!("{identifier}{ARCHIVE_SUFFIX}"))
            } else {
                destination.join(identifier)
            }
        } else {
            destination.to_path_buf()
        }
    }

    /// Copy a live unit out of the store as a canonical `.tar.gz` or as a
    /// plain directory. The store itself is never modified.
    ///
    /// Archives replace an existing file atomically; directory exports
    /// refuse to overwrite anything.
    pub fn export(&self, identifier: &str, destination: &Path, as_archive: bool) -> Result<PathBuf> {
        if self.get(identifier).is_none() {
            return Err(CabinetError::NotFound(format!(
                "no installed unit '{identifier}'"
            )));
        }
        let source = self.unit_dir(identifier);
        let target = Self::export_target(identifier, destination, as_archive);
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        if as_archive {
            if target.is_dir() {
                return Err(CabinetError::Conflict(format!(
                    "'{}' is a directory",
                    target.display()
                )));
            }
            CanonicalArchive::build(&source)?.write_to(&target)?;
        } else {
            if target.symlink_metadata().is_ok() {
                return Err(CabinetError::Conflict(format!(
                    "'{}' already exists",
                    target.display()
                )));
            }
            let staging = tempfile::Builder::new()
                .prefix(".cabinet-export-")
                .tempdir_in(&parent)?;
            copy_tree(&source, staging.path())?;
            fs::rename(staging.path(), &target)?;
            drop(staging);
        }

        info!(identifier, target = %target.display(), as_archive, "exported");
        Ok(target)
    }
}
