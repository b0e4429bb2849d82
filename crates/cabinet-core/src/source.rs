use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::archive;
use crate::config::FetchConfig;
use crate::error::{CabinetError, Result};
use crate::fetch;

/// A source made available as a local directory tree.
///
/// When the source had to be unpacked or downloaded, the staging directory
/// is owned here and removed on drop, whichever way the caller exits.
#[derive(Debug)]
pub struct Staging {
    origin: String,
    root: PathBuf,
    _temp: Option<TempDir>,
}

impl Staging {
    /// Directory to scan for manifests.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The source string as the user gave it.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn is_temporary(&self) -> bool {
        self._temp.is_some()
    }
}

fn staging_dir(parent: &Path) -> Result<TempDir> {
    Ok(tempfile::Builder::new()
        .prefix("cabinet-staging-")
        .tempdir_in(parent)?)
}

/// Turn a directory path, archive path, or archive URL into a scannable tree,
/// staging in the system temp directory.
pub fn resolve(origin: &str, fetch_config: &FetchConfig) -> Result<Staging> {
    resolve_in(origin, fetch_config, &std::env::temp_dir())
}

/// Like [`resolve`], with staging directories created under `scratch`.
pub fn resolve_in(origin: &str, fetch_config: &FetchConfig, scratch: &Path) -> Result<Staging> {
    if fetch::is_url(origin) {
        let temp = staging_dir(scratch)?;
        let download = temp.path().join("download");
        fetch::download(origin.trim(), &download, fetch_config)?;
        let unpacked = temp.path().join("unpacked");
        std::fs::create_dir(&unpacked)?;
        archive::extract(&download, &unpacked).map_err(|e| match e {
            CabinetError::Archive { reason, .. } => CabinetError::archive(origin, reason),
            other => other,
        })?;
        std::fs::remove_file(&download)?;
        debug!(%origin, staging = %unpacked.display(), "staged remote archive");
        return Ok(Staging {
            origin: origin.to_string(),
            root: unpacked,
            _temp: Some(temp),
        });
    }

    let path = Path::new(origin);
    if path.is_dir() {
        debug!(%origin, "using local directory in place");
        return Ok(Staging {
            origin: origin.to_string(),
            root: path.to_path_buf(),
            _temp: None,
        });
    }
    if path.is_file() {
        let temp = staging_dir(scratch)?;
        archive::extract(path, temp.path())?;
        debug!(%origin, staging = %temp.path().display(), "staged local archive");
        return Ok(Staging {
            origin: origin.to_string(),
            root: temp.path().to_path_buf(),
            _temp: Some(temp),
        });
    }

    Err(CabinetError::NotFound(format!(
        "source '{origin}' is not a directory, archive, or URL"
    )))
}
