use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::archive;
use crate::classify::{classify, Classification};
use crate::config::FetchConfig;
use crate::error::{CabinetError, Result};
use crate::ident::resolve_identifier;
use crate::scan::{scan, ScanIssue};
use crate::source;
use crate::store::Store;

#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    /// Install every valid unit found instead of requiring exactly one.
    pub force_collection: bool,
    /// Write a backup archive for each installed unit.
    pub backup: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            force_collection: false,
            backup: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstalledUnit {
    pub identifier: String,
    pub name: String,
}

/// Outcome of installing one source.
#[derive(Debug)]
pub struct InstallReport {
    pub origin: String,
    pub classification: Classification,
    pub installed: Vec<InstalledUnit>,
    /// Manifests that failed validation and were skipped.
    pub issues: Vec<ScanIssue>,
}

/// Run `cabinet install`.
pub fn run(
    store: &mut Store,
    origin: &str,
    fetch: &FetchConfig,
    options: InstallOptions,
) -> Result<InstallReport> {
    let staging = source::resolve(origin, fetch)?;
    let report = scan(staging.root(), store.runtimes());
    let classification = classify(origin, report.valid_count(), options.force_collection)?;
    if report.valid_count() == 0 {
        return Err(CabinetError::AmbiguousSource {
            origin: origin.to_string(),
            found: 0,
        });
    }

    let mut installed = Vec::with_capacity(report.candidates.len());
    for candidate in &report.candidates {
        let taken = store.taken_identifiers()?;
        let identifier = resolve_identifier(&candidate.descriptor, &taken);
        store.add(
            &identifier,
            &candidate.descriptor,
            &candidate.unit_dir,
            options.backup,
        )?;
        installed.push(InstalledUnit {
            identifier,
            name: candidate.descriptor.name.clone(),
        });
    }

    info!(
        %origin,
        installed = installed.len(),
        skipped = report.issues.len(),
        "install finished"
    );
    Ok(InstallReport {
        origin: origin.to_string(),
        classification,
        installed,
        issues: report.issues,
    })
}

/// Per-source result of a batch install.
#[derive(Debug)]
pub struct BatchOutcome {
    pub origin: String,
    pub result: Result<InstallReport>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn installed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| r.installed.len())
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &CabinetError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.origin.as_str(), e)))
    }
}

/// Sources named by a batch path: the lines of a URL list, or the
/// sub-directories (or archives, with `archives`) of a directory.
pub fn batch_sources(path: &Path, archives: bool) -> Result<Vec<String>> {
    if path.is_file() {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        if !matches!(ext.as_deref(), Some("txt") | Some("list")) {
            return Err(CabinetError::validation(
                path,
                "batch source lists must be .txt or .list files",
            ));
        }
        let contents = std::fs::read_to_string(path)?;
        return Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect());
    }

    if !path.is_dir() {
        return Err(CabinetError::NotFound(format!(
            "batch source '{}' does not exist",
            path.display()
        )));
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'))
        })
        .collect();
    entries.sort();

    let mut sources = Vec::new();
    for entry in entries {
        let wanted = if archives {
            entry.is_file() && archive::detect_format(&entry)?.is_some()
        } else {
            entry.is_dir()
        };
        if wanted {
            sources.push(entry.to_string_lossy().to_string());
        }
    }
    Ok(sources)
}

/// Run `cabinet batch-install`. A failing source is recorded and the batch
/// moves on to the next one.
pub fn run_batch(
    store: &mut Store,
    path: &Path,
    archives: bool,
    fetch: &FetchConfig,
    options: InstallOptions,
) -> Result<BatchReport> {
    let sources = batch_sources(path, archives)?;
    let mut report = BatchReport::default();
    for origin in sources {
        let result = run(store, &origin, fetch, options);
        if let Err(e) = &result {
            warn!(%origin, error = %e, "batch entry failed");
        }
        report.outcomes.push(BatchOutcome { origin, result });
    }
    Ok(report)
}
