use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CabinetError>;

#[derive(Debug, Error)]
pub enum CabinetError {
    #[error("retrieval failed for '{url}': {reason}")]
    Retrieval { url: String, reason: String },

    #[error("bad archive '{}': {reason}", .path.display())]
    Archive { path: PathBuf, reason: String },

    #[error("invalid manifest '{}': {reason}", .path.display())]
    Validation { path: PathBuf, reason: String },

    #[error(
        "ambiguous source '{origin}': {found} valid unit(s) found{}",
        ambiguous_source_hint(.found)
    )]
    AmbiguousSource { origin: String, found: usize },

    #[error("'{selector}' matches several units: {}", .matches.join(", "))]
    AmbiguousName {
        selector: String,
        matches: Vec<String>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("index error: {0}")]
    IndexFormat(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn ambiguous_source_hint(found: &usize) -> &'static str {
    if *found > 1 {
        " (pass --collection to install all of them)"
    } else {
        ""
    }
}

impl CabinetError {
    pub(crate) fn archive(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CabinetError::Archive {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CabinetError::Validation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn retrieval(url: impl Into<String>, reason: impl Into<String>) -> Self {
        CabinetError::Retrieval {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
