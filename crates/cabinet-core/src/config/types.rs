use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::*;
use super::util::expand_tilde;
use crate::runtime::RuntimeSpec;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CabinetConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Extra or overriding interpreter entries, keyed by language tag.
    #[serde(default)]
    pub runtimes: BTreeMap<String, RuntimeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store root holding `live/`, `backups/` and `index.json`.
    /// Default: `~/.cabinet`.
    #[serde(default = "default_store_root")]
    pub root: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

impl StoreConfig {
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(expand_tilde(&self.root))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    /// Write a backup archive as part of every install.
    #[serde(default = "default_backup_on_install")]
    pub on_install: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            on_install: default_backup_on_install(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Overall deadline for a single download attempt.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Largest response body accepted, in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            max_bytes: default_max_bytes(),
            retry: RetryConfig::default(),
        }
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Retry settings for transient retrieval failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries).
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}
