use std::fmt;
use std::path::{Path, PathBuf};

use super::types::CabinetConfig;
use crate::error::{CabinetError, Result};

/// Load and parse a config file.
pub fn load_config(path: &Path) -> Result<CabinetConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| CabinetError::Config(format!("cannot read '{}': {e}", path.display())))?;
    if contents.trim().is_empty() {
        return Ok(CabinetConfig::default());
    }
    serde_yaml::from_str(&contents)
        .map_err(|e| CabinetError::Config(format!("invalid config '{}': {e}", path.display())))
}

/// Tracks where the config file was found.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Explicitly passed via `--config`.
    CliArg(PathBuf),
    /// Set via the `CABINET_CONFIG` env var.
    EnvVar(PathBuf),
    /// Found by searching standard locations.
    SearchOrder { path: PathBuf, level: &'static str },
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::CliArg(p) => p,
            ConfigSource::EnvVar(p) => p,
            ConfigSource::SearchOrder { path, .. } => path,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::CliArg(p) => write!(f, "{} (--config)", p.display()),
            ConfigSource::EnvVar(p) => write!(f, "{} (CABINET_CONFIG)", p.display()),
            ConfigSource::SearchOrder { path, level } => {
                write!(f, "{} ({})", path.display(), level)
            }
        }
    }
}

/// Returns search locations in priority order: project, user, system.
pub fn default_config_search_paths() -> Vec<(PathBuf, &'static str)> {
    let mut paths = vec![(PathBuf::from("cabinet.yaml"), "project")];

    #[cfg(windows)]
    let user_config = dirs::config_dir().map(|base| base.join("cabinet").join("config.yaml"));

    #[cfg(not(windows))]
    let user_config = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|base| base.join("cabinet").join("config.yaml"));

    if let Some(p) = user_config {
        paths.push((p, "user"));
    }

    #[cfg(windows)]
    {
        let program_data = std::env::var_os("PROGRAMDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"));
        paths.push((program_data.join("cabinet").join("config.yaml"), "system"));
    }

    #[cfg(not(windows))]
    {
        paths.push((PathBuf::from("/etc/cabinet/config.yaml"), "system"));
    }

    paths
}

/// Resolve which config file to use.
///
/// Priority: CLI arg > `CABINET_CONFIG` env var > first existing file from search paths.
/// Returns `None` when nothing is found; callers fall back to built-in defaults.
pub fn resolve_config_path(cli_config: Option<&str>) -> Option<ConfigSource> {
    if let Some(path) = cli_config {
        return Some(ConfigSource::CliArg(PathBuf::from(path)));
    }

    if let Ok(val) = std::env::var("CABINET_CONFIG") {
        if !val.is_empty() {
            return Some(ConfigSource::EnvVar(PathBuf::from(val)));
        }
    }

    default_config_search_paths()
        .into_iter()
        .find(|(path, _)| path.exists())
        .map(|(path, level)| ConfigSource::SearchOrder { path, level })
}

/// Returns a starter YAML config.
pub fn minimal_config_template() -> &'static str {
    r#"# cabinet configuration file
# Every key is optional; the values below are the defaults.

store:
  root: ~/.cabinet

backup:
  on_install: true

fetch:
  connect_timeout_secs: 15
  timeout_secs: 300
  max_bytes: 268435456
  retry:
    max_retries: 3
    retry_delay_ms: 500
    retry_max_delay_ms: 10000

# Extra interpreters, merged over the built-in table:
# runtimes:
#   fennel:
#     command: fennel
#     extension: .fnl
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_paths_order() {
        let paths = default_config_search_paths();
        assert!(paths.len() >= 2);
        assert_eq!(paths[0].1, "project");
        assert_eq!(paths.last().unwrap().1, "system");
        if paths.len() == 3 {
            assert_eq!(paths[1].1, "user");
        }
    }

    #[test]
    fn test_resolve_cli_arg_wins() {
        let source = resolve_config_path(Some("/tmp/override.yaml")).unwrap();
        assert!(matches!(source, ConfigSource::CliArg(_)));
        assert_eq!(source.path(), Path::new("/tmp/override.yaml"));
    }

    #[test]
    fn template_parses_to_defaults() {
        let config: CabinetConfig = serde_yaml::from_str(minimal_config_template()).unwrap();
        let defaults = CabinetConfig::default();
        assert_eq!(config.store.root, defaults.store.root);
        assert_eq!(config.fetch.max_bytes, defaults.fetch.max_bytes);
        assert_eq!(
            config.fetch.retry.retry_max_delay_ms,
            defaults.fetch.retry.retry_max_delay_ms
        );
    }

    #[test]
    fn load_config_reads_runtime_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cabinet.yaml");
        std::fs::write(
            &path,
            "store:\n  root: /srv/cabinet\nruntimes:\n  fennel:\n    command: fennel\n    extension: .fnl\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.store.root_path(), PathBuf::from("/srv/cabinet"));
        assert_eq!(config.runtimes["fennel"].command, "fennel");
    }

    #[test]
    fn load_config_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cabinet.yaml");
        std::fs::write(&path, "store: [unclosed\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("cabinet.yaml"), "{err}");
    }
}
