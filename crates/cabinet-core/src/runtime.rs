use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Interpreter used to launch units written in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSpec {
    /// Program name or path, resolved through `PATH` when bare.
    pub command: String,
    /// Entry-file extension including the leading dot, e.g. `.py`.
    pub extension: String,
}

impl RuntimeSpec {
    fn new(command: &str, extension: &str) -> Self {
        Self {
            command: command.to_string(),
            extension: extension.to_string(),
        }
    }
}

const BUILTIN: &[(&str, &str, &str)] = &[
    ("php", "php", ".php"),
    ("python", "python3", ".py"),
    ("lua", "lua", ".lua"),
    ("js", "node", ".js"),
    ("ruby", "ruby", ".rb"),
    ("perl", "perl", ".pl"),
    ("bash", "bash", ".sh"),
    ("powershell", "pwsh", ".ps1"),
    ("r", "Rscript", ".R"),
    ("julia", "julia", ".jl"),
    ("tcl", "tclsh", ".tcl"),
    ("groovy", "groovy", ".groovy"),
    ("dart", "dart", ".dart"),
];

/// Conventional entry-file stems, tried in order before falling back to
/// the lexically first file with the runtime's extension.
const ENTRY_STEMS: &[&str] = &["main", "index", "game", "start"];

/// Maps language tags (lowercase) to interpreters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeTable {
    entries: BTreeMap<String, RuntimeSpec>,
}

impl Default for RuntimeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuntimeTable {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(lang, cmd, ext)| (lang.to_string(), RuntimeSpec::new(cmd, ext)))
            .collect();
        Self { entries }
    }

    /// Built-in table with config entries layered on top. Keys are lowercased.
    pub fn with_overrides(overrides: &BTreeMap<String, RuntimeSpec>) -> Self {
        let mut table = Self::builtin();
        for (lang, spec) in overrides {
            table.entries.insert(lang.to_ascii_lowercase(), spec.clone());
        }
        table
    }

    pub fn get(&self, language: &str) -> Option<&RuntimeSpec> {
        self.entries.get(&language.to_ascii_lowercase())
    }

    pub fn contains(&self, language: &str) -> bool {
        self.get(language).is_some()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuntimeSpec)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Language whose extension matches `ext` (case-insensitive, with or without dot).
    pub fn language_for_extension(&self, ext: &str) -> Option<&str> {
        let wanted = ext.trim_start_matches('.');
        self.entries
            .iter()
            .find(|(_, spec)| {
                spec.extension
                    .trim_start_matches('.')
                    .eq_ignore_ascii_case(wanted)
            })
            .map(|(lang, _)| lang.as_str())
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}

/// Locate the entry file inside `dir` for the given runtime.
///
/// Returns `None` if no regular file in `dir` carries the runtime's extension.
pub fn find_entry_file(dir: &Path, spec: &RuntimeSpec) -> Result<Option<PathBuf>> {
    for stem in ENTRY_STEMS {
        let candidate = dir.join(format!("{stem}{}", spec.extension));
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
    }

    let mut matches: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, &spec.extension))
        .collect();
    matches.sort();
    Ok(matches.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_known_languages() {
        let table = RuntimeTable::builtin();
        assert_eq!(table.get("python").unwrap().command, "python3");
        assert_eq!(table.get("JS").unwrap().extension, ".js");
        assert_eq!(table.languages().count(), 13);
        assert!(!table.contains("cobol"));
    }

    #[test]
    fn overrides_replace_and_extend() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Python".to_string(), RuntimeSpec::new("pypy3", ".py"));
        overrides.insert("fennel".to_string(), RuntimeSpec::new("fennel", ".fnl"));
        let table = RuntimeTable::with_overrides(&overrides);
        assert_eq!(table.get("python").unwrap().command, "pypy3");
        assert!(table.contains("fennel"));
        assert_eq!(table.language_for_extension("fnl"), Some("fennel"));
    }

    #[test]
    fn entry_file_prefers_conventional_stems() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("aaa.py"), "").unwrap();
        std::fs::write(dir.path().join("game.py"), "").unwrap();
        std::fs::write(dir.path().join("main.py"), "").unwrap();
        let spec = RuntimeSpec::new("python3", ".py");
        let entry = find_entry_file(dir.path(), &spec).unwrap().unwrap();
        assert_eq!(entry.file_name().unwrap(), "main.py");
    }

    #[test]
    fn entry_file_falls_back_to_lexical_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zeta.lua"), "").unwrap();
        std::fs::write(dir.path().join("alpha.lua"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        let spec = RuntimeSpec::new("lua", ".lua");
        let entry = find_entry_file(dir.path(), &spec).unwrap().unwrap();
        assert_eq!(entry.file_name().unwrap(), "alpha.lua");
    }

    #[test]
    fn entry_file_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), "").unwrap();
        let spec = RuntimeSpec::new("ruby", ".rb");
        assert!(find_entry_file(dir.path(), &spec).unwrap().is_none());
    }
}
