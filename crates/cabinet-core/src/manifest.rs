use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use walkdir::WalkDir;

use crate::checksum::checksum_hex;
use crate::error::{CabinetError, Result};
use crate::runtime::RuntimeTable;

/// Name of the manifest file every unit carries at its root.
pub const MANIFEST_FILE: &str = "game.json";

/// Parsed and validated contents of a unit manifest.
///
/// Older manifests spell some keys differently (`llm`, `lang`, `lang-version`,
/// `path`); those are accepted on read. Serialization always emits the
/// canonical key names. Unrecognized keys are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, alias = "llm", skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    #[serde(alias = "lang")]
    pub language: String,
    #[serde(
        rename = "language-version",
        alias = "lang-version",
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub language_version: Option<String>,
    #[serde(
        rename = "entry-subpath",
        alias = "path",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub entry_subpath: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Accepts `"1.2"` as well as bare numbers such as `1.2` or `3`.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl UnitDescriptor {
    /// Parse manifest bytes. `path` is only used for error context.
    pub fn parse(bytes: &[u8], path: &Path, runtimes: &RuntimeTable) -> Result<Self> {
        let raw: UnitDescriptor = serde_json::from_slice(bytes)
            .map_err(|e| CabinetError::validation(path, e.to_string()))?;
        raw.normalize(path, runtimes)
    }

    /// Read and parse the manifest file at `path`.
    pub fn load(path: &Path, runtimes: &RuntimeTable) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| CabinetError::validation(path, format!("cannot read manifest: {e}")))?;
        Self::parse(&bytes, path, runtimes)
    }

    /// Read the manifest at the root of a unit directory.
    pub fn load_from_dir(unit_dir: &Path, runtimes: &RuntimeTable) -> Result<Self> {
        Self::load(&unit_dir.join(MANIFEST_FILE), runtimes)
    }

    fn normalize(mut self, path: &Path, runtimes: &RuntimeTable) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(CabinetError::validation(path, "field 'name' is empty"));
        }

        self.language = self.language.trim().to_ascii_lowercase();
        if self.language.is_empty() {
            return Err(CabinetError::validation(path, "field 'language' is empty"));
        }
        if !runtimes.contains(&self.language) {
            return Err(CabinetError::validation(
                path,
                format!("unsupported language '{}'", self.language),
            ));
        }

        self.author = non_empty(self.author);
        self.generator = non_empty(self.generator);
        self.version = non_empty(self.version);
        self.language_version = non_empty(self.language_version);
        self.entry_subpath = match non_empty(self.entry_subpath) {
            Some(sub) => normalize_subpath(&sub)
                .map_err(|reason| CabinetError::validation(path, reason))?,
            None => None,
        };

        Ok(self)
    }

    /// Canonical JSON encoding written into the live store.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Hash of the canonical encoding; equal descriptors hash equal.
    pub fn fingerprint(&self) -> Result<String> {
        Ok(checksum_hex(&self.to_canonical_json()?))
    }

    /// Directory holding the entry file, relative to `unit_dir`.
    pub fn entry_dir(&self, unit_dir: &Path) -> PathBuf {
        match &self.entry_subpath {
            Some(sub) => unit_dir.join(sub),
            None => unit_dir.to_path_buf(),
        }
    }

    pub fn author_or_unknown(&self) -> &str {
        self.author.as_deref().unwrap_or("Unknown")
    }
}

/// Reject absolute or escaping sub-paths; `.` and empty collapse to `None`.
fn normalize_subpath(sub: &str) -> std::result::Result<Option<String>, String> {
    let mut parts = Vec::new();
    for component in Path::new(sub).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("entry-subpath '{sub}' must not contain '..'"))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("entry-subpath '{sub}' must be relative"))
            }
        }
    }
    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join("/")))
    }
}

/// Write the canonical manifest into `unit_dir`, replacing any existing one.
pub fn write_canonical(unit_dir: &Path, descriptor: &UnitDescriptor) -> Result<()> {
    let bytes = descriptor.to_canonical_json()?;
    std::fs::write(unit_dir.join(MANIFEST_FILE), bytes)?;
    Ok(())
}

/// Pick the language with the most files under `dir`.
///
/// Ties go to the lexically smaller language tag.
pub fn detect_language(dir: &Path, runtimes: &RuntimeTable) -> Option<String> {
    let mut ext_counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) {
            *ext_counts.entry(ext.to_ascii_lowercase()).or_default() += 1;
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (lang, spec) in runtimes.iter() {
        let ext = spec.extension.trim_start_matches('.').to_ascii_lowercase();
        let Some(&count) = ext_counts.get(&ext) else {
            continue;
        };
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((lang, count));
        }
    }
    best.map(|(lang, _)| lang.to_string())
}

/// Fields for a freshly scaffolded manifest.
#[derive(Debug, Clone, Default)]
pub struct ScaffoldOptions {
    pub name: Option<String>,
    pub author: Option<String>,
    pub generator: Option<String>,
    pub version: Option<String>,
    pub language: Option<String>,
    /// Entry file, relative to the unit directory.
    pub main: Option<PathBuf>,
}

/// Write a `game.json` into an existing directory of scripts.
///
/// Refuses to overwrite an existing manifest.
pub fn scaffold_manifest(
    dir: &Path,
    options: ScaffoldOptions,
    runtimes: &RuntimeTable,
) -> Result<UnitDescriptor> {
    if !dir.is_dir() {
        return Err(CabinetError::NotFound(format!(
            "directory '{}' does not exist",
            dir.display()
        )));
    }
    let manifest_path = dir.join(MANIFEST_FILE);
    if manifest_path.exists() {
        return Err(CabinetError::Conflict(format!(
            "'{}' already exists",
            manifest_path.display()
        )));
    }

    let language = match options.language {
        Some(lang) => lang.to_ascii_lowercase(),
        None => detect_language(dir, runtimes).ok_or_else(|| {
            CabinetError::validation(dir, "cannot detect language; pass it explicitly")
        })?,
    };
    let spec = runtimes
        .get(&language)
        .ok_or_else(|| CabinetError::validation(dir, format!("unsupported language '{language}'")))?;

    let main = match options.main {
        Some(main) => {
            if !dir.join(&main).is_file() {
                return Err(CabinetError::NotFound(format!(
                    "entry file '{}' not found in '{}'",
                    main.display(),
                    dir.display()
                )));
            }
            main
        }
        None => pick_main_file(dir, &spec.extension)?,
    };

    let entry_subpath = main
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .filter(|p| !p.is_empty());

    let name = options.name.or_else(|| {
        dir.canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
    });

    let draft = UnitDescriptor {
        name: name.unwrap_or_default(),
        author: options.author,
        generator: options.generator,
        version: options.version,
        language,
        language_version: None,
        entry_subpath,
        extra: BTreeMap::new(),
    };
    let descriptor = draft.normalize(&manifest_path, runtimes)?;
    write_canonical(dir, &descriptor)?;
    tracing::info!(path = %manifest_path.display(), "wrote manifest");
    Ok(descriptor)
}

fn pick_main_file(dir: &Path, extension: &str) -> Result<PathBuf> {
    let wanted = extension.trim_start_matches('.');
    let mut scripts: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| x.eq_ignore_ascii_case(wanted))
        })
        .filter_map(|e| e.path().strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();
    scripts.sort();

    match scripts.len() {
        0 => Err(CabinetError::validation(
            dir,
            format!("no {extension} files found"),
        )),
        1 => Ok(scripts.remove(0)),
        _ => {
            for stem in ["main", "index", "game", "start"] {
                if let Some(hit) = scripts
                    .iter()
                    .find(|p| p.file_stem().and_then(|s| s.to_str()) == Some(stem))
                {
                    return Ok(hit.clone());
                }
            }
            Err(CabinetError::validation(
                dir,
                format!(
                    "{} {extension} files found; choose the entry file explicitly",
                    scripts.len()
                ),
            ))
        }
    }
}
