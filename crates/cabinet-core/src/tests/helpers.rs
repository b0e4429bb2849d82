use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::commands::install::{self, InstallOptions, InstallReport};
use crate::config::FetchConfig;
use crate::runtime::RuntimeTable;
use crate::store::Store;

/// Write a unit directory with a manifest and a `main` entry file.
pub fn write_unit(
    dir: &Path,
    name: &str,
    author: Option<&str>,
    version: Option<&str>,
    language: &str,
) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let mut manifest = serde_json::json!({ "name": name, "language": language });
    if let Some(author) = author {
        manifest["author"] = author.into();
    }
    if let Some(version) = version {
        manifest["version"] = version.into();
    }
    fs::write(
        dir.join("game.json"),
        serde_json::to_vec_pretty(&manifest).unwrap(),
    )
    .unwrap();
    let ext = RuntimeTable::builtin().get(language).unwrap().extension.clone();
    fs::write(dir.join(format!("main{ext}")), format!("# {name}\n")).unwrap();
    dir.to_path_buf()
}

pub fn write_python_unit(dir: &Path, name: &str, author: Option<&str>) -> PathBuf {
    write_unit(dir, name, author, None, "python")
}

pub fn open_store(root: &Path) -> Store {
    Store::open_at(root, RuntimeTable::builtin()).unwrap()
}

pub fn no_backup() -> InstallOptions {
    InstallOptions {
        force_collection: false,
        backup: false,
    }
}

pub fn install_dir(store: &mut Store, dir: &Path) -> InstallReport {
    install::run(
        store,
        dir.to_str().unwrap(),
        &FetchConfig::default(),
        InstallOptions::default(),
    )
    .unwrap()
}

/// Build a `.tar.gz` from raw `(path, contents)` pairs, writing header
/// names verbatim so hostile paths survive.
pub fn raw_tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        {
            let name = &mut header.as_gnu_mut().unwrap().name;
            let bytes = path.as_bytes();
            name[..bytes.len()].copy_from_slice(bytes);
        }
        header.set_cksum();
        builder.append(&header, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Build a zip archive from `(path, contents)` pairs.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (path, data) in entries {
            zip.start_file(*path, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

pub fn manifest_json(name: &str, language: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "name": name, "language": language })).unwrap()
}
