use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{EntryType, Header};
use tracing::debug;
use walkdir::WalkDir;

use crate::checksum::checksum_hex;
use crate::error::{CabinetError, Result};
use crate::fsutil::{
    apply_mode, atomic_write, create_symlink, is_executable, link_stays_inside,
    link_target_crosses_symlink, sanitize_relative_path, symlink_on_path,
};

/// File-name suffix of backup and exported archives.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
    Zip,
}

/// Sniff the archive format from the leading bytes of `path`.
pub fn detect_format(path: &Path) -> Result<Option<ArchiveFormat>> {
    let mut file = File::open(path)?;
    let mut head = [0u8; 512];
    let mut filled = 0;
    while filled < head.len() {
        let n = file.read(&mut head[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    let head = &head[..filled];

    if head.starts_with(&[0x1f, 0x8b]) {
        return Ok(Some(ArchiveFormat::TarGz));
    }
    if head.starts_with(b"PK\x03\x04") || head.starts_with(b"PK\x05\x06") {
        return Ok(Some(ArchiveFormat::Zip));
    }
    if head.len() >= 262 && &head[257..262] == b"ustar" {
        return Ok(Some(ArchiveFormat::Tar));
    }
    Ok(None)
}

/// Unpack `archive` into `dest`, which must already exist.
///
/// Any entry that is absolute, climbs with `..`, or is a link pointing
/// outside `dest` aborts the extraction. An archive with no entries is an error.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let format = detect_format(archive)?
        .ok_or_else(|| CabinetError::archive(archive, "unrecognized archive format"))?;
    debug!(path = %archive.display(), ?format, "extracting archive");

    let count = match format {
        ArchiveFormat::TarGz => {
            let reader = GzDecoder::new(BufReader::new(File::open(archive)?));
            extract_tar(reader, archive, dest)?
        }
        ArchiveFormat::Tar => extract_tar(BufReader::new(File::open(archive)?), archive, dest)?,
        ArchiveFormat::Zip => extract_zip(File::open(archive)?, archive, dest)?,
    };

    if count == 0 {
        return Err(CabinetError::archive(archive, "archive is empty"));
    }
    Ok(())
}

fn extract_tar<R: Read>(reader: R, archive: &Path, dest: &Path) -> Result<usize> {
    let bad = |reason: String| CabinetError::archive(archive, reason);
    let mut tar = tar::Archive::new(reader);
    tar.set_preserve_permissions(true);
    tar.set_overwrite(true);

    let mut count = 0;
    for entry in tar.entries().map_err(|e| bad(e.to_string()))? {
        let mut entry = entry.map_err(|e| bad(e.to_string()))?;
        let raw = entry.path().map_err(|e| bad(e.to_string()))?.into_owned();
        let rel = sanitize_relative_path(&raw).map_err(bad)?;

        match entry.header().entry_type() {
            EntryType::Symlink => {
                let target = entry
                    .link_name()
                    .map_err(|e| bad(e.to_string()))?
                    .ok_or_else(|| bad(format!("symlink '{}' has no target", raw.display())))?
                    .into_owned();
                if !link_stays_inside(&rel, &target)
                    || link_target_crosses_symlink(dest, &rel, &target)
                {
                    return Err(bad(format!(
                        "symlink '{}' points outside the archive",
                        raw.display()
                    )));
                }
            }
            EntryType::Link => {
                let target = entry
                    .link_name()
                    .map_err(|e| bad(e.to_string()))?
                    .ok_or_else(|| bad(format!("hard link '{}' has no target", raw.display())))?
                    .into_owned();
                sanitize_relative_path(&target).map_err(bad)?;
            }
            EntryType::Regular | EntryType::Directory | EntryType::Continuous => {}
            EntryType::XGlobalHeader | EntryType::XHeader | EntryType::GNULongName => continue,
            other => {
                debug!(path = %raw.display(), ?other, "skipping special archive entry");
                continue;
            }
        }

        if rel.as_os_str().is_empty() {
            continue;
        }
        if let Some(link) = symlink_on_path(dest, &rel) {
            return Err(bad(format!(
                "entry '{}' passes through symlink '{}'",
                raw.display(),
                link.display()
            )));
        }
        let unpacked = entry.unpack_in(dest).map_err(|e| bad(e.to_string()))?;
        if !unpacked {
            return Err(bad(format!("entry '{}' escapes the destination", raw.display())));
        }
        count += 1;
    }
    Ok(count)
}

fn extract_zip<R: Read + Seek>(reader: R, archive: &Path, dest: &Path) -> Result<usize> {
    let bad = |reason: String| CabinetError::archive(archive, reason);
    let mut zip = zip::ZipArchive::new(reader).map_err(|e| bad(e.to_string()))?;

    // Validate every name before writing anything.
    let mut plan: Vec<PathBuf> = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let file = zip.by_index(i).map_err(|e| bad(e.to_string()))?;
        let rel = sanitize_relative_path(Path::new(file.name())).map_err(bad)?;
        plan.push(rel);
    }

    let mut count = 0;
    for (i, rel) in plan.into_iter().enumerate() {
        if rel.as_os_str().is_empty() {
            continue;
        }
        let mut file = zip.by_index(i).map_err(|e| bad(e.to_string()))?;
        // Earlier entries may have planted links; nothing is written through them.
        if let Some(link) = symlink_on_path(dest, &rel) {
            return Err(bad(format!(
                "entry '{}' passes through symlink '{}'",
                rel.display(),
                link.display()
            )));
        }
        let out = dest.join(&rel);
        let mode = file.unix_mode();
        let is_link = mode.is_some_and(|m| m & 0o170000 == 0o120000);

        if file.is_dir() {
            fs::create_dir_all(&out)?;
        } else if is_link {
            let mut target = String::new();
            file.read_to_string(&mut target)
                .map_err(|e| bad(e.to_string()))?;
            let target = PathBuf::from(target);
            if !link_stays_inside(&rel, &target)
                || link_target_crosses_symlink(dest, &rel, &target)
            {
                return Err(bad(format!(
                    "symlink '{}' points outside the archive",
                    rel.display()
                )));
            }
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            ensure_inside(dest, &out, &bad)?;
            create_symlink(&target, &out)?;
        } else {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            ensure_inside(dest, &out, &bad)?;
            let mut writer = File::create(&out)?;
            io::copy(&mut file, &mut writer).map_err(|e| bad(e.to_string()))?;
            if let Some(perm) = mode.map(|m| m & 0o777).filter(|p| *p != 0) {
                apply_mode(&out, perm)?;
            }
        }
        count += 1;
    }
    Ok(count)
}

/// The directory `out` will be created in must resolve under `dest`.
fn ensure_inside(
    dest: &Path,
    out: &Path,
    bad: &impl Fn(String) -> CabinetError,
) -> Result<()> {
    let root = fs::canonicalize(dest)?;
    let parent = out.parent().unwrap_or(dest);
    if !fs::canonicalize(parent)?.starts_with(&root) {
        return Err(bad(format!(
            "entry '{}' escapes the destination",
            out.display()
        )));
    }
    Ok(())
}

/// Produce a deterministic, gzip-compressed tar archive of a directory tree.
///
/// Entries are sorted, timestamps and ownership are zeroed and modes are
/// reduced to 0644/0755, so identical trees always yield identical bytes.
pub fn archive_dir_canonical(root: &Path) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        let rel = match path.strip_prefix(root) {
            Ok(rel) if rel.as_os_str().is_empty() => continue,
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let metadata = fs::symlink_metadata(path)?;
        let file_type = metadata.file_type();

        let mut header = Header::new_gnu();
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        if file_type.is_dir() {
            header.set_entry_type(EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
            builder.append_data(&mut header, rel, io::empty())?;
        } else if file_type.is_file() {
            header.set_entry_type(EntryType::Regular);
            header.set_mode(if is_executable(&metadata) { 0o755 } else { 0o644 });
            header.set_size(metadata.len());
            builder.append_data(&mut header, rel, File::open(path)?)?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(path)?;
            header.set_entry_type(EntryType::Symlink);
            header.set_mode(0o777);
            header.set_size(0);
            builder.append_link(&mut header, rel, &target)?;
        } else {
            debug!(path = %path.display(), "skipping special file during archive");
        }
    }

    let encoder = builder.into_inner()?;
    Ok(encoder.finish()?)
}

/// A canonical archive held in memory together with its checksum.
pub struct CanonicalArchive {
    pub bytes: Vec<u8>,
    pub checksum: String,
}

impl CanonicalArchive {
    pub fn build(root: &Path) -> Result<Self> {
        let bytes = archive_dir_canonical(root)?;
        let checksum = checksum_hex(&bytes);
        Ok(Self { bytes, checksum })
    }

    /// Atomically write the archive to `dest`.
    pub fn write_to(&self, dest: &Path) -> Result<()> {
        atomic_write(dest, &self.bytes)
    }
}
