use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;

/// Write data to a temp file in the same directory, fsync it, then
/// atomically rename into place. Readers never see a partial file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Reject paths that are absolute or climb out of their base.
///
/// Returns the normalized relative path with `.` components dropped.
pub fn sanitize_relative_path(raw: &Path) -> std::result::Result<PathBuf, String> {
    let mut out = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("path '{}' contains '..'", raw.display()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("path '{}' is absolute", raw.display()));
            }
        }
    }
    Ok(out)
}

/// Whether a symlink located at `link` (relative to some root) with the given
/// `target` resolves to a location inside that root.
pub fn link_stays_inside(link: &Path, target: &Path) -> bool {
    let mut depth: usize = link
        .parent()
        .map(|p| {
            p.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0);
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// The first prefix of `rel` (itself included) that already exists under
/// `root` as a symlink.
pub fn symlink_on_path(root: &Path, rel: &Path) -> Option<PathBuf> {
    let mut prefix = PathBuf::new();
    for component in rel.components() {
        prefix.push(component);
        let is_link = fs::symlink_metadata(root.join(&prefix))
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        if is_link {
            return Some(prefix);
        }
    }
    None
}

/// Whether resolving `target` from the symlink at `link` walks through a
/// symlink already present under `root`. Textual containment alone cannot
/// see those.
pub fn link_target_crosses_symlink(root: &Path, link: &Path, target: &Path) -> bool {
    let mut cursor = link.parent().map(Path::to_path_buf).unwrap_or_default();
    for component in target.components() {
        match component {
            Component::Normal(part) => {
                cursor.push(part);
                let is_link = fs::symlink_metadata(root.join(&cursor))
                    .map(|m| m.file_type().is_symlink())
                    .unwrap_or(false);
                if is_link {
                    return true;
                }
            }
            Component::ParentDir => {
                cursor.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    false
}

pub fn apply_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_readonly((mode & 0o200) == 0);
        fs::set_permissions(path, perms)
    }
}

pub fn is_executable(metadata: &fs::Metadata) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        let _ = metadata;
        false
    }
}

pub fn create_symlink(link_target: &Path, link: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(link_target, link)
    }

    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_file(link_target, link)
            .or_else(|_| std::os::windows::fs::symlink_dir(link_target, link))
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = (link_target, link);
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "symlink creation is not supported on this platform",
        ))
    }
}

/// Recursively copy `src` into `dst` (created if missing), fsyncing every file.
///
/// Symlinks are recreated only when they point inside `src`; others are skipped.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) if rel.as_os_str().is_empty() => continue,
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        let target = dst.join(&rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)?;
            File::open(&target)?.sync_all()?;
        } else if file_type.is_symlink() {
            let link_target = fs::read_link(entry.path())?;
            if link_stays_inside(&rel, &link_target) {
                create_symlink(&link_target, &target)?;
            } else {
                warn!(
                    path = %entry.path().display(),
                    target = %link_target.display(),
                    "skipping symlink that leaves the unit directory"
                );
            }
        } else {
            debug!(path = %entry.path().display(), "skipping special file");
        }
    }
    Ok(())
}

/// Total size in bytes of the regular files under `dir`.
pub fn tree_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_escapes() {
        assert!(sanitize_relative_path(Path::new("../escape")).is_err());
        assert!(sanitize_relative_path(Path::new("a/../../b")).is_err());
        assert!(sanitize_relative_path(Path::new("/etc/passwd")).is_err());
        assert_eq!(
            sanitize_relative_path(Path::new("./a/b.txt")).unwrap(),
            PathBuf::from("a/b.txt")
        );
    }

    #[test]
    fn link_containment() {
        assert!(link_stays_inside(Path::new("a/link"), Path::new("../b")));
        assert!(link_stays_inside(Path::new("link"), Path::new("data/x")));
        assert!(!link_stays_inside(Path::new("link"), Path::new("../x")));
        assert!(!link_stays_inside(Path::new("a/link"), Path::new("../../x")));
        assert!(!link_stays_inside(Path::new("link"), Path::new("/etc/passwd")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_on_the_way_are_found() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("dir")).unwrap();
        create_symlink(Path::new("."), &root.path().join("loop")).unwrap();
        assert_eq!(
            symlink_on_path(root.path(), Path::new("loop/x.txt")),
            Some(PathBuf::from("loop"))
        );
        assert_eq!(symlink_on_path(root.path(), Path::new("dir/x.txt")), None);
        assert!(link_target_crosses_symlink(
            root.path(),
            Path::new("a"),
            Path::new("loop/..")
        ));
        assert!(!link_target_crosses_symlink(
            root.path(),
            Path::new("a"),
            Path::new("dir/x.txt")
        ));
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn copy_tree_copies_nested_files() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("assets/img")).unwrap();
        fs::write(src.path().join("main.py"), "print(1)").unwrap();
        fs::write(src.path().join("assets/img/a.txt"), "x").unwrap();
        let dst = tempfile::tempdir().unwrap();
        let out = dst.path().join("copy");
        copy_tree(src.path(), &out).unwrap();
        assert_eq!(fs::read_to_string(out.join("main.py")).unwrap(), "print(1)");
        assert_eq!(fs::read_to_string(out.join("assets/img/a.txt")).unwrap(), "x");
        assert_eq!(tree_size(&out), 9);
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_skips_escaping_symlinks() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("data.txt"), "d").unwrap();
        create_symlink(Path::new("data.txt"), &src.path().join("inner")).unwrap();
        create_symlink(Path::new("/etc/hostname"), &src.path().join("outer")).unwrap();
        let dst = tempfile::tempdir().unwrap();
        let out = dst.path().join("copy");
        copy_tree(src.path(), &out).unwrap();
        assert!(out.join("inner").symlink_metadata().is_ok());
        assert!(out.join("outer").symlink_metadata().is_err());
    }
}
