//! File-system helpers shared by the copy and merge resources.
use anyhow::{Context as _, Result};
use filetime::FileTime;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Copy a single file, carrying over its permissions and modification time.
///
/// # Errors
///
/// Returns an error if the file cannot be copied or its metadata cannot be
/// read or applied.
pub fn copy_file_preserving(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)
        .with_context(|| format!("copying {} to {}", src.display(), dst.display()))?;
    let meta = fs::metadata(src).with_context(|| format!("reading metadata: {}", src.display()))?;
    // Set by path: `dst` already carries the source mode and may be read-only.
    filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )
    .with_context(|| format!("setting timestamps: {}", dst.display()))?;
    Ok(())
}

/// Recursively copy a directory tree onto `dst`, creating intermediate
/// directories and overwriting files that already exist.
///
/// Symlinks within the source tree are *followed*: the function uses
/// [`Path::is_dir`] (which follows symlinks) so directory symlinks are
/// recursed into and their contents materialised rather than copying the
/// link itself.
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", src.display()))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            copy_file_preserving(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Remove `path`, recursing into directories.
///
/// Symlinks are removed as links, never followed.
///
/// # Errors
///
/// Returns the underlying I/O error if the path cannot be removed.
pub fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Lexically normalise `path`: drop `.` components and fold `..` into the
/// preceding component. No filesystem access, so the path need not exist.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Whether `path` lies strictly below `root` (and is not `root` itself),
/// after lexical normalisation of both.
#[must_use]
pub fn is_strictly_inside(path: &Path, root: &Path) -> bool {
    let path = normalize_path(path);
    let root = normalize_path(root);
    path != root && path.starts_with(&root)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn copies_files_and_subdirectories() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        fs::write(src.path().join("a.txt"), b"aaa").unwrap();
        fs::create_dir(src.path().join("sub")).unwrap();
        fs::write(src.path().join("sub/b.txt"), b"bbb").unwrap();

        let target = dst.path().join("out");
        copy_dir_recursive(src.path(), &target).unwrap();

        assert_eq!(fs::read(target.join("a.txt")).unwrap(), b"aaa");
        assert_eq!(fs::read(target.join("sub/b.txt")).unwrap(), b"bbb");
    }

    #[test]
    fn copy_dir_overwrites_existing_files_and_keeps_extra_ones() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.txt"), b"new").unwrap();
        fs::write(dst.path().join("a.txt"), b"old").unwrap();
        fs::write(dst.path().join("keep.txt"), b"keep").unwrap();

        copy_dir_recursive(src.path(), dst.path()).unwrap();

        assert_eq!(fs::read(dst.path().join("a.txt")).unwrap(), b"new");
        assert!(dst.path().join("keep.txt").exists());
    }

    #[test]
    fn copy_file_preserving_keeps_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let dst = dir.path().join("dst.txt");
        fs::write(&src, "content").unwrap();
        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        fs::OpenOptions::new()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(past)
            .unwrap();

        copy_file_preserving(&src, &dst).unwrap();

        assert_eq!(fs::metadata(&dst).unwrap().modified().unwrap(), past);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "content");
    }

    #[cfg(unix)]
    #[test]
    fn copy_file_preserving_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("run.sh");
        let dst = dir.path().join("copy.sh");
        fs::write(&src, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o755)).unwrap();

        copy_file_preserving(&src, &dst).unwrap();

        let mode = fs::metadata(&dst).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn copy_file_preserving_handles_read_only_source() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("ro.md");
        let dst = dir.path().join("copy.md");
        fs::write(&src, "read only").unwrap();
        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(2_000_000);
        fs::OpenOptions::new()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(past)
            .unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o444)).unwrap();

        copy_file_preserving(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "read only");
        assert_eq!(fs::metadata(&dst).unwrap().modified().unwrap(), past);
        assert_eq!(fs::metadata(&dst).unwrap().permissions().mode() & 0o777, 0o444);
    }

    #[test]
    fn ensure_parent_dir_creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("file.txt");
        ensure_parent_dir(&nested).unwrap();
        assert!(dir.path().join("a").join("b").exists());
    }

    #[test]
    fn remove_path_handles_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        let sub = dir.path().join("d");
        fs::write(&file, "x").unwrap();
        fs::create_dir_all(sub.join("inner")).unwrap();
        fs::write(sub.join("inner/g"), "y").unwrap();

        remove_path(&file).unwrap();
        remove_path(&sub).unwrap();

        assert!(!file.exists());
        assert!(!sub.exists());
    }

    #[test]
    fn remove_path_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_path(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn normalize_path_folds_dots() {
        assert_eq!(
            normalize_path(Path::new("/install/./a/../b")),
            PathBuf::from("/install/b")
        );
        assert_eq!(normalize_path(Path::new("/install/")), PathBuf::from("/install"));
    }

    #[test]
    fn is_strictly_inside_excludes_root_and_outside_paths() {
        let root = Path::new("/install");
        assert!(is_strictly_inside(Path::new("/install/tools"), root));
        assert!(!is_strictly_inside(Path::new("/install"), root));
        assert!(!is_strictly_inside(Path::new("/install/../etc"), root));
        assert!(!is_strictly_inside(Path::new("/installer/x"), root));
    }
}
