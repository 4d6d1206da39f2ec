//! Filesystem helpers shared by provisioning and operations.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Apply `mode` to `path` (no-op off unix).
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

/// Permission bits of `path`, if it exists.
pub fn mode_of(path: &Path) -> Option<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).ok().map(|m| m.permissions().mode() & 0o777)
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

/// Write `contents` to `path` with `mode`, replacing atomically via a sibling
/// temp file. The temp file is created with `mode`, so the contents are never
/// readable under the default umask.
pub fn write_with_mode(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    // A leftover temp file keeps its old permissions when reopened.
    remove_path(&tmp)?;

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    let mut file = options.open(&tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);
    set_mode(&tmp, mode)?;
    fs::rename(&tmp, path)
}

/// True when `path` is missing or its bytes differ from `contents`.
pub fn differs(path: &Path, contents: &[u8]) -> bool {
    match fs::read(path) {
        Ok(existing) => existing != contents,
        Err(_) => true,
    }
}

/// Remove a file or directory tree; a missing path is not an error.
pub fn remove_path(path: &Path) -> io::Result<bool> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_with_mode_creates_parents_and_sets_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b.json");
        write_with_mode(&path, b"{}", 0o600).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");
        #[cfg(unix)]
        assert_eq!(mode_of(&path), Some(0o600));
        assert!(!differs(&path, b"{}"));
        assert!(differs(&path, b"[]"));
    }

    #[cfg(unix)]
    #[test]
    fn contents_never_land_in_a_stale_world_readable_temp_file() {
        use std::io::Read;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        let stale = dir.path().join("token.json.tmp");
        fs::write(&stale, b"").unwrap();
        set_mode(&stale, 0o644).unwrap();
        let mut reader = fs::File::open(&stale).unwrap();

        write_with_mode(&path, b"secret", 0o600).unwrap();

        let mut seen = String::new();
        reader.read_to_string(&mut seen).unwrap();
        assert_eq!(seen, "");
        assert_eq!(mode_of(&path), Some(0o600));
        assert!(!stale.exists());
    }

    #[test]
    fn remove_missing_path_is_ok() {
        let dir = TempDir::new().unwrap();
        assert!(!remove_path(&dir.path().join("nope")).unwrap());
        let sub = dir.path().join("tree");
        fs::create_dir_all(sub.join("x")).unwrap();
        assert!(remove_path(&sub).unwrap());
        assert!(!sub.exists());
    }
}
