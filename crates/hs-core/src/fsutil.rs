//! Filesystem helpers shared by the store and the config writers
//!
//! [`atomic_write`] is the only way Homestead replaces a file: the content is
//! written to a temporary sibling, flushed to disk and renamed over the
//! target, so readers observe either the old or the new file, never a torn
//! one.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Atomically replace `path` with `contents`, applying `mode` on Unix
///
/// Creates parent directories if they don't exist.
pub fn atomic_write(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    set_mode(tmp.path(), mode)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    sync_dir(parent);
    tracing::trace!("Atomically wrote {} bytes to {:?}", contents.len(), path);
    Ok(())
}

/// Create a directory (and parents) and apply `mode` to the leaf on Unix
pub fn ensure_dir(path: &Path, mode: u32) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path)?;
    set_mode(path, mode)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

// Best effort: persisting the rename needs the directory entry flushed too.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = fs::File::open(dir) {
        if let Err(e) = handle.sync_all() {
            tracing::debug!("Failed to fsync directory {:?}: {}", dir, e);
        }
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
