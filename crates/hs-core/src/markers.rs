//! Completion markers
//!
//! A marker is an empty file named after the marker inside a dedicated
//! directory. Its presence means "this step has completed". Creation through
//! [`MarkerSet::create_if_absent`] uses `O_EXCL`, which makes "create if absent"
//! a single atomic filesystem operation that concurrent processes can race on
//! safely.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{HsError, Result, ValidationError};
use crate::fsutil;

/// Permissions for the marker directory
const MARKER_DIR_MODE: u32 = 0o755;

/// Check that a marker name cannot address anything outside the marker directory
pub fn validate_marker_name(name: &str) -> Result<()> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if unsafe_name {
        return Err(ValidationError::MarkerName(name.to_string()).into());
    }
    Ok(())
}

/// The set of markers stored in one directory
#[derive(Debug, Clone)]
pub struct MarkerSet {
    dir: PathBuf,
}

impl MarkerSet {
    /// Markers rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Marker directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_marker_name(name)?;
        Ok(self.dir.join(name))
    }

    fn ensure_dir(&self) -> Result<()> {
        fsutil::ensure_dir(&self.dir, MARKER_DIR_MODE).map_err(|e| HsError::io(&self.dir, e))
    }

    /// Create the marker, succeeding if it already exists
    pub fn create(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        self.ensure_dir()?;

        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| HsError::io(&path, e))?;

        tracing::debug!("Marked {} complete", name);
        Ok(())
    }

    /// Exclusively create the marker
    ///
    /// Returns `Ok(true)` when this call created it and `Ok(false)` when it
    /// was already present. Only real filesystem failures are errors.
    pub fn create_if_absent(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        self.ensure_dir()?;

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                tracing::debug!("Marked {} complete (exclusive)", name);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(HsError::io(&path, e)),
        }
    }

    /// Whether the marker exists; unsafe names are never present
    pub fn exists(&self, name: &str) -> bool {
        match self.path_for(name) {
            Ok(path) => path.is_file(),
            Err(_) => false,
        }
    }

    /// Remove the marker
    ///
    /// Returns `Ok(())` even if the marker doesn't exist.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Cleared marker {}", name);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HsError::io(&path, e)),
        }
    }

    /// Remove every marker in the directory
    pub fn remove_all(&self) -> Result<()> {
        for name in self.list()? {
            self.remove(&name)?;
        }
        Ok(())
    }

    /// Names of all present markers, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HsError::io(&self.dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HsError::io(&self.dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
