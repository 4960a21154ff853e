//! Persistent key/value configuration store
//!
//! Values are kept in a flat `key=value` text file and cached in memory after
//! the first access. Every mutation rewrites the whole file through
//! [`atomic_write`](crate::fsutil::atomic_write), so a crash mid-write leaves
//! the previous version intact.
//!
//! Two processes writing concurrently is tolerated but not coordinated: the
//! last rename wins and the other writer's update may be lost. Completion
//! markers are the only state protected against that race (see
//! [`MarkerSet`]).

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{HsError, Result, ValidationError};
use crate::fsutil;
use crate::markers::MarkerSet;

/// Permissions for the state file
const STATE_FILE_MODE: u32 = 0o600;

const FILE_HEADER: &str = "# Homestead state. Managed file, edit with `homestead config set`.\n";

/// Key/value store plus the completion markers that go with it
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    markers: MarkerSet,
    cache: OnceCell<HashMap<String, String>>,
}

impl ConfigStore {
    /// Open a store; nothing touches the filesystem until first access
    pub fn open(path: impl Into<PathBuf>, marker_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            markers: MarkerSet::new(marker_dir),
            cache: OnceCell::new(),
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Marker directory
    pub fn marker_dir(&self) -> &Path {
        self.markers.dir()
    }

    fn entries(&self) -> Result<&HashMap<String, String>> {
        if let Some(entries) = self.cache.get() {
            return Ok(entries);
        }
        let loaded = read_entries(&self.path)?;
        Ok(self.cache.get_or_init(|| loaded))
    }

    fn entries_mut(&mut self) -> Result<&mut HashMap<String, String>> {
        self.entries()?;
        self.cache
            .get_mut()
            .ok_or_else(|| HsError::Serialization("store cache unavailable".into()))
    }

    /// Drop the cache so the next access re-reads the file
    pub fn reload(&mut self) {
        self.cache = OnceCell::new();
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Result<String> {
        self.entries()?
            .get(key)
            .cloned()
            .ok_or_else(|| HsError::NotFound(key.to_string()))
    }

    /// Get a value, falling back to `default` on any failure
    pub fn get_or_default(&self, key: &str, default: &str) -> String {
        match self.entries() {
            Ok(entries) => entries
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string()),
            Err(e) => {
                tracing::warn!("Failed to read {:?}, using default for {}: {}", self.path, key, e);
                default.to_string()
            }
        }
    }

    /// Whether `key` has a value
    pub fn exists(&self, key: &str) -> bool {
        self.entries()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    /// All keys, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    /// Set a value and persist the store
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        if value.contains('\0') {
            return Err(ValidationError::ConfigValue(key.to_string()).into());
        }

        self.entries_mut()?
            .insert(key.to_string(), value.to_string());
        self.commit()?;
        tracing::debug!("Set {}", key);
        Ok(())
    }

    /// Set several values with a single rewrite of the file
    ///
    /// Every pair is validated first; an invalid one leaves the store
    /// untouched.
    pub fn set_many<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<(K, V)> = pairs.into_iter().collect();
        for (key, value) in &pairs {
            validate_key(key.as_ref())?;
            if value.as_ref().contains('\0') {
                return Err(ValidationError::ConfigValue(key.as_ref().to_string()).into());
            }
        }

        let entries = self.entries_mut()?;
        for (key, value) in &pairs {
            entries.insert(key.as_ref().to_string(), value.as_ref().to_string());
        }
        self.commit()?;
        tracing::debug!("Set {} keys", pairs.len());
        Ok(())
    }

    /// Remove a key and persist the store; absent keys are not an error
    pub fn delete(&mut self, key: &str) -> Result<()> {
        if self.entries_mut()?.remove(key).is_some() {
            self.commit()?;
            tracing::debug!("Deleted {}", key);
        }
        Ok(())
    }

    /// Write the cache out; on failure the cache is dropped so it matches disk again
    fn commit(&mut self) -> Result<()> {
        let content = render_entries(self.entries()?);
        let written = fsutil::atomic_write(&self.path, content.as_bytes(), STATE_FILE_MODE)
            .map_err(|e| HsError::io(&self.path, e));
        if written.is_err() {
            self.reload();
        }
        written
    }

    /// Mark `name` complete; already-complete is fine
    pub fn mark_complete(&self, name: &str) -> Result<()> {
        self.markers.create(name)
    }

    /// Exclusively mark `name` complete, returning whether this call created it
    pub fn mark_complete_if_not_exists(&self, name: &str) -> Result<bool> {
        self.markers.create_if_absent(name)
    }

    /// Whether `name` is marked complete
    pub fn is_complete(&self, name: &str) -> bool {
        self.markers.exists(name)
    }

    /// Clear one marker
    pub fn clear_marker(&self, name: &str) -> Result<()> {
        self.markers.remove(name)
    }

    /// Clear every marker
    pub fn clear_all_markers(&self) -> Result<()> {
        self.markers.remove_all()
    }

    /// Names of all set markers, sorted
    pub fn list_markers(&self) -> Result<Vec<String>> {
        self.markers.list()
    }
}

fn validate_key(key: &str) -> Result<()> {
    let invalid = key.is_empty()
        || key.starts_with('#')
        || key.trim() != key
        || key.chars().any(|c| c == '=' || c.is_control());

    if invalid {
        return Err(ValidationError::ConfigKey(key.to_string()).into());
    }
    Ok(())
}

fn read_entries(path: &Path) -> Result<HashMap<String, String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(HsError::io(path, e)),
    };
    Ok(parse_entries(&content, path))
}

fn parse_entries(content: &str, path: &Path) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    for (line_num, line) in content.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                entries.insert(key.to_string(), unescape(value));
            }
            None => {
                tracing::warn!("Ignoring malformed line {} of {:?}", line_num + 1, path);
            }
        }
    }
    entries
}

fn render_entries(entries: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();

    let mut out = String::from(FILE_HEADER);
    for key in keys {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{}={}", key, escape(&entries[key]));
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
