//! Config command implementations
//!
//! All but `config init` operate on the key/value store, not on
//! `settings.toml`.

use std::path::Path;

use anyhow::{Context, Result};

use hs_core::config::save_settings;
use hs_core::{ConfigStore, HsError, Settings};

use crate::output::{print_error, print_info, print_success, print_warning};

/// Keys holding serialized interface records, which include private keys
fn is_secret_record(key: &str) -> bool {
    key.starts_with("wireguard.") && key.ends_with(".interface")
}

/// Print a value by key
pub fn config_get(store: &ConfigStore, key: &str) -> Result<()> {
    match store.get(key) {
        Ok(value) => {
            println!("{}", value);
            Ok(())
        }
        Err(HsError::NotFound(_)) => anyhow::bail!("Key not found: {}", key),
        Err(e) => Err(e.into()),
    }
}

/// Set a value
pub fn config_set(store: &mut ConfigStore, key: &str, value: &str) -> Result<()> {
    store
        .set(key, value)
        .with_context(|| format!("Failed to set {}", key))?;
    print_success(&format!("Set {} = {}", key, value));
    Ok(())
}

/// Remove a value
pub fn config_unset(store: &mut ConfigStore, key: &str) -> Result<()> {
    if !store.exists(key) {
        print_warning(&format!("{} is not set", key));
        return Ok(());
    }
    store
        .delete(key)
        .with_context(|| format!("Failed to remove {}", key))?;
    print_success(&format!("Removed {}", key));
    Ok(())
}

/// Print every stored value
pub fn config_show(store: &ConfigStore) -> Result<()> {
    let keys = store.keys()?;
    if keys.is_empty() {
        print_info(&format!("No values recorded in {}", store.path().display()));
        return Ok(());
    }

    for key in keys {
        if is_secret_record(&key) {
            println!("{}=<interface record; see `homestead wireguard list`>", key);
        } else {
            println!("{}={}", key, store.get(&key)?);
        }
    }
    Ok(())
}

/// Write a settings file holding every default
pub fn config_init(settings_path: &Path, force: bool) -> Result<()> {
    if settings_path.exists() && !force {
        print_error(&format!("Settings file already exists: {}", settings_path.display()));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    save_settings(settings_path, &Settings::default())
        .with_context(|| format!("Failed to write {}", settings_path.display()))?;
    print_success(&format!("Created settings file: {}", settings_path.display()));
    Ok(())
}

/// Print where state lives
pub fn config_path(store: &ConfigStore, settings_path: &Path) -> Result<()> {
    println!("settings: {}", settings_path.display());
    println!("state:    {}", store.path().display());
    println!("markers:  {}", store.marker_dir().display());
    Ok(())
}
