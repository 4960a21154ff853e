//! One-time migration of legacy marker names
//!
//! Older releases used different marker names for some steps. Completion is
//! carried over to the canonical name with the exclusive-create primitive, so
//! when several processes migrate at once exactly one of them owns the
//! cleanup of the legacy marker, and none of them ever reports the step as
//! incomplete once migration has started.

use crate::error::Result;
use crate::store::ConfigStore;

/// Resolve whether a step is complete, migrating legacy markers on the way
///
/// Returns `Ok(true)` when the canonical marker exists or a legacy marker was
/// found (and the canonical one is now guaranteed to exist).
pub fn migrate_marker(store: &ConfigStore, canonical: &str, legacy: &[&str]) -> Result<bool> {
    if store.is_complete(canonical) {
        return Ok(true);
    }

    for old in legacy {
        if store.is_complete(old) {
            claim_migration(store, canonical, old)?;
            return Ok(true);
        }
    }

    Ok(false)
}

/// Create `canonical` for a present legacy marker `old`
///
/// Returns whether this call created the canonical marker. Only that caller
/// clears `old`; every other caller leaves it alone.
fn claim_migration(store: &ConfigStore, canonical: &str, old: &str) -> Result<bool> {
    let created = store.mark_complete_if_not_exists(canonical)?;
    if created {
        tracing::info!("Migrated marker {} -> {}", old, canonical);
        if let Err(e) = store.clear_marker(old) {
            tracing::warn!("Failed to clear legacy marker {}: {}", old, e);
        }
    } else {
        tracing::debug!("Marker {} already migrated by another process", canonical);
    }
    Ok(created)
}
