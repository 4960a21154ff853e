//! NFS storage
//!
//! Records where the share lives. Mount units are managed elsewhere.

use hs_core::{CommandSpec, Result, ValidationError};
use hs_wireguard::validate::validate_host;

use super::{input_with_stored, is_safe_abs_path};
use crate::context::StepContext;
use crate::registry::StepOutcome;

pub fn run(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    let enabled = ctx.store.get_or_default("nfs.enabled", "false") == "true";
    if !ctx.prompter.confirm("Use an NFS share for bulk storage?", enabled)? {
        ctx.store.set("nfs.enabled", "false")?;
        tracing::info!("NFS storage disabled");
        return Ok(StepOutcome::Completed);
    }

    let server = input_with_stored(ctx, "NFS server", "nfs.server", "")?;
    validate_host(&server)?;

    let export = input_with_stored(ctx, "Export path on the server", "nfs.export", "/export")?;
    if !is_safe_abs_path(&export) {
        return Err(ValidationError::MissingField(format!("absolute export path, got {:?}", export)).into());
    }

    let default_mount = match ctx.store.get("directory.base") {
        Ok(base) => format!("{}/data/nfs", base),
        Err(_) => "/mnt/nfs".to_string(),
    };
    let mount_point = input_with_stored(ctx, "Local mount point", "nfs.mount_point", &default_mount)?;
    if !is_safe_abs_path(&mount_point) {
        return Err(
            ValidationError::MissingField(format!("absolute mount point, got {:?}", mount_point)).into(),
        );
    }

    // Reachability is informative only; the share may not be up yet
    match ctx
        .runner
        .run(&CommandSpec::new("showmount").args(["-e", server.as_str()]))
    {
        Ok(output) if output.success() => {
            if !output.stdout.lines().any(|l| l.split_whitespace().next() == Some(export.as_str())) {
                tracing::warn!("{} does not list {} among its exports", server, export);
            }
        }
        Ok(output) => tracing::warn!("Could not query exports of {}: {}", server, output.stderr.trim()),
        Err(e) => tracing::warn!("Could not query exports of {}: {}", server, e),
    }

    ctx.store.set("nfs.enabled", "true")?;
    ctx.store.set("nfs.server", &server)?;
    ctx.store.set("nfs.export", &export)?;
    ctx.store.set("nfs.mount_point", &mount_point)?;
    Ok(StepOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::testing::{FakeRunner, ScriptedPrompter};
    use hs_core::{CommandOutput, ConfigStore, Settings};
    use hs_wireguard::testing::DeterministicKeys;
    use tempfile::TempDir;

    #[test]
    fn test_disabled_by_default() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        let runner = FakeRunner::new();
        let (prompter, keys, settings) = (ScriptedPrompter::new(), DeterministicKeys::new(), Settings::default());
        let mut ctx = StepContext::new(&mut store, &prompter, &runner, &keys, &settings);

        run(&mut ctx).unwrap();
        assert_eq!(store.get("nfs.enabled").unwrap(), "false");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_records_share_even_when_unreachable() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        store.set("directory.base", "/srv/homestead").unwrap();
        let runner = FakeRunner::new().unavailable(&["showmount"]);
        let prompter = ScriptedPrompter::new()
            .then_confirm(true)
            .then_input("nas.lan")
            .then_input("/volume1/media");
        let (keys, settings) = (DeterministicKeys::new(), Settings::default());
        let mut ctx = StepContext::new(&mut store, &prompter, &runner, &keys, &settings);

        run(&mut ctx).unwrap();
        assert_eq!(store.get("nfs.server").unwrap(), "nas.lan");
        assert_eq!(store.get("nfs.export").unwrap(), "/volume1/media");
        assert_eq!(store.get("nfs.mount_point").unwrap(), "/srv/homestead/data/nfs");
        assert!(runner.was_called(&["showmount", "-e", "nas.lan"]));
    }

    #[test]
    fn test_rejects_bad_server() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        let runner = FakeRunner::new().on(&["showmount"], CommandOutput::ok(""));
        let prompter = ScriptedPrompter::new().then_confirm(true).then_input("nas;reboot");
        let (keys, settings) = (DeterministicKeys::new(), Settings::default());
        let mut ctx = StepContext::new(&mut store, &prompter, &runner, &keys, &settings);

        assert!(run(&mut ctx).is_err());
        assert!(!store.exists("nfs.server"));
    }
}
