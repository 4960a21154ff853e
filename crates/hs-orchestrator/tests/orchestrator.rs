//! End-to-end runs of the step sequence against fakes

use hs_core::testing::{FakeRunner, ScriptedPrompter};
use hs_core::{CommandOutput, ConfigStore, HsError, Result, Settings};
use hs_orchestrator::{
    Orchestrator, StepContext, StepDescriptor, StepFn, StepOutcome, StepRegistry, StepState,
};
use hs_wireguard::testing::DeterministicKeys;
use tempfile::TempDir;

fn record(ctx: &mut StepContext<'_>, id: &str) -> Result<StepOutcome> {
    let mut order = ctx.store.get_or_default("test.order", "");
    if !order.is_empty() {
        order.push(',');
    }
    order.push_str(id);
    ctx.store.set("test.order", &order)?;
    Ok(StepOutcome::Completed)
}

fn preflight(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    record(ctx, "preflight")
}

fn user(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    record(ctx, "user")
}

fn directory(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    record(ctx, "directory")
}

fn nfs(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    record(ctx, "nfs")
}

fn container(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    record(ctx, "container")
}

fn wireguard(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    record(ctx, "wireguard")
}

fn deployment(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    record(ctx, "deployment")
}

/// Standard registry with every body replaced by a recorder
fn recording_registry() -> StepRegistry {
    let body = |id: &str| -> StepFn {
        match id {
            "preflight" => preflight,
            "user" => user,
            "directory" => directory,
            "nfs" => nfs,
            "container" => container,
            "wireguard" => wireguard,
            _ => deployment,
        }
    };

    let steps = StepRegistry::standard()
        .steps()
        .iter()
        .map(|s| StepDescriptor { run: body(s.id), ..*s })
        .collect();
    StepRegistry::new(steps)
}

fn open_store(dir: &TempDir) -> ConfigStore {
    ConfigStore::open(dir.path().join("state"), dir.path().join("markers"))
}

#[test]
fn test_quick_run_skips_optional_step() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    let (prompter, runner, keys, settings) = (
        ScriptedPrompter::new(),
        FakeRunner::new(),
        DeterministicKeys::new(),
        Settings::default(),
    );

    let mut orchestrator = Orchestrator::new(recording_registry(), &store).unwrap();
    let mut ctx = StepContext::new(&mut store, &prompter, &runner, &keys, &settings);
    let summary = orchestrator.run_all(&mut ctx, true).unwrap();

    assert_eq!(
        summary.ran,
        vec!["preflight", "user", "directory", "nfs", "container", "deployment"]
    );
    assert_eq!(summary.skipped, vec!["wireguard"]);
    assert_eq!(
        store.get("test.order").unwrap(),
        "preflight,user,directory,nfs,container,deployment"
    );
    for marker in [
        "preflight-complete",
        "user-complete",
        "directory-complete",
        "nfs-complete",
        "container-complete",
        "deployment-complete",
    ] {
        assert!(store.is_complete(marker), "{marker}");
    }
    assert!(!store.is_complete("wireguard-complete"));
    assert_eq!(orchestrator.state("wireguard"), StepState::Pending);
}

#[test]
fn test_resume_after_legacy_markers() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    store.mark_complete("preflight-done").unwrap();
    store.mark_complete("user-created").unwrap();
    let (prompter, runner, keys, settings) = (
        ScriptedPrompter::new(),
        FakeRunner::new(),
        DeterministicKeys::new(),
        Settings::default(),
    );

    let mut orchestrator = Orchestrator::new(recording_registry(), &store).unwrap();
    assert!(store.is_complete("preflight-complete"));
    assert!(!store.is_complete("preflight-done"));
    assert_eq!(orchestrator.state("user"), StepState::Completed);

    let mut ctx = StepContext::new(&mut store, &prompter, &runner, &keys, &settings);
    let summary = orchestrator.run_all(&mut ctx, true).unwrap();
    assert_eq!(summary.ran[0], "directory");
    assert_eq!(
        store.get("test.order").unwrap(),
        "directory,nfs,container,deployment"
    );
}

#[test]
fn test_standard_steps_with_defaults() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    store.set("user.name", "homelab").unwrap();

    let runner = FakeRunner::new()
        .on(&["uname"], CommandOutput::ok("Linux 6.8.0\n"))
        .on(&["id"], CommandOutput::ok("1000\n"))
        .on(&["docker", "--version"], CommandOutput::ok("Docker version 26.1.3\n"));
    let prompter = ScriptedPrompter::new();
    let keys = DeterministicKeys::new();
    let settings = Settings::default();

    let mut orchestrator = Orchestrator::new(StepRegistry::standard(), &store).unwrap();
    let mut ctx = StepContext::new(&mut store, &prompter, &runner, &keys, &settings);
    orchestrator.run_all(&mut ctx, true).unwrap();

    assert_eq!(store.get("preflight.root").unwrap(), "false");
    assert_eq!(store.get("user.uid").unwrap(), "1000");
    assert_eq!(store.get("directory.base").unwrap(), "/srv/homestead");
    assert_eq!(store.get("nfs.enabled").unwrap(), "false");
    assert_eq!(store.get("container.runtime").unwrap(), "docker");
    assert_eq!(
        store.get("deployment.images").unwrap(),
        settings.deployment.images.join(",")
    );
    assert!(runner.was_called(&["chown", "-R", "1000:1000", "/srv/homestead"]));
    assert!(!store.is_complete("wireguard-complete"));
}

#[test]
fn test_failure_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);

    let runner = FakeRunner::new()
        .on(&["uname"], CommandOutput::ok("Linux 6.8.0\n"))
        .on(&["id"], CommandOutput::ok("0\n"))
        .on(&["getent"], CommandOutput::failed(2, ""));
    let prompter = ScriptedPrompter::new().then_input("media").then_confirm(false);
    let keys = DeterministicKeys::new();
    let settings = Settings::default();

    let mut orchestrator = Orchestrator::new(StepRegistry::standard(), &store).unwrap();
    let mut ctx = StepContext::new(&mut store, &prompter, &runner, &keys, &settings);
    let err = orchestrator.run_all(&mut ctx, false).unwrap_err();

    assert!(matches!(err, HsError::StepFailure { ref step, .. } if step == "Service user"));
    assert_eq!(orchestrator.state("preflight"), StepState::Completed);
    assert_eq!(orchestrator.state("user"), StepState::Failed);
    assert_eq!(orchestrator.state("directory"), StepState::Pending);
    assert!(!store.is_complete("user-complete"));
}
