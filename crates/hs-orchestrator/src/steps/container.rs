//! Container runtime

use hs_core::{CommandSpec, HsError, Result, ValidationError};

use crate::context::StepContext;
use crate::registry::StepOutcome;

/// Distribution package providing `runtime`
fn package_for(runtime: &str) -> &str {
    match runtime {
        "docker" => "docker.io",
        other => other,
    }
}

fn version(ctx: &StepContext<'_>, runtime: &str) -> Option<String> {
    match ctx.runner.run(&CommandSpec::new(runtime).arg("--version")) {
        Ok(output) if output.success() => Some(output.stdout_trimmed().to_string()),
        _ => None,
    }
}

pub fn run(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    let runtimes = &ctx.settings.container.runtimes;
    if runtimes.is_empty() {
        return Err(ValidationError::MissingField("container.runtimes".into()).into());
    }
    let stored = ctx.store.get_or_default("container.runtime", "");
    let default = runtimes.iter().position(|r| *r == stored).unwrap_or(0);
    let index = ctx.prompter.select("Container runtime", runtimes, default)?;
    let runtime = runtimes
        .get(index)
        .cloned()
        .ok_or_else(|| HsError::Prompt(format!("runtime selection {} out of range", index)))?;

    let version = match version(ctx, &runtime) {
        Some(v) => v,
        None => {
            let pm = &ctx.settings.container.package_manager;
            let package = package_for(&runtime);
            if !ctx
                .prompter
                .confirm(&format!("{} is not installed. Install {} with {}?", runtime, package, pm), true)?
            {
                return Err(HsError::Precondition(format!("{} is not installed", runtime)));
            }
            ctx.runner
                .run_checked(&CommandSpec::new(pm.as_str()).args(["install", "-y", package]))?;
            tracing::info!("Installed {}", package);

            ctx.runner
                .run_checked(&CommandSpec::new(runtime.as_str()).arg("--version"))?
                .stdout_trimmed()
                .to_string()
        }
    };
    tracing::info!("Using {}", version);

    ctx.store.set("container.runtime", &runtime)?;
    ctx.store.set("container.version", &version)?;
    Ok(StepOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::testing::{FakeRunner, ScriptedPrompter};
    use hs_core::{CommandOutput, ConfigStore, Prompter, Settings};
    use hs_wireguard::testing::DeterministicKeys;
    use tempfile::TempDir;

    #[test]
    fn test_detects_installed_runtime() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        let runner = FakeRunner::new().on(&["podman", "--version"], CommandOutput::ok("podman version 4.9.3\n"));
        let prompter = ScriptedPrompter::new().then_select(1);
        let (keys, settings) = (DeterministicKeys::new(), Settings::default());
        let mut ctx = StepContext::new(&mut store, &prompter, &runner, &keys, &settings);

        run(&mut ctx).unwrap();
        assert_eq!(store.get("container.runtime").unwrap(), "podman");
        assert_eq!(store.get("container.version").unwrap(), "podman version 4.9.3");
        assert!(!runner.was_called(&["apt-get"]));
    }

    #[test]
    fn test_installs_missing_runtime() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        let runner = FakeRunner::new().unavailable(&["docker"]);
        let (prompter, keys, settings) = (ScriptedPrompter::new(), DeterministicKeys::new(), Settings::default());
        let mut ctx = StepContext::new(&mut store, &prompter, &runner, &keys, &settings);

        // The fake keeps reporting docker as missing after the install
        assert!(run(&mut ctx).is_err());
        assert!(runner.was_called(&["apt-get", "install", "-y", "docker.io"]));
    }

    #[test]
    fn test_declined_install() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        let runner = FakeRunner::new().on(&["docker"], CommandOutput::failed(127, ""));
        let prompter = ScriptedPrompter::new().then_select(0).then_confirm(false);
        let (keys, settings) = (DeterministicKeys::new(), Settings::default());
        let mut ctx = StepContext::new(&mut store, &prompter, &runner, &keys, &settings);

        assert!(matches!(run(&mut ctx), Err(HsError::Precondition(_))));
        assert!(!runner.was_called(&["apt-get"]));
    }

    /// Answers every selection with an index past the end of the list
    struct OutOfRange;

    impl Prompter for OutOfRange {
        fn confirm(&self, _: &str, default: bool) -> Result<bool> {
            Ok(default)
        }
        fn input(&self, _: &str, default: Option<&str>) -> Result<String> {
            Ok(default.unwrap_or_default().to_string())
        }
        fn password(&self, _: &str) -> Result<String> {
            Ok(String::new())
        }
        fn select(&self, _: &str, items: &[String], _: usize) -> Result<usize> {
            Ok(items.len() + 3)
        }
        fn multi_select(&self, _: &str, _: &[String], _: &[bool]) -> Result<Vec<usize>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_out_of_range_selection_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        let runner = FakeRunner::new();
        let (keys, settings) = (DeterministicKeys::new(), Settings::default());
        let mut ctx = StepContext::new(&mut store, &OutOfRange, &runner, &keys, &settings);

        assert!(matches!(run(&mut ctx), Err(HsError::Prompt(_))));
        assert!(runner.calls().is_empty());
        assert!(!store.exists("container.runtime"));
    }
}
