//! Deterministic capability doubles for tests
//!
//! [`ScriptedPrompter`] answers prompts from a queue and [`FakeRunner`]
//! returns canned command output while recording every invocation. Both are
//! used by the unit and integration tests of every Homestead crate.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{CommandError, HsError, Result};
use crate::traits::{CommandOutput, CommandRunner, CommandSpec, Prompter};

/// One queued prompt answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    Input(String),
    Password(String),
    Select(usize),
    MultiSelect(Vec<usize>),
}

/// Prompter replaying queued answers in order
///
/// When the queue is empty every prompt takes its default: `confirm` returns
/// the default flag, `input` the default text (or an empty string), `select`
/// the default index and `multi_select` the pre-ticked items. An answer of
/// the wrong kind for the prompt being asked is a [`HsError::Prompt`].
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prompter that always takes defaults
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Queue an answer
    pub fn answer(self, answer: Answer) -> Self {
        self.answers.borrow_mut().push_back(answer);
        self
    }

    /// Queue a yes/no answer
    pub fn then_confirm(self, yes: bool) -> Self {
        self.answer(Answer::Confirm(yes))
    }

    /// Queue a text answer
    pub fn then_input(self, text: impl Into<String>) -> Self {
        self.answer(Answer::Input(text.into()))
    }

    /// Queue a selection
    pub fn then_select(self, index: usize) -> Self {
        self.answer(Answer::Select(index))
    }

    /// Prompts asked so far
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, prompt: &str) -> Option<Answer> {
        self.asked.borrow_mut().push(prompt.to_string());
        self.answers.borrow_mut().pop_front()
    }
}

fn mismatch(prompt: &str, expected: &str, got: &Answer) -> HsError {
    HsError::Prompt(format!(
        "scripted answer {:?} does not fit {} prompt {:?}",
        got, expected, prompt
    ))
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        match self.next(prompt) {
            None => Ok(default),
            Some(Answer::Confirm(yes)) => Ok(yes),
            Some(other) => Err(mismatch(prompt, "confirm", &other)),
        }
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        match self.next(prompt) {
            None => Ok(default.unwrap_or_default().to_string()),
            Some(Answer::Input(text)) => Ok(text),
            Some(other) => Err(mismatch(prompt, "input", &other)),
        }
    }

    fn password(&self, prompt: &str) -> Result<String> {
        match self.next(prompt) {
            None => Ok(String::new()),
            Some(Answer::Password(text)) | Some(Answer::Input(text)) => Ok(text),
            Some(other) => Err(mismatch(prompt, "password", &other)),
        }
    }

    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        let index = match self.next(prompt) {
            None => default,
            Some(Answer::Select(index)) => index,
            Some(other) => return Err(mismatch(prompt, "select", &other)),
        };
        if index >= items.len() {
            return Err(HsError::Prompt(format!(
                "selection {} out of range for {:?}",
                index, prompt
            )));
        }
        Ok(index)
    }

    fn multi_select(&self, prompt: &str, items: &[String], defaults: &[bool]) -> Result<Vec<usize>> {
        match self.next(prompt) {
            None => Ok((0..items.len())
                .filter(|i| defaults.get(*i).copied().unwrap_or(false))
                .collect()),
            Some(Answer::MultiSelect(mut picked)) => {
                picked.retain(|i| *i < items.len());
                picked.sort_unstable();
                picked.dedup();
                Ok(picked)
            }
            Some(other) => Err(mismatch(prompt, "multi-select", &other)),
        }
    }
}

enum Reply {
    Output(CommandOutput),
    SpawnFailure,
}

/// Command runner returning canned output
///
/// Rules match on a prefix of `program args...`; the most recently added
/// matching rule wins. Unmatched invocations succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    rules: Vec<(Vec<String>, Reply)>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` to invocations starting with `prefix`
    pub fn on(mut self, prefix: &[&str], output: CommandOutput) -> Self {
        self.rules.push((
            prefix.iter().map(|s| s.to_string()).collect(),
            Reply::Output(output),
        ));
        self
    }

    /// Make invocations starting with `prefix` fail to start
    pub fn unavailable(mut self, prefix: &[&str]) -> Self {
        self.rules.push((
            prefix.iter().map(|s| s.to_string()).collect(),
            Reply::SpawnFailure,
        ));
        self
    }

    /// Make `name` absent for [`command_exists`](crate::traits::command_exists)
    pub fn missing_command(self, name: &str) -> Self {
        self.on(
            &["sh", "-c", "command -v \"$1\"", "sh", name],
            CommandOutput::failed(1, ""),
        )
    }

    /// Every invocation so far, in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Invocations rendered as `program args...`
    pub fn call_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandSpec::display).collect()
    }

    /// Whether any invocation started with `prefix`
    pub fn was_called(&self, prefix: &[&str]) -> bool {
        self.calls.borrow().iter().any(|c| matches_prefix(c, prefix))
    }
}

fn matches_prefix<S: AsRef<str>>(cmd: &CommandSpec, prefix: &[S]) -> bool {
    let mut words = std::iter::once(cmd.program.as_str()).chain(cmd.args.iter().map(String::as_str));
    prefix.iter().all(|p| words.next() == Some(p.as_ref()))
}

impl CommandRunner for FakeRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(cmd.clone());

        let reply = self
            .rules
            .iter()
            .rev()
            .find(|(prefix, _)| matches_prefix(cmd, prefix.as_slice()));

        match reply {
            None => Ok(CommandOutput::ok("")),
            Some((_, Reply::Output(output))) => Ok(output.clone()),
            Some((_, Reply::SpawnFailure)) => Err(CommandError {
                program: cmd.program.clone(),
                args: cmd.args.clone(),
                reason: "could not be started: not installed".into(),
                stdout: String::new(),
                stderr: String::new(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::command_exists;

    #[test]
    fn test_scripted_answers_then_defaults() {
        let prompter = ScriptedPrompter::new().then_confirm(false).then_input("ops");

        assert!(!prompter.confirm("Enable NFS?", true).unwrap());
        assert_eq!(prompter.input("User", Some("homelab")).unwrap(), "ops");
        assert_eq!(prompter.input("User", Some("homelab")).unwrap(), "homelab");
        assert!(prompter.confirm("Again?", true).unwrap());
        assert_eq!(prompter.asked().len(), 4);
    }

    #[test]
    fn test_mismatched_answer() {
        let prompter = ScriptedPrompter::new().then_select(1);
        assert!(matches!(
            prompter.confirm("Continue?", true),
            Err(HsError::Prompt(_))
        ));
    }

    #[test]
    fn test_multi_select_defaults() {
        let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let prompter = ScriptedPrompter::defaults();
        assert_eq!(
            prompter.multi_select("Images", &items, &[true, false, true]).unwrap(),
            vec![0, 2]
        );
    }

    #[test]
    fn test_fake_runner_rules() {
        let runner = FakeRunner::new()
            .on(&["id", "-u"], CommandOutput::ok("1000\n"))
            .on(&["id", "-u", "root"], CommandOutput::ok("0\n"))
            .unavailable(&["podman"])
            .missing_command("docker");

        assert_eq!(
            runner.run(&CommandSpec::new("id").args(["-u", "ops"])).unwrap().stdout_trimmed(),
            "1000"
        );
        assert_eq!(
            runner.run(&CommandSpec::new("id").args(["-u", "root"])).unwrap().stdout_trimmed(),
            "0"
        );
        assert!(runner.run(&CommandSpec::new("podman").arg("--version")).is_err());
        assert!(!command_exists(&runner, "docker"));
        assert!(command_exists(&runner, "mount"));

        assert!(runner.was_called(&["podman"]));
        assert_eq!(runner.calls().len(), 5);
    }
}
