//! Terminal prompts backed by dialoguer

use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Password, Select};
use hs_core::{HsError, Prompter, Result};

fn prompt_error(e: dialoguer::Error) -> HsError {
    HsError::Prompt(e.to_string())
}

/// [`Prompter`] that asks on the controlling terminal
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn ensure_attended(&self, prompt: &str) -> Result<()> {
        if console::user_attended() {
            Ok(())
        } else {
            Err(HsError::Prompt(format!(
                "cannot ask {:?} without a terminal",
                prompt
            )))
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        self.ensure_attended(prompt)?;
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        self.ensure_attended(prompt)?;
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input.interact_text().map_err(prompt_error)
    }

    fn password(&self, prompt: &str) -> Result<String> {
        self.ensure_attended(prompt)?;
        Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact()
            .map_err(prompt_error)
    }

    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        self.ensure_attended(prompt)?;
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }

    fn multi_select(&self, prompt: &str, items: &[String], defaults: &[bool]) -> Result<Vec<usize>> {
        self.ensure_attended(prompt)?;
        MultiSelect::with_theme(&self.theme)
            .with_prompt(format!("{} (Space to toggle, Enter to confirm)", prompt))
            .items(items)
            .defaults(defaults)
            .interact()
            .map_err(prompt_error)
    }
}
