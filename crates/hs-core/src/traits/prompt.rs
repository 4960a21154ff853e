//! Prompt capability

use crate::error::Result;

/// Interactive questions asked of the operator
///
/// Implementations return already-validated primitive values; semantic
/// validation (CIDRs, ports, names) happens in the caller.
pub trait Prompter {
    /// Yes/no question
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Free text, optionally pre-filled
    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Hidden text entry
    fn password(&self, prompt: &str) -> Result<String>;

    /// Pick one item, returning its index
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize>;

    /// Pick any number of items, returning their indices in ascending order
    fn multi_select(&self, prompt: &str, items: &[String], defaults: &[bool]) -> Result<Vec<usize>>;
}
