//! Everything a step may use

use hs_core::{CommandRunner, ConfigStore, Prompter, Settings};
use hs_wireguard::KeyGenerator;

/// Store, settings and capabilities handed to every step
///
/// Built once per process and passed by reference; steps hold no state of
/// their own between runs.
pub struct StepContext<'a> {
    pub store: &'a mut ConfigStore,
    pub prompter: &'a dyn Prompter,
    pub runner: &'a dyn CommandRunner,
    pub keys: &'a dyn KeyGenerator,
    pub settings: &'a Settings,
}

impl<'a> StepContext<'a> {
    pub fn new(
        store: &'a mut ConfigStore,
        prompter: &'a dyn Prompter,
        runner: &'a dyn CommandRunner,
        keys: &'a dyn KeyGenerator,
        settings: &'a Settings,
    ) -> Self {
        Self {
            store,
            prompter,
            runner,
            keys,
            settings,
        }
    }
}
