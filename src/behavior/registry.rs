//! # Compiled-in registry of named behaviors.
//!
//! Maps a configuration key to a behavior factory. The factory is invoked
//! once per target, so each dispatcher gets its own instance. Resolution
//! failures are fatal at startup and carry both the target and the
//! unresolvable name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::behavior::{AcceptAll, BehaviorRef, SessionLock, SleepInhibit};
use crate::config::TargetConfig;
use crate::error::StartupError;

type Factory = Box<dyn Fn() -> BehaviorRef + Send + Sync>;

/// Registry of behavior factories, keyed by the config's `behavior` field.
#[derive(Default)]
pub struct BehaviorRegistry {
    factories: HashMap<String, Factory>,
}

impl BehaviorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in behaviors registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("accept-all", || Arc::new(AcceptAll));
        registry.register("session-lock", || Arc::new(SessionLock::new()));
        registry.register("sleep-inhibit", || Arc::new(SleepInhibit::new()));
        registry
    }

    /// Registers a factory under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> BehaviorRef + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Creates a fresh behavior instance for the given target.
    pub fn resolve(&self, target: &TargetConfig) -> Result<BehaviorRef, StartupError> {
        match self.factories.get(&target.behavior) {
            Some(factory) => Ok(factory()),
            None => Err(StartupError::UnknownBehavior {
                target: target.name.clone(),
                name: target.behavior.clone(),
            }),
        }
    }

    /// Registered behavior names, sorted (for diagnostics).
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
