//! Sources of test types.
//!
//! A [`TestModule`] is a unit of test code the orchestrator can load, run and release. Inside a module binary the
//! link-time registry is the source ([`InventoryModule`]); tests and embedders list types explicitly
//! ([`StaticModule`]).

use std::env;
use std::fmt;

use minitest_core::{TestType, TypeEntry};

use super::error::LoadFault;
use crate::registry;

pub trait TestModule {
    fn name(&self) -> &str;

    /// Produce the module's type registry. Called once per run.
    fn load(&self) -> Result<Vec<TypeEntry>, LoadFault>;

    /// Release anything the run left behind. Called exactly once after a successful `load`, on every exit path.
    fn unload(&self) {}
}

/// Every `#[test_class]` linked into the current binary.
#[derive(Debug, Clone)]
pub struct InventoryModule {
    name: String,
}

impl InventoryModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Named after the running executable.
    pub fn current() -> Self {
        let name = env::current_exe()
            .ok()
            .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "tests".to_string());
        Self::new(name)
    }
}

impl TestModule for InventoryModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Vec<TypeEntry>, LoadFault> {
        Ok(registry::registered_types())
    }
}

/// An explicit list of types, with an optional reset step run on unload.
pub struct StaticModule {
    name: String,
    entries: Vec<fn() -> TypeEntry>,
    reset: Option<Box<dyn Fn()>>,
}

impl StaticModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            reset: None,
        }
    }

    pub fn with_type<T: TestType>(self) -> Self {
        self.with_entry(T::type_entry)
    }

    /// Add a hand-built entry. Useful for types that do not carry the attribute macro.
    pub fn with_entry(mut self, entry: fn() -> TypeEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn on_unload(mut self, reset: impl Fn() + 'static) -> Self {
        self.reset = Some(Box::new(reset));
        self
    }
}

impl fmt::Debug for StaticModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticModule")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("reset", &self.reset.is_some())
            .finish()
    }
}

impl TestModule for StaticModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Vec<TypeEntry>, LoadFault> {
        Ok(self.entries.iter().map(|entry| entry()).collect())
    }

    fn unload(&self) {
        if let Some(reset) = &self.reset {
            reset();
        }
    }
}
