//! Scoped ownership of one loaded module.

use minitest_core::TypeEntry;
use tracing::debug;

use super::error::LoadFault;
use super::module::TestModule;

/// A loaded module. Dropping the context unloads the module, so release happens on every exit path of a run,
/// including unwinding.
pub struct RunContext<'m> {
    module: &'m dyn TestModule,
    types: Vec<TypeEntry>,
}

impl<'m> RunContext<'m> {
    pub fn acquire(module: &'m dyn TestModule) -> Result<Self, LoadFault> {
        let types = module.load()?;
        debug!(module = module.name(), types = types.len(), "module loaded");
        Ok(Self { module, types })
    }

    pub fn module_name(&self) -> &str {
        self.module.name()
    }

    pub fn types(&self) -> &[TypeEntry] {
        &self.types
    }
}

impl Drop for RunContext<'_> {
    fn drop(&mut self) {
        self.module.unload();
        debug!(module = self.module.name(), "module unloaded");
    }
}
