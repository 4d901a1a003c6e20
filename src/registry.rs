//! Link-time registry of `#[test_class]` types.
//!
//! The attribute macro submits one [`TypeRegistration`] per annotated impl block; every registration linked into
//! the current binary is visible through [`registered_types`].

use minitest_core::TypeEntry;

/// One submitted test type. Holds a function pointer so building the entry is deferred until discovery.
pub struct TypeRegistration {
    entry: fn() -> TypeEntry,
}

impl TypeRegistration {
    pub const fn new(entry: fn() -> TypeEntry) -> Self {
        Self { entry }
    }

    pub fn entry(&self) -> TypeEntry {
        (self.entry)()
    }
}

inventory::collect!(TypeRegistration);

/// Build the entry of every registered type, sorted by type name so iteration order does not depend on the linker.
pub fn registered_types() -> Vec<TypeEntry> {
    let mut entries: Vec<TypeEntry> = inventory::iter::<TypeRegistration>
        .into_iter()
        .map(TypeRegistration::entry)
        .collect();
    entries.sort_by(|a, b| a.name.cmp(b.name));
    entries
}
