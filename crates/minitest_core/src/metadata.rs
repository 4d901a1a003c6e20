//! Declarative tags and the registry entries they attach to.
//!
//! A test module exposes its types as [`TypeEntry`] values. Each entry lists the tags declared on the type, an
//! optional argument-less constructor, and every method with its own tags and invoker. These are pure data: the
//! discoverer decides what the tags mean.

use std::any::Any;
use std::fmt;

use crate::invoke::Invoker;
use crate::value::Value;

/// Builds a fresh instance of a test type.
pub type Constructor = fn() -> Box<dyn Any>;

/// Tags attachable to a type declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassTag {
    TestClass,
    Description(String),
}

/// Tags attachable to a method declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodTag {
    TestMethod,
    BeforeEach,
    AfterEach,
    DataRow(DataRow),
    Priority(i32),
    Description(String),
}

/// One positional argument tuple for a data-driven test method.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub values: Vec<Value>,
    pub display_name: Option<String>,
}

impl DataRow {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            display_name: None,
        }
    }

    pub fn named(display_name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            values,
            display_name: Some(display_name.into()),
        }
    }
}

/// A type as seen by discovery.
#[derive(Clone)]
pub struct TypeEntry {
    pub name: &'static str,
    pub tags: Vec<ClassTag>,
    /// Public argument-less constructor, if the type has one.
    pub constructor: Option<Constructor>,
    /// Methods in declaration order.
    pub methods: Vec<MethodEntry>,
}

impl TypeEntry {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tags: Vec::new(),
            constructor: None,
            methods: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: ClassTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    pub fn with_method(mut self, method: MethodEntry) -> Self {
        self.methods.push(method);
        self
    }

    pub fn is_test_class(&self) -> bool {
        self.tags.contains(&ClassTag::TestClass)
    }

    pub fn description(&self) -> Option<&str> {
        self.tags.iter().find_map(|tag| match tag {
            ClassTag::Description(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeEntry")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("constructor", &self.constructor.is_some())
            .field("methods", &self.methods)
            .finish()
    }
}

/// A method as seen by discovery.
#[derive(Clone)]
pub struct MethodEntry {
    pub name: &'static str,
    pub tags: Vec<MethodTag>,
    /// Number of declared parameters, excluding the receiver.
    pub arity: usize,
    pub is_async: bool,
    pub invoker: Invoker,
}

impl MethodEntry {
    pub fn new(name: &'static str, invoker: Invoker) -> Self {
        Self {
            name,
            tags: Vec::new(),
            arity: 0,
            is_async: false,
            invoker,
        }
    }

    pub fn with_tag(mut self, tag: MethodTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn has_tag(&self, tag: &MethodTag) -> bool {
        self.tags.contains(tag)
    }

    /// Priority from the first `priority` tag, 0 when absent.
    pub fn priority(&self) -> i32 {
        self.tags
            .iter()
            .find_map(|tag| match tag {
                MethodTag::Priority(p) => Some(*p),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn description(&self) -> Option<&str> {
        self.tags.iter().find_map(|tag| match tag {
            MethodTag::Description(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Data rows in declaration order.
    pub fn data_rows(&self) -> impl Iterator<Item = &DataRow> {
        self.tags.iter().filter_map(|tag| match tag {
            MethodTag::DataRow(row) => Some(row),
            _ => None,
        })
    }
}

impl fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("arity", &self.arity)
            .field("is_async", &self.is_async)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::Invocation;

    fn noop<'a>(_instance: &'a mut (dyn Any + 'static), _args: &[Value]) -> Invocation<'a> {
        Invocation::ready(())
    }

    #[test]
    fn test_first_priority_and_description_win() {
        let method = MethodEntry::new("m", noop)
            .with_tag(MethodTag::Priority(3))
            .with_tag(MethodTag::Description("first".into()))
            .with_tag(MethodTag::Priority(-1))
            .with_tag(MethodTag::Description("second".into()));
        assert_eq!(method.priority(), 3);
        assert_eq!(method.description(), Some("first"));
    }

    #[test]
    fn test_priority_defaults_to_zero() {
        assert_eq!(MethodEntry::new("m", noop).priority(), 0);
    }

    #[test]
    fn test_data_rows_keep_declaration_order() {
        let method = MethodEntry::new("m", noop)
            .with_tag(MethodTag::DataRow(DataRow::new(vec![Value::Int(1)])))
            .with_tag(MethodTag::TestMethod)
            .with_tag(MethodTag::DataRow(DataRow::named("two", vec![Value::Int(2)])));
        let rows: Vec<_> = method.data_rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values, vec![Value::Int(1)]);
        assert_eq!(rows[1].display_name.as_deref(), Some("two"));
    }

    #[test]
    fn test_type_entry_tags() {
        let entry = TypeEntry::new("Plain");
        assert!(!entry.is_test_class());
        let entry = entry
            .with_tag(ClassTag::TestClass)
            .with_tag(ClassTag::Description("Arithmetic".into()));
        assert!(entry.is_test_class());
        assert_eq!(entry.description(), Some("Arithmetic"));
    }
}
