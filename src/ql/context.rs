//! Iteration-variable bindings
//!
//! A `for $v in collection("c")` clause binds `v` to `c` for the rest of
//! the statement. The table is a plain value: each parse step takes it and
//! returns the extended table, so no state outlives one translation.

use crate::core::path::{PathError, PathExpression};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: Vec<(String, String)>,
}

impl Bindings {
    pub fn new() -> Self {
        Bindings {
            entries: Vec::new(),
        }
    }

    /// Bind `variable` (without `$`) to a collection; rebinding shadows
    pub fn bind<V: Into<String>, C: Into<String>>(mut self, variable: V, collection: C) -> Self {
        let variable = variable.into();
        self.entries.retain(|(name, _)| *name != variable);
        self.entries.push((variable, collection.into()));
        self
    }

    /// Collection bound to `variable`
    pub fn collection_of(&self, variable: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(name, _)| name == variable)
            .map(|(_, collection)| collection.as_str())
    }

    /// The most recently bound variable, used to resolve paths
    pub fn context_variable(&self) -> Option<&str> {
        self.entries.last().map(|(name, _)| name.as_str())
    }

    /// Resolve a path against its own variable, which must be bound
    pub fn resolve(&self, path: &PathExpression) -> Result<String, PathError> {
        match path.variable() {
            Some(variable) if self.collection_of(variable).is_some() => path.resolve(variable),
            _ => path.resolve(self.context_variable().unwrap_or_default()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
