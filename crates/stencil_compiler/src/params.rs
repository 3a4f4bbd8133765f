//! Ordered parameter bindings.
//!
//! Every `:name` placeholder that reaches the SQL text gets exactly one
//! entry here, in first-occurrence order. Rebinding the same name with the
//! same value is a no-op (the original position wins); rebinding with a
//! different value is a conflict. CTE and subquery scopes merge into their
//! parent through the same rule.

use crate::error::{CompileError, Result};
use crate::value::ParamValue;
use indexmap::IndexMap;

/// Insertion-ordered named parameter set.
#[derive(Debug, Clone, Default)]
pub struct ParamMap {
    entries: IndexMap<String, ParamValue>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under a name.
    ///
    /// First binding fixes the position; an equal rebinding is absorbed, a
    /// conflicting one fails.
    pub fn bind(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match self.entries.get(name) {
            Some(existing) if *existing == value => Ok(()),
            Some(_) => Err(CompileError::ambiguous_parameter(name)),
            None => {
                self.entries.insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    /// Fold another scope into this one, entry by entry, in its order.
    pub fn merge(&mut self, other: ParamMap) -> Result<()> {
        for (name, value) in other.entries {
            self.bind(&name, value)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Consume into the underlying ordered map.
    pub fn into_inner(self) -> IndexMap<String, ParamValue> {
        self.entries
    }
}
