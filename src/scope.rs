//! Scoped flag sets
//!
//! Pure bookkeeping: for one option name, the mapping from caller-supplied
//! scope key to value slot. Callers hold the registry lock; nothing here
//! fails on its own.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cell::Slot;

/// Scope key -> slot for a single option name. Entries are never removed.
pub(crate) struct ScopeSet {
    slots: BTreeMap<String, Arc<dyn Slot>>,
}

impl ScopeSet {
    pub(crate) fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Insert a slot under a scope key, returning true if a previous slot
    /// was displaced (duplicate scope key — caller contract violation).
    pub(crate) fn insert(&mut self, scope: impl Into<String>, slot: Arc<dyn Slot>) -> bool {
        self.slots.insert(scope.into(), slot).is_some()
    }

    /// Write the resolved text into every slot
    pub(crate) fn fan_out(&self, text: &str) -> Result<(), String> {
        for slot in self.slots.values() {
            slot.write_text(text)?;
        }
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
