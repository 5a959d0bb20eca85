//! Manual resolutions: per-function label pins that bypass conflict scoring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Map of function offset -> resolved choice string.
///
/// Entries are never pruned by recomputation; a resolution for a function
/// that is currently filtered out re-applies when it reappears.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStore {
    entries: BTreeMap<u64, String>,
}

impl ResolutionStore {
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Pin `chosen_label` for `offset`, replacing any earlier pin.
    pub fn resolve(&mut self, offset: u64, chosen_label: impl Into<String>) {
        self.entries.insert(offset, chosen_label.into());
    }

    /// Remove the pin; returns the label that was pinned, if any.
    pub fn unresolve(&mut self, offset: u64) -> Option<String> {
        self.entries.remove(&offset)
    }

    pub fn is_resolved(&self, offset: u64) -> bool {
        self.entries.contains_key(&offset)
    }

    pub fn resolved_label(&self, offset: u64) -> Option<&str> {
        self.entries.get(&offset).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.entries.iter().map(|(offset, label)| (*offset, label.as_str()))
    }
}

impl FromIterator<(u64, String)> for ResolutionStore {
    fn from_iter<T: IntoIterator<Item = (u64, String)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
