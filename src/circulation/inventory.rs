use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The free unique-copy identifiers of one book title.
///
/// `take` always hands out the lowest id, so allocation order is
/// reproducible across runs. The set size must track the book's
/// `available_count` at all times.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CopySet {
    ids: BTreeSet<String>,
}

impl CopySet {
    pub fn new(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, copy_id: &str) -> bool {
        self.ids.contains(copy_id)
    }

    /// Removes and returns the lowest free copy id, or `None` when the
    /// set is exhausted.
    pub fn take(&mut self) -> Option<String> {
        let first = self.ids.iter().next().cloned()?;
        self.ids.remove(&first);
        Some(first)
    }

    /// Removes a specific copy id, for manual issue of a named copy.
    pub fn take_exact(&mut self, copy_id: &str) -> bool {
        self.ids.remove(copy_id)
    }

    /// Returns a copy id to the free set. Returns `false` if the id was
    /// already present, which means the inventory is corrupt: the caller
    /// must treat that as an internal error, not a business outcome.
    #[must_use]
    pub fn give(&mut self, copy_id: String) -> bool {
        self.ids.insert(copy_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.ids.iter()
    }
}
