//! Bulk-action selection set.
//!
//! Independent of the cache: ids stay selected even if a refresh drops or
//! filters out the lead. Bulk actions clear the set when they finish.

#[cfg(test)]
#[path = "selection_test.rs"]
mod tests;

use std::collections::BTreeSet;

/// Lead ids selected for a bulk action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    /// Select the id if unselected, unselect it otherwise.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_owned());
        }
    }

    /// Clear the set if every visible id is already selected; otherwise
    /// select exactly the visible ids.
    pub fn toggle_all<I, S>(&mut self, visible: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let visible: BTreeSet<String> = visible.into_iter().map(Into::into).collect();
        if !visible.is_empty() && visible.iter().all(|id| self.ids.contains(id)) {
            self.ids.clear();
        } else {
            self.ids = visible;
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
