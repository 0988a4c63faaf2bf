//! Row selection store.
//!
//! # Invariants
//! - Membership mirrors exactly the checkboxes currently toggled on.
//! - `toggle` touches only the given id; toggling twice is an identity.
//! - Rendered output lists ids in ascending order.

use crate::model::row::RowId;
use std::collections::BTreeSet;

const SUMMARY_PREFIX: &str = "Selected Row IDs: ";

/// Set of checked row ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RowId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `row_id` and returns the updated set.
    pub fn toggle(&mut self, row_id: RowId) -> &Self {
        if !self.ids.remove(&row_id) {
            self.ids.insert(row_id);
        }
        self
    }

    /// Applies an explicit checkbox state.
    ///
    /// Returns whether membership changed.
    pub fn set_checked(&mut self, row_id: RowId, checked: bool) -> bool {
        if checked {
            self.ids.insert(row_id)
        } else {
            self.ids.remove(&row_id)
        }
    }

    pub fn contains(&self, row_id: RowId) -> bool {
        self.ids.contains(&row_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> Vec<RowId> {
        self.ids.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Renders the selection summary, or `None` when the display is hidden.
    pub fn render(&self) -> Option<String> {
        if self.ids.is_empty() {
            return None;
        }
        let joined = self
            .ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("{SUMMARY_PREFIX}{joined}"))
    }
}
