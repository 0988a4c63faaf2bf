//! Row action menu state.
//!
//! # Invariants
//! - At most one row menu is open at any time.
//! - Opening a row menu closes any other open menu.
//! - Invoking an action always leaves every menu closed.

use crate::model::row::{Row, RowId};

/// Fixed, ordered menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    ActionA,
    ActionB,
    ActionC,
}

impl RowAction {
    /// Menu entries in display order.
    pub const ALL: [RowAction; 3] = [RowAction::ActionA, RowAction::ActionB, RowAction::ActionC];

    pub fn label(self) -> &'static str {
        match self {
            Self::ActionA => "Action A",
            Self::ActionB => "Action B",
            Self::ActionC => "Action C",
        }
    }

    /// Confirmation text shown after the action runs for `row`.
    pub fn confirmation(self, row: &Row) -> String {
        match self {
            Self::ActionA => format!("Action A executed for {} ({})", row.name, row.department),
            Self::ActionB => format!("Action B executed for {} ({})", row.name, row.position),
            Self::ActionC => format!("Action C executed for {} (ID: {})", row.name, row.id),
        }
    }
}

/// Result of invoking one menu action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: RowAction,
    pub row_id: RowId,
    /// Confirmation prompt for the host. Hosts may ignore it.
    pub confirmation: Option<String>,
}

/// Tracks which row, if any, has its action menu open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionMenu {
    open_row: Option<RowId>,
}

impl ActionMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row whose menu is open.
    pub fn open_row(&self) -> Option<RowId> {
        self.open_row
    }

    pub fn is_open(&self, row_id: RowId) -> bool {
        self.open_row == Some(row_id)
    }

    /// Ellipsis click: opens `row_id`, or closes it when already open.
    ///
    /// Returns the previously open row when a different menu was displaced.
    pub fn toggle(&mut self, row_id: RowId) -> Option<RowId> {
        match self.open_row {
            Some(current) if current == row_id => {
                self.open_row = None;
                None
            }
            previous => {
                self.open_row = Some(row_id);
                previous
            }
        }
    }

    /// Closes any open menu and returns the row it belonged to.
    pub fn close(&mut self) -> Option<RowId> {
        self.open_row.take()
    }

    /// Runs `action` against `row` and closes the menu.
    pub fn invoke(&mut self, action: RowAction, row: &Row) -> ActionOutcome {
        self.close();
        ActionOutcome {
            action,
            row_id: row.id,
            confirmation: Some(action.confirmation(row)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionMenu, RowAction};
    use crate::source::SyntheticSource;

    #[test]
    fn opening_second_menu_closes_first() {
        let mut menu = ActionMenu::new();
        assert_eq!(menu.toggle(1), None);
        assert_eq!(menu.toggle(2), Some(1));
        assert!(!menu.is_open(1));
        assert!(menu.is_open(2));
    }

    #[test]
    fn toggling_open_row_closes_it() {
        let mut menu = ActionMenu::new();
        menu.toggle(4);
        menu.toggle(4);
        assert_eq!(menu.open_row(), None);
    }

    #[test]
    fn invoke_closes_menu_and_builds_confirmation() {
        let row = SyntheticSource::new(11).rows(0, 1).remove(0);
        let mut menu = ActionMenu::new();
        menu.toggle(row.id);

        let outcome = menu.invoke(RowAction::ActionC, &row);
        assert_eq!(menu.open_row(), None);
        assert_eq!(
            outcome.confirmation.as_deref(),
            Some(format!("Action C executed for {} (ID: 1)", row.name).as_str())
        );
    }

    #[test]
    fn labels_are_distinct_and_ordered() {
        let labels = RowAction::ALL.map(RowAction::label);
        assert_eq!(labels, ["Action A", "Action B", "Action C"]);
    }
}
