//! Ordered grid state-transition events.
//!
//! # Responsibility
//! - Record every session transition as an explicit event so hosts react to
//!   changes instead of polling rendered state.
//!
//! # Invariants
//! - Sequence numbers start at 1 and strictly increase per session.
//! - Events are drained in emission order.

use crate::model::comment::CommentId;
use crate::model::row::RowId;
use crate::source::SourceError;
use crate::state::action_menu::RowAction;
use crate::state::salary_edit::SalaryUpdate;

/// One session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    SelectionChanged {
        row_id: RowId,
        selected: bool,
        summary: Option<String>,
    },
    LoadStarted {
        sequence: u64,
        page_index: usize,
    },
    PageAppended {
        sequence: u64,
        added: usize,
        total: usize,
    },
    LoadFailed {
        sequence: u64,
        error: SourceError,
    },
    LoadStale {
        sequence: u64,
    },
    Exhausted {
        total: usize,
    },
    /// Stored comments for these rows could not be loaded; retried on the
    /// next page load or comment submit.
    CommentsUnavailable {
        row_ids: Vec<RowId>,
        error: String,
    },
    MenuOpened {
        row_id: RowId,
    },
    MenuClosed {
        row_id: RowId,
    },
    ActionInvoked {
        row_id: RowId,
        action: RowAction,
        confirmation: Option<String>,
    },
    ModalOpened {
        row_id: RowId,
    },
    ModalClosed {
        row_id: RowId,
        submitted: bool,
    },
    CommentAdded {
        row_id: RowId,
        comment_id: CommentId,
    },
    CommentsViewerOpened {
        row_id: RowId,
    },
    CommentsViewerClosed {
        row_id: RowId,
    },
    SalaryEditStarted {
        row_id: RowId,
    },
    SalaryEditCancelled {
        row_id: RowId,
    },
    SalaryUpdated(SalaryUpdate),
}

/// Event paired with its session-wide sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedEvent {
    pub sequence: u64,
    pub event: GridEvent,
}

/// Append-only event queue drained by the host.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    next_sequence: u64,
    pending: Vec<SequencedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GridEvent) -> u64 {
        self.next_sequence += 1;
        self.pending.push(SequencedEvent {
            sequence: self.next_sequence,
            event,
        });
        self.next_sequence
    }

    /// Returns and clears pending events, oldest first.
    pub fn drain(&mut self) -> Vec<SequencedEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[SequencedEvent] {
        &self.pending
    }
}
