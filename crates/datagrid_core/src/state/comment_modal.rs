//! Comment/attachment modal and read-only comments viewer.
//!
//! # Invariants
//! - The modal targets exactly one row while open.
//! - Submit is enabled iff the trimmed draft text is non-empty.
//! - Cancel and submit both reset the draft and close the modal.

use crate::model::comment::{Attachment, Comment, CommentValidationError};
use crate::model::row::RowId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Unsaved comment input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

/// Modal lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommentModal {
    #[default]
    Closed,
    Open { row_id: RowId, draft: CommentDraft },
}

impl CommentModal {
    pub fn new() -> Self {
        Self::Closed
    }

    /// Opens the modal for `row_id` with an empty draft.
    ///
    /// Reopening for another row discards the previous draft.
    pub fn open(&mut self, row_id: RowId) {
        *self = Self::Open {
            row_id,
            draft: CommentDraft::default(),
        };
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Row targeted by the open modal.
    pub fn target(&self) -> Option<RowId> {
        match self {
            Self::Open { row_id, .. } => Some(*row_id),
            Self::Closed => None,
        }
    }

    pub fn draft(&self) -> Option<&CommentDraft> {
        match self {
            Self::Open { draft, .. } => Some(draft),
            Self::Closed => None,
        }
    }

    /// Replaces the draft text.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), ModalError> {
        self.draft_mut()?.text = text.into();
        Ok(())
    }

    /// Adds one attachment reference to the draft.
    pub fn attach(&mut self, attachment: Attachment) -> Result<(), ModalError> {
        self.draft_mut()?.attachments.push(attachment);
        Ok(())
    }

    pub fn clear_attachments(&mut self) -> Result<(), ModalError> {
        self.draft_mut()?.attachments.clear();
        Ok(())
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.draft()
            .is_some_and(|draft| !draft.text.trim().is_empty())
    }

    /// Builds the comment for the target row and closes the modal.
    ///
    /// # Errors
    /// - `NotOpen` when the modal is closed.
    /// - `EmptyText` when submit is disabled; the modal stays open unchanged.
    pub fn submit(&mut self) -> Result<Comment, ModalError> {
        let (row_id, draft) = match self {
            Self::Open { row_id, draft } => (*row_id, draft),
            Self::Closed => return Err(ModalError::NotOpen),
        };
        if draft.text.trim().is_empty() {
            return Err(ModalError::EmptyText);
        }

        let comment = Comment::new(row_id, draft.text.as_str(), draft.attachments.clone())?;
        *self = Self::Closed;
        Ok(comment)
    }

    /// Discards the draft and closes. Returns the row that was targeted.
    pub fn cancel(&mut self) -> Option<RowId> {
        let target = self.target();
        *self = Self::Closed;
        target
    }

    fn draft_mut(&mut self) -> Result<&mut CommentDraft, ModalError> {
        match self {
            Self::Open { draft, .. } => Ok(draft),
            Self::Closed => Err(ModalError::NotOpen),
        }
    }
}

/// Read-only viewer listing a row's comments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentsViewer {
    row_id: Option<RowId>,
}

impl CommentsViewer {
    pub fn open(&mut self, row_id: RowId) {
        self.row_id = Some(row_id);
    }

    pub fn close(&mut self) -> Option<RowId> {
        self.row_id.take()
    }

    pub fn target(&self) -> Option<RowId> {
        self.row_id
    }
}

/// Modal interaction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalError {
    NotOpen,
    EmptyText,
    Invalid(CommentValidationError),
}

impl Display for ModalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOpen => write!(f, "comment modal is not open"),
            Self::EmptyText => write!(f, "comment text is empty; submit is disabled"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ModalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CommentValidationError> for ModalError {
    fn from(value: CommentValidationError) -> Self {
        Self::Invalid(value)
    }
}
