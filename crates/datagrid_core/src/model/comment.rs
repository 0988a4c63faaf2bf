//! Comment and attachment domain model.
//!
//! # Invariants
//! - `text` is trimmed and non-empty.
//! - A comment belongs to exactly one row (`row_id`) for its whole lifetime.
//! - Attachment names are non-blank file references; content is not stored.

use crate::model::row::RowId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one comment.
pub type CommentId = Uuid;

const PREVIEW_MAX_CHARS: usize = 50;
const NO_COMMENTS_LABEL: &str = "No comments";

/// Optional file reference attached to a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
}

impl Attachment {
    /// Creates an attachment reference from a file name.
    pub fn new(file_name: impl Into<String>) -> Result<Self, CommentValidationError> {
        let file_name = file_name.into();
        let trimmed = file_name.trim();
        if trimmed.is_empty() {
            return Err(CommentValidationError::BlankAttachmentName);
        }
        Ok(Self {
            file_name: trimmed.to_string(),
        })
    }
}

/// Comment persisted against one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub row_id: RowId,
    pub text: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Comment {
    /// Creates a comment with a generated ID and the current timestamp.
    ///
    /// # Errors
    /// - `EmptyText` when `text` is blank after trim.
    pub fn new(
        row_id: RowId,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Result<Self, CommentValidationError> {
        let comment = Self {
            id: Uuid::new_v4(),
            row_id,
            text: text.into().trim().to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
            attachments,
        };
        comment.validate()?;
        Ok(comment)
    }

    /// Validates persisted or freshly built comment state.
    pub fn validate(&self) -> Result<(), CommentValidationError> {
        if self.text.trim().is_empty() {
            return Err(CommentValidationError::EmptyText);
        }
        if self
            .attachments
            .iter()
            .any(|attachment| attachment.file_name.trim().is_empty())
        {
            return Err(CommentValidationError::BlankAttachmentName);
        }
        Ok(())
    }
}

/// Returns the short preview shown in the comments column.
///
/// `"No comments"` when the list is empty, otherwise the latest text cut to
/// 50 characters with a trailing `...` when truncated.
pub fn latest_comment_preview(comments: &[Comment]) -> String {
    let Some(latest) = comments.last() else {
        return NO_COMMENTS_LABEL.to_string();
    };
    if latest.text.chars().count() > PREVIEW_MAX_CHARS {
        let mut preview = latest.text.chars().take(PREVIEW_MAX_CHARS).collect::<String>();
        preview.push_str("...");
        preview
    } else {
        latest.text.clone()
    }
}

/// Comment invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentValidationError {
    EmptyText,
    BlankAttachmentName,
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "comment text must not be empty"),
            Self::BlankAttachmentName => write!(f, "attachment file name must not be blank"),
        }
    }
}

impl Error for CommentValidationError {}
