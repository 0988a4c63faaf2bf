//! Grid row domain model.
//!
//! # Responsibility
//! - Define the canonical employee record rendered by each grid row.
//! - Validate display invariants before a row enters the page window.
//!
//! # Invariants
//! - `id` is unique and stable; every other field is a display value.
//! - `salary` stays within `0..=SALARY_MAX`.
//! - `email` always contains `@`.

use crate::model::comment::Comment;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound accepted for salary values.
pub const SALARY_MAX: i64 = 200_000;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Stable identifier for one grid row.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type RowId = u32;

/// Employment status shown in the `Status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Active,
    Inactive,
    Pending,
    OnLeave,
}

impl RowStatus {
    /// All statuses in display order.
    pub const ALL: [RowStatus; 4] = [
        RowStatus::Active,
        RowStatus::Inactive,
        RowStatus::Pending,
        RowStatus::OnLeave,
    ];

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Pending => "Pending",
            Self::OnLeave => "On Leave",
        }
    }
}

/// Canonical record for one rendered grid row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: RowId,
    pub name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    /// Whole currency units. Rendered with a `$` prefix.
    pub salary: i64,
    pub start_date: NaiveDate,
    pub status: RowStatus,
    /// Comments in creation order; the last entry is the latest.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Row {
    /// Validates display invariants.
    ///
    /// # Errors
    /// - `BlankName` when `name` is empty after trim.
    /// - `InvalidEmail` when `email` is not `local@domain`.
    /// - `SalaryOutOfRange` when `salary` is negative or above `SALARY_MAX`.
    pub fn validate(&self) -> Result<(), RowValidationError> {
        if self.name.trim().is_empty() {
            return Err(RowValidationError::BlankName(self.id));
        }
        if !EMAIL_RE.is_match(self.email.as_str()) {
            return Err(RowValidationError::InvalidEmail {
                row_id: self.id,
                email: self.email.clone(),
            });
        }
        if !(0..=SALARY_MAX).contains(&self.salary) {
            return Err(RowValidationError::SalaryOutOfRange {
                row_id: self.id,
                salary: self.salary,
            });
        }
        Ok(())
    }

    /// Returns number of comments attached to this row.
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}

/// Row invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValidationError {
    BlankName(RowId),
    InvalidEmail { row_id: RowId, email: String },
    SalaryOutOfRange { row_id: RowId, salary: i64 },
}

impl Display for RowValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(row_id) => write!(f, "row {row_id}: name must not be blank"),
            Self::InvalidEmail { row_id, email } => {
                write!(f, "row {row_id}: invalid email `{email}`")
            }
            Self::SalaryOutOfRange { row_id, salary } => write!(
                f,
                "row {row_id}: salary {salary} outside 0..={SALARY_MAX}"
            ),
        }
    }
}

impl Error for RowValidationError {}
