//! Inline salary editing.
//!
//! # Invariants
//! - At most one row is in salary edit mode.
//! - Saved values are whole numbers within `0..=salary_max`.
//! - A failed save keeps edit mode and the draft untouched.

use crate::model::row::RowId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backend endpoint that receives salary updates.
pub const SALARY_UPDATE_ENDPOINT: &str = "v1/api/updatesalary";

/// Request body sent to `SALARY_UPDATE_ENDPOINT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryUpdate {
    pub employee_id: RowId,
    pub new_salary: i64,
}

impl SalaryUpdate {
    /// Serializes the request body.
    pub fn to_request_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SalaryDraft {
    row_id: RowId,
    input: String,
}

/// Salary edit state plus the set of rows updated this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryEditor {
    salary_max: i64,
    editing: Option<SalaryDraft>,
    updated_ids: BTreeSet<RowId>,
}

impl SalaryEditor {
    pub fn new(salary_max: i64) -> Self {
        Self {
            salary_max,
            editing: None,
            updated_ids: BTreeSet::new(),
        }
    }

    /// Enters edit mode for `row_id`, seeding the input with `current`.
    pub fn start_edit(&mut self, row_id: RowId, current: i64) {
        self.editing = Some(SalaryDraft {
            row_id,
            input: current.to_string(),
        });
    }

    pub fn editing_row(&self) -> Option<RowId> {
        self.editing.as_ref().map(|draft| draft.row_id)
    }

    pub fn input(&self) -> Option<&str> {
        self.editing.as_ref().map(|draft| draft.input.as_str())
    }

    pub fn set_input(&mut self, input: impl Into<String>) -> Result<(), SalaryError> {
        let draft = self.editing.as_mut().ok_or(SalaryError::NotEditing)?;
        draft.input = input.into();
        Ok(())
    }

    pub fn cancel_edit(&mut self) -> Option<RowId> {
        self.editing.take().map(|draft| draft.row_id)
    }

    /// Validates the draft and leaves edit mode on success.
    pub fn save(&mut self) -> Result<SalaryUpdate, SalaryError> {
        let draft = self.editing.as_ref().ok_or(SalaryError::NotEditing)?;
        let new_salary = parse_salary_input(draft.input.as_str(), self.salary_max)?;
        let update = SalaryUpdate {
            employee_id: draft.row_id,
            new_salary,
        };
        self.editing = None;
        self.updated_ids.insert(update.employee_id);
        Ok(update)
    }

    /// Whether `row_id` had its salary saved during this session.
    pub fn has_updated_salary(&self, row_id: RowId) -> bool {
        self.updated_ids.contains(&row_id)
    }

    pub fn updated_ids(&self) -> Vec<RowId> {
        self.updated_ids.iter().copied().collect()
    }
}

/// Parses and range-checks one salary input.
pub fn parse_salary_input(raw: &str, salary_max: i64) -> Result<i64, SalaryError> {
    let trimmed = raw.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| SalaryError::NotANumber(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(SalaryError::NotANumber(trimmed.to_string()));
    }
    if value.fract() != 0.0 {
        return Err(SalaryError::FractionalValue);
    }
    if value > salary_max as f64 {
        return Err(SalaryError::AboveMaximum(salary_max));
    }
    if value < 0.0 {
        return Err(SalaryError::Negative);
    }
    Ok(value as i64)
}

/// Salary edit errors. Display text is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SalaryError {
    NotEditing,
    NotANumber(String),
    FractionalValue,
    AboveMaximum(i64),
    Negative,
}

impl Display for SalaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEditing => write!(f, "no salary is being edited"),
            Self::NotANumber(_) => write!(f, "Please enter a valid number"),
            Self::FractionalValue => {
                write!(f, "Error: Decimals are not allowed for salary values.")
            }
            Self::AboveMaximum(max) => write!(
                f,
                "Error: Salary cannot exceed {}.",
                crate::view::format_currency(*max)
            ),
            Self::Negative => write!(f, "Error: Salary cannot be negative."),
        }
    }
}

impl Error for SalaryError {}
