//! Row data source contracts.
//!
//! # Responsibility
//! - Define the paged fetch boundary consumed by the incremental loader.
//! - Provide in-memory and synthetic implementations for hosts and tests.
//!
//! # Invariants
//! - Pages are served in stable `id` order for a given source.
//! - `Page::has_more == false` is terminal for the loader.

use crate::model::row::{Row, RowValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod synthetic;

pub use memory::InMemorySource;
pub use synthetic::{SyntheticSource, SYNTHETIC_ROW_COUNT};

/// One fetch request issued by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page_index: usize,
    /// Number of rows to skip.
    pub offset: usize,
    /// Maximum rows to return.
    pub limit: usize,
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub rows: Vec<Row>,
    /// Whether rows exist past this page.
    pub has_more: bool,
}

/// Paged row provider.
pub trait PageSource {
    /// Fetches one page of rows.
    fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError>;

    /// Total row count when the source knows it.
    fn total_rows(&self) -> Option<usize> {
        None
    }
}

/// Fetch failures. All of them return the loader to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Backend could not serve the page.
    Unavailable(String),
    /// Fetch did not resolve in time.
    Timeout,
    /// Backend returned a row that breaks row invariants.
    InvalidRow(RowValidationError),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "row source unavailable: {message}"),
            Self::Timeout => write!(f, "row source timed out"),
            Self::InvalidRow(err) => write!(f, "row source returned invalid row: {err}"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRow(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RowValidationError> for SourceError {
    fn from(value: RowValidationError) -> Self {
        Self::InvalidRow(value)
    }
}
