use super::{Page, PageRequest, PageSource, SourceError};
use crate::model::row::Row;

/// Source backed by an owned row vector.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    rows: Vec<Row>,
}

impl InMemorySource {
    /// Builds a source after validating every row.
    pub fn try_new(rows: Vec<Row>) -> Result<Self, SourceError> {
        for row in &rows {
            row.validate()?;
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl PageSource for InMemorySource {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        let start = request.offset.min(self.rows.len());
        let end = start.saturating_add(request.limit).min(self.rows.len());
        Ok(Page {
            rows: self.rows[start..end].to_vec(),
            has_more: end < self.rows.len(),
        })
    }

    fn total_rows(&self) -> Option<usize> {
        Some(self.rows.len())
    }
}
