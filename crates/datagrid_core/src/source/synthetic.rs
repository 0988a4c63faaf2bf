//! Deterministic synthetic employee dataset.
//!
//! Field values are derived from `(seed, row id)` so the same seed always
//! reproduces the same rows, which keeps scenario tests stable.

use super::{Page, PageRequest, PageSource, SourceError};
use crate::model::row::{Row, RowId, RowStatus};
use chrono::NaiveDate;

/// Rows served by the default synthetic source.
pub const SYNTHETIC_ROW_COUNT: usize = 1000;

const DEPARTMENTS: &[&str] = &[
    "Engineering",
    "Marketing",
    "Sales",
    "HR",
    "Finance",
    "Operations",
    "IT",
    "Legal",
];
const POSITIONS: &[&str] = &[
    "Manager",
    "Senior Developer",
    "Developer",
    "Analyst",
    "Coordinator",
    "Specialist",
    "Director",
    "Assistant",
];
const FIRST_NAMES: &[&str] = &[
    "John", "Jane", "Mike", "Sarah", "David", "Lisa", "Tom", "Emma", "Chris", "Anna",
];
const LAST_NAMES: &[&str] = &[
    "Smith",
    "Johnson",
    "Williams",
    "Brown",
    "Jones",
    "Garcia",
    "Miller",
    "Davis",
    "Rodriguez",
    "Martinez",
];
const SALARY_FLOOR: i64 = 30_000;
const SALARY_SPREAD: u64 = 100_000;

/// Seeded generator of employee rows with ids `1..=row_count`.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSource {
    seed: u64,
    row_count: usize,
}

impl SyntheticSource {
    /// Creates a source with the default 1,000 rows.
    pub fn new(seed: u64) -> Self {
        Self::with_row_count(seed, SYNTHETIC_ROW_COUNT)
    }

    pub fn with_row_count(seed: u64, row_count: usize) -> Self {
        Self { seed, row_count }
    }

    /// Materializes `limit` rows starting at `offset`.
    pub fn rows(&self, offset: usize, limit: usize) -> Vec<Row> {
        let end = offset.saturating_add(limit).min(self.row_count);
        (offset.min(end)..end)
            .map(|index| self.row((index + 1) as RowId))
            .collect()
    }

    fn row(&self, id: RowId) -> Row {
        let first = FIRST_NAMES[self.pick(id, 1, FIRST_NAMES.len())];
        let last = LAST_NAMES[self.pick(id, 2, LAST_NAMES.len())];
        let year = 2020 + self.pick(id, 6, 4) as i32;
        let month = 1 + self.pick(id, 7, 12) as u32;
        let day = 1 + self.pick(id, 8, 28) as u32;

        Row {
            id,
            name: format!("{first} {last}"),
            email: format!(
                "{}.{}@company.com",
                first.to_lowercase(),
                last.to_lowercase()
            ),
            department: DEPARTMENTS[self.pick(id, 3, DEPARTMENTS.len())].to_string(),
            position: POSITIONS[self.pick(id, 4, POSITIONS.len())].to_string(),
            salary: SALARY_FLOOR + (self.mix(id, 5) % SALARY_SPREAD) as i64,
            // Day is capped at 28 so every month/year combination exists.
            start_date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
            status: RowStatus::ALL[self.pick(id, 9, RowStatus::ALL.len())],
            comments: Vec::new(),
        }
    }

    fn pick(&self, id: RowId, salt: u64, len: usize) -> usize {
        (self.mix(id, salt) % len as u64) as usize
    }

    // splitmix64 finalizer over (seed, id, salt).
    fn mix(&self, id: RowId, salt: u64) -> u64 {
        let mut z = self
            .seed
            .wrapping_add(u64::from(id).wrapping_mul(0x9E37_79B9_7F4A_7C15))
            .wrapping_add(salt.wrapping_mul(0xD1B5_4A32_D192_ED03));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl PageSource for SyntheticSource {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        let rows = self.rows(request.offset, request.limit);
        let served_until = request.offset.saturating_add(rows.len());
        Ok(Page {
            rows,
            has_more: served_until < self.row_count,
        })
    }

    fn total_rows(&self) -> Option<usize> {
        Some(self.row_count)
    }
}

#[cfg(test)]
mod tests {
    use super::SyntheticSource;

    #[test]
    fn same_seed_reproduces_rows() {
        assert_eq!(
            SyntheticSource::new(42).rows(0, 30),
            SyntheticSource::new(42).rows(0, 30)
        );
    }

    #[test]
    fn generated_rows_satisfy_row_invariants() {
        for row in SyntheticSource::new(9).rows(0, 1000) {
            row.validate().expect("synthetic row should validate");
            assert!((30_000..130_000).contains(&row.salary));
            assert!(row.email.ends_with("@company.com"));
        }
    }

    #[test]
    fn ids_are_one_based_and_contiguous() {
        let ids = SyntheticSource::new(1)
            .rows(20, 5)
            .into_iter()
            .map(|row| row.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![21, 22, 23, 24, 25]);
    }
}
