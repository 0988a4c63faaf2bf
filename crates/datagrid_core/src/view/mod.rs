//! Rendered view contract and display formatting.
//!
//! # Responsibility
//! - Project session state into the snapshot a UI host renders.
//! - Own display formatting shared by the grid and exports.
//!
//! # Invariants
//! - Header cells and per-row cell count are fixed (`HEADER_CELLS`).
//! - Salary text is always `$`-prefixed with thousands separators.

use chrono::NaiveDate;

pub mod export;
pub mod render;

pub use render::{GridView, ModalView, RowView, ViewerView, HEADER_CELLS};

/// Formats whole currency units as `$1,234,567`.
pub fn format_currency(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Formats a calendar date as `M/D/YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}
