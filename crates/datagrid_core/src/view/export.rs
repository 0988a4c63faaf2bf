//! CSV and plain-text exports of grid rows.
//!
//! # Invariants
//! - CSV string fields are always double-quoted with embedded quotes doubled.
//! - Row order in the output matches input order.

use super::{format_currency, format_date};
use crate::model::row::Row;

const CSV_HEADERS: [&str; 8] = [
    "ID",
    "Name",
    "Email",
    "Department",
    "Position",
    "Salary",
    "Start Date",
    "Status",
];

/// Export file flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Text,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "data-grid.csv",
            Self::Text => "data-grid.txt",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Text => "text/plain",
        }
    }

    pub fn render(self, rows: &[Row]) -> String {
        match self {
            Self::Csv => export_csv(rows),
            Self::Text => export_text(rows),
        }
    }
}

/// Renders rows as CSV with a header line. Lines are `\n`-separated.
pub fn export_csv(rows: &[Row]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for row in rows {
        lines.push(
            [
                row.id.to_string(),
                quote(&row.name),
                quote(&row.email),
                quote(&row.department),
                quote(&row.position),
                row.salary.to_string(),
                format_date(row.start_date),
                quote(row.status.label()),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}

/// Renders rows as a human-readable report.
pub fn export_text(rows: &[Row]) -> String {
    let mut text = String::from("Data Grid Export\n================\n\n");
    for row in rows {
        text.push_str(&format!("ID: {}\n", row.id));
        text.push_str(&format!("Name: {}\n", row.name));
        text.push_str(&format!("Email: {}\n", row.email));
        text.push_str(&format!("Department: {}\n", row.department));
        text.push_str(&format!("Position: {}\n", row.position));
        text.push_str(&format!("Salary: {}\n", format_currency(row.salary)));
        text.push_str(&format!("Start Date: {}\n", format_date(row.start_date)));
        text.push_str(&format!("Status: {}\n", row.status.label()));
        text.push_str("---\n");
    }
    text
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
