//! Grid domain model.
//!
//! # Responsibility
//! - Define canonical row and comment records used by grid state.
//!
//! # Invariants
//! - Every row is identified by a stable `RowId`.
//! - Every comment belongs to exactly one row.

pub mod comment;
pub mod row;
