//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the comment store contract used by grid sessions.
//! - Isolate SQLite query details from session orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Comment::validate()` before persistence.

pub mod comment_repo;
