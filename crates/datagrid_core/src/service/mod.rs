//! Session services.
//!
//! # Responsibility
//! - Orchestrate state machines, the row source and the comment store into
//!   host-facing grid operations.
//! - Keep FFI and CLI layers decoupled from storage details.

pub mod grid_session;
