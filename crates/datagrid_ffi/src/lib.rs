//! Flutter-facing bindings for the grid core.

pub mod api;
