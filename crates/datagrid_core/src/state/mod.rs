//! Explicit grid interaction state.
//!
//! # Responsibility
//! - Model every piece of UI state the rendered grid depends on as plain,
//!   inspectable values instead of ambient DOM state.
//! - Keep each state machine independent; `service::GridSession` composes
//!   them and sequences transitions.

pub mod action_menu;
pub mod comment_modal;
pub mod loader;
pub mod salary_edit;
pub mod selection;
