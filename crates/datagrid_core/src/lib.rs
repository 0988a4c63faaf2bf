//! Core logic for the incremental data grid.
//! Hosts render `GridView` snapshots and feed interaction events back in.

pub mod config;
pub mod db;
pub mod event;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod source;
pub mod state;
pub mod view;

pub use config::{ConfigError, GridConfig};
pub use event::{EventLog, GridEvent, SequencedEvent};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::comment::{Attachment, Comment, CommentId, CommentValidationError};
pub use model::row::{Row, RowId, RowStatus, RowValidationError};
pub use repo::comment_repo::{CommentRepository, RepoError, RepoResult, SqliteCommentRepository};
pub use service::grid_session::{GridSession, SessionError};
pub use source::{InMemorySource, Page, PageRequest, PageSource, SourceError, SyntheticSource};
pub use state::action_menu::{ActionMenu, ActionOutcome, RowAction};
pub use state::comment_modal::{CommentDraft, CommentModal, CommentsViewer, ModalError};
pub use state::loader::{FetchTicket, LoadOutcome, LoaderState, PageLoader, ScrollMetrics};
pub use state::salary_edit::{SalaryEditor, SalaryError, SalaryUpdate};
pub use state::selection::SelectionSet;
pub use view::export::ExportFormat;
pub use view::GridView;

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
