//! Grid session use-case service.
//!
//! # Responsibility
//! - Compose selection, loader, menu, modal and salary state into one
//!   session driven by discrete host events (click, scroll, input).
//! - Persist and rehydrate row comments through `CommentRepository`.
//! - Emit one `GridEvent` per transition.
//!
//! # Invariants
//! - Every operation takes `&mut self`; transitions never interleave.
//! - Row-scoped operations only accept rows present in the page window.
//! - A comment is attached to its row only after the store accepted it.

use crate::config::{ConfigError, GridConfig};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::event::{EventLog, GridEvent, SequencedEvent};
use crate::model::comment::{Attachment, Comment, CommentValidationError};
use crate::model::row::{Row, RowId};
use crate::repo::comment_repo::{CommentRepository, RepoError, SqliteCommentRepository};
use crate::source::{Page, PageRequest, PageSource, SourceError};
use crate::state::action_menu::{ActionMenu, ActionOutcome, RowAction};
use crate::state::comment_modal::{CommentModal, CommentsViewer, ModalError};
use crate::state::loader::{FetchTicket, LoadOutcome, PageLoader, ScrollMetrics};
use crate::state::salary_edit::{SalaryEditor, SalaryError, SalaryUpdate};
use crate::state::selection::SelectionSet;
use crate::view::export::ExportFormat;
use crate::view::{GridView, ModalView, RowView, ViewerView, HEADER_CELLS};
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Session-level error.
#[derive(Debug)]
pub enum SessionError {
    Config(ConfigError),
    Db(DbError),
    Repo(RepoError),
    Source(SourceError),
    Modal(ModalError),
    Salary(SalaryError),
    Comment(CommentValidationError),
    /// Target row is not in the page window.
    RowNotRendered(RowId),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Source(err) => write!(f, "{err}"),
            Self::Modal(err) => write!(f, "{err}"),
            Self::Salary(err) => write!(f, "{err}"),
            Self::Comment(err) => write!(f, "{err}"),
            Self::RowNotRendered(row_id) => write!(f, "row is not rendered: {row_id}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Source(err) => Some(err),
            Self::Modal(err) => Some(err),
            Self::Salary(err) => Some(err),
            Self::Comment(err) => Some(err),
            Self::RowNotRendered(_) => None,
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for SessionError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SourceError> for SessionError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<ModalError> for SessionError {
    fn from(value: ModalError) -> Self {
        Self::Modal(value)
    }
}

impl From<SalaryError> for SessionError {
    fn from(value: SalaryError) -> Self {
        Self::Salary(value)
    }
}

impl From<CommentValidationError> for SessionError {
    fn from(value: CommentValidationError) -> Self {
        Self::Comment(value)
    }
}

/// Interactive grid session over a row source and a comment store.
pub struct GridSession<S: PageSource, C: CommentRepository = SqliteCommentRepository> {
    source: S,
    comments: C,
    selection: SelectionSet,
    loader: PageLoader,
    menu: ActionMenu,
    modal: CommentModal,
    viewer: CommentsViewer,
    salary: SalaryEditor,
    events: EventLog,
    /// Rendered rows whose stored comments could not be loaded yet.
    unhydrated: BTreeSet<RowId>,
}

impl<S: PageSource> GridSession<S, SqliteCommentRepository> {
    /// Opens a session with the SQLite comment store from `config.db_path`.
    ///
    /// Without a `db_path`, comments live in an in-memory database.
    pub fn open(config: GridConfig, source: S) -> Result<Self, SessionError> {
        config.validate()?;
        let conn = match config.db_path.as_ref() {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        let comments = SqliteCommentRepository::try_new(conn)?;
        Self::new(config, source, comments)
    }
}

impl<S: PageSource, C: CommentRepository> GridSession<S, C> {
    /// Creates an idle session with an empty page window.
    pub fn new(config: GridConfig, source: S, comments: C) -> Result<Self, SessionError> {
        config.validate()?;
        let mut loader = PageLoader::new(&config);
        loader.set_total_rows(source.total_rows());
        info!(
            "event=session_open module=session status=ok page_size={} total_rows={}",
            loader.page_size(),
            source
                .total_rows()
                .map_or_else(|| "unknown".to_string(), |total| total.to_string())
        );
        Ok(Self {
            source,
            comments,
            selection: SelectionSet::new(),
            loader,
            menu: ActionMenu::new(),
            modal: CommentModal::new(),
            viewer: CommentsViewer::default(),
            salary: SalaryEditor::new(config.salary_max),
            events: EventLog::new(),
            unhydrated: BTreeSet::new(),
        })
    }

    pub fn rows(&self) -> &[Row] {
        self.loader.window().rows()
    }

    pub fn row(&self, row_id: RowId) -> Option<&Row> {
        self.loader.window().get(row_id)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn loader(&self) -> &PageLoader {
        &self.loader
    }

    pub fn menu(&self) -> &ActionMenu {
        &self.menu
    }

    pub fn modal(&self) -> &CommentModal {
        &self.modal
    }

    pub fn salary_editor(&self) -> &SalaryEditor {
        &self.salary
    }

    pub fn comment_store(&self) -> &C {
        &self.comments
    }

    /// Returns and clears pending transition events.
    pub fn drain_events(&mut self) -> Vec<SequencedEvent> {
        self.events.drain()
    }

    // ---- selection ----

    /// Flips the checkbox of a rendered row and returns the new summary.
    pub fn toggle_row(&mut self, row_id: RowId) -> Result<Option<String>, SessionError> {
        self.ensure_rendered(row_id)?;
        self.selection.toggle(row_id);
        Ok(self.emit_selection(row_id))
    }

    /// Applies an explicit checkbox state delivered with a change event.
    pub fn set_row_checked(
        &mut self,
        row_id: RowId,
        checked: bool,
    ) -> Result<Option<String>, SessionError> {
        self.ensure_rendered(row_id)?;
        if self.selection.set_checked(row_id, checked) {
            return Ok(self.emit_selection(row_id));
        }
        Ok(self.selection.render())
    }

    fn emit_selection(&mut self, row_id: RowId) -> Option<String> {
        let summary = self.selection.render();
        self.events.push(GridEvent::SelectionChanged {
            row_id,
            selected: self.selection.contains(row_id),
            summary: summary.clone(),
        });
        summary
    }

    // ---- incremental loading ----

    /// Requests the next page; used for the initial load and retries.
    pub fn request_next_page(&mut self) -> Option<FetchTicket> {
        let ticket = self.loader.request_next_page()?;
        self.events.push(GridEvent::LoadStarted {
            sequence: ticket.sequence,
            page_index: ticket.request.page_index,
        });
        Some(ticket)
    }

    /// Handles a host scroll event.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> Option<FetchTicket> {
        let ticket = self.loader.on_scroll(metrics)?;
        self.events.push(GridEvent::LoadStarted {
            sequence: ticket.sequence,
            page_index: ticket.request.page_index,
        });
        Some(ticket)
    }

    /// Fetches the page for `ticket` from the session source.
    ///
    /// Hosts with their own async fetch call `complete_fetch` directly.
    pub fn fetch(&self, ticket: &FetchTicket) -> Result<Page, SourceError> {
        self.source.fetch_page(&ticket.request)
    }

    /// Applies a fetch result and hydrates stored comments for new rows.
    ///
    /// Rows whose hydration failed earlier are retried alongside.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Page, SourceError>,
    ) -> LoadOutcome {
        let before = self.loader.window().len();
        let outcome = self.loader.complete(ticket, result);
        match &outcome {
            LoadOutcome::Appended {
                added,
                total,
                exhausted,
            } => {
                let new_ids = self.loader.window().rows()[before..]
                    .iter()
                    .map(|row| row.id)
                    .collect::<Vec<_>>();
                self.hydrate_comments(new_ids);
                info!(
                    "event=page_load module=session status=ok sequence={} added={} total={}",
                    ticket.sequence, added, total
                );
                self.events.push(GridEvent::PageAppended {
                    sequence: ticket.sequence,
                    added: *added,
                    total: *total,
                });
                if *exhausted {
                    self.events.push(GridEvent::Exhausted { total: *total });
                }
            }
            LoadOutcome::Failed(err) => {
                self.events.push(GridEvent::LoadFailed {
                    sequence: ticket.sequence,
                    error: err.clone(),
                });
            }
            LoadOutcome::Stale => {
                self.events.push(GridEvent::LoadStale {
                    sequence: ticket.sequence,
                });
            }
        }
        outcome
    }

    /// Requests, fetches and applies one page synchronously.
    pub fn load_next(&mut self) -> Option<LoadOutcome> {
        let ticket = self.request_next_page()?;
        let result = self.fetch(&ticket);
        Some(self.complete_fetch(ticket, result))
    }

    /// Scroll signal followed by a synchronous fetch when it triggers.
    pub fn scroll_and_load(&mut self, metrics: ScrollMetrics) -> Option<LoadOutcome> {
        let ticket = self.on_scroll(metrics)?;
        let result = self.fetch(&ticket);
        Some(self.complete_fetch(ticket, result))
    }

    fn hydrate_comments(&mut self, new_ids: Vec<RowId>) {
        self.unhydrated.extend(new_ids);
        if self.unhydrated.is_empty() {
            return;
        }
        let row_ids = self.unhydrated.iter().copied().collect::<Vec<_>>();
        match self.comments.list_for_rows(&row_ids) {
            Ok(grouped) => {
                self.unhydrated.clear();
                self.loader
                    .window_mut()
                    .merge_comments(grouped.into_values().flatten().collect());
            }
            Err(err) => {
                error!(
                    "event=comments_hydrate module=session status=error rows={} error={}",
                    row_ids.len(),
                    err
                );
                self.events.push(GridEvent::CommentsUnavailable {
                    row_ids,
                    error: err.to_string(),
                });
            }
        }
    }

    /// Rows still waiting for their stored comments.
    pub fn unhydrated_rows(&self) -> Vec<RowId> {
        self.unhydrated.iter().copied().collect()
    }

    // ---- action menu ----

    /// Ellipsis click on a rendered row.
    pub fn toggle_menu(&mut self, row_id: RowId) -> Result<(), SessionError> {
        self.ensure_rendered(row_id)?;
        let was_open = self.menu.is_open(row_id);
        if let Some(displaced) = self.menu.toggle(row_id) {
            self.events.push(GridEvent::MenuClosed { row_id: displaced });
        }
        if was_open {
            self.events.push(GridEvent::MenuClosed { row_id });
        } else {
            self.events.push(GridEvent::MenuOpened { row_id });
        }
        Ok(())
    }

    /// Click outside any menu.
    pub fn close_menu(&mut self) {
        if let Some(row_id) = self.menu.close() {
            self.events.push(GridEvent::MenuClosed { row_id });
        }
    }

    /// Runs one menu action. The menu is closed whatever the outcome.
    pub fn invoke_action(
        &mut self,
        row_id: RowId,
        action: RowAction,
    ) -> Result<ActionOutcome, SessionError> {
        let Some(row) = self.loader.window().get(row_id) else {
            self.close_menu();
            return Err(SessionError::RowNotRendered(row_id));
        };
        let open_row = self.menu.open_row();
        let outcome = self.menu.invoke(action, row);
        if let Some(closed) = open_row {
            self.events.push(GridEvent::MenuClosed { row_id: closed });
        }
        info!(
            "event=row_action module=session status=ok row_id={} action={}",
            row_id,
            action.label()
        );
        self.events.push(GridEvent::ActionInvoked {
            row_id,
            action,
            confirmation: outcome.confirmation.clone(),
        });
        Ok(outcome)
    }

    // ---- comments ----

    /// Opens the add-comment modal for a rendered row.
    pub fn open_comment_modal(&mut self, row_id: RowId) -> Result<(), SessionError> {
        self.ensure_rendered(row_id)?;
        if let Some(previous) = self.modal.cancel() {
            self.events.push(GridEvent::ModalClosed {
                row_id: previous,
                submitted: false,
            });
        }
        self.modal.open(row_id);
        self.events.push(GridEvent::ModalOpened { row_id });
        Ok(())
    }

    pub fn set_comment_text(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.modal.set_text(text)?;
        Ok(())
    }

    /// Adds an attachment reference to the open draft.
    pub fn attach_file(&mut self, file_name: impl Into<String>) -> Result<(), SessionError> {
        let attachment = Attachment::new(file_name)?;
        self.modal.attach(attachment)?;
        Ok(())
    }

    pub fn clear_attachments(&mut self) -> Result<(), SessionError> {
        self.modal.clear_attachments()?;
        Ok(())
    }

    pub fn can_submit_comment(&self) -> bool {
        self.modal.can_submit()
    }

    /// Persists the draft against the target row and closes the modal.
    ///
    /// On a store failure the modal and its draft are restored unchanged.
    pub fn submit_comment(&mut self) -> Result<Comment, SessionError> {
        self.hydrate_comments(Vec::new());
        let snapshot = self.modal.clone();
        let comment = self.modal.submit()?;
        if let Err(err) = self.comments.add_comment(&comment) {
            self.modal = snapshot;
            warn!(
                "event=comment_submit module=session status=error row_id={} error={}",
                comment.row_id, err
            );
            return Err(err.into());
        }

        self.loader.window_mut().push_comment(comment.clone());
        info!(
            "event=comment_submit module=session status=ok row_id={} attachments={}",
            comment.row_id,
            comment.attachments.len()
        );
        self.events.push(GridEvent::CommentAdded {
            row_id: comment.row_id,
            comment_id: comment.id,
        });
        self.events.push(GridEvent::ModalClosed {
            row_id: comment.row_id,
            submitted: true,
        });
        Ok(comment)
    }

    /// Discards the draft and closes the modal.
    pub fn cancel_comment(&mut self) {
        if let Some(row_id) = self.modal.cancel() {
            self.events.push(GridEvent::ModalClosed {
                row_id,
                submitted: false,
            });
        }
    }

    /// Opens the read-only comments list; closes any open menu.
    pub fn view_comments(&mut self, row_id: RowId) -> Result<(), SessionError> {
        self.ensure_rendered(row_id)?;
        self.close_menu();
        self.viewer.open(row_id);
        self.events.push(GridEvent::CommentsViewerOpened { row_id });
        Ok(())
    }

    pub fn close_comments_viewer(&mut self) {
        if let Some(row_id) = self.viewer.close() {
            self.events.push(GridEvent::CommentsViewerClosed { row_id });
        }
    }

    // ---- salary ----

    pub fn start_salary_edit(&mut self, row_id: RowId) -> Result<(), SessionError> {
        let current = self
            .loader
            .window()
            .get(row_id)
            .map(|row| row.salary)
            .ok_or(SessionError::RowNotRendered(row_id))?;
        self.salary.start_edit(row_id, current);
        self.events.push(GridEvent::SalaryEditStarted { row_id });
        Ok(())
    }

    pub fn set_salary_input(&mut self, input: impl Into<String>) -> Result<(), SessionError> {
        self.salary.set_input(input)?;
        Ok(())
    }

    pub fn cancel_salary_edit(&mut self) {
        if let Some(row_id) = self.salary.cancel_edit() {
            self.events.push(GridEvent::SalaryEditCancelled { row_id });
        }
    }

    /// Validates and applies the salary draft to the rendered row.
    pub fn save_salary(&mut self) -> Result<SalaryUpdate, SessionError> {
        let update = self.salary.save()?;
        self.loader
            .window_mut()
            .set_salary(update.employee_id, update.new_salary);
        info!(
            "event=salary_update module=session status=ok row_id={}",
            update.employee_id
        );
        self.events.push(GridEvent::SalaryUpdated(update));
        Ok(update)
    }

    // ---- export & view ----

    /// Exports every row of the source, not only the rendered window.
    pub fn export(&self, format: ExportFormat) -> Result<String, SessionError> {
        let page_size = self.loader.page_size();
        let mut rows = Vec::new();
        let mut page_index = 0;
        loop {
            let page = self.source.fetch_page(&PageRequest {
                page_index,
                offset: rows.len(),
                limit: page_size,
            })?;
            let served = page.rows.len();
            rows.extend(page.rows);
            if !page.has_more || served == 0 {
                break;
            }
            page_index += 1;
        }
        for row in &mut rows {
            if let Some(rendered) = self.loader.window().get(row.id) {
                row.salary = rendered.salary;
            }
        }
        Ok(format.render(&rows))
    }

    /// Builds the render snapshot for the current state.
    pub fn view(&self) -> GridView {
        let window = self.loader.window();
        let rows = window
            .rows()
            .iter()
            .map(|row| {
                RowView::build(
                    row,
                    self.selection.contains(row.id),
                    self.menu.is_open(row.id),
                    self.salary.editing_row() == Some(row.id),
                    self.salary.has_updated_salary(row.id),
                )
            })
            .collect();

        let comment_modal = match (self.modal.target(), self.modal.draft()) {
            (Some(row_id), Some(draft)) => Some(ModalView::build(
                row_id,
                window.get(row_id).map_or("", |row| row.name.as_str()),
                draft,
            )),
            _ => None,
        };
        let comments_viewer = self.viewer.target().map(|row_id| ViewerView {
            row_id,
            comments: window
                .get(row_id)
                .map(|row| row.comments.clone())
                .unwrap_or_default(),
        });

        GridView {
            headers: HEADER_CELLS.to_vec(),
            rows,
            selection_summary: self.selection.render(),
            loading_indicator: self.loader.is_loading(),
            loading_progress: self.loader.progress_percent(),
            comment_modal,
            comments_viewer,
        }
    }

    fn ensure_rendered(&self, row_id: RowId) -> Result<(), SessionError> {
        if self.loader.window().get(row_id).is_none() {
            return Err(SessionError::RowNotRendered(row_id));
        }
        Ok(())
    }
}
