//! Scroll-triggered incremental page loader.
//!
//! # Responsibility
//! - Own the append-only page window and the fetch state machine.
//! - Translate scroll-reaches-bottom signals into page requests.
//!
//! # Invariants
//! - At most one fetch is in flight; triggers while `Loading` are dropped.
//! - A completion is applied only for the ticket currently in flight.
//! - Rows are appended in fetch order; the window never shrinks.
//! - `Exhausted` is terminal.
//! - A failed fetch returns to `Idle` with the window untouched.
//! - Only rows passing `Row::validate()` enter the window.

use crate::config::{GridConfig, MAX_PAGE_SIZE};
use crate::model::comment::Comment;
use crate::model::row::{Row, RowId};
use crate::source::{Page, PageRequest, PageSource, SourceError};
use log::{debug, warn};
use std::collections::HashMap;

/// Loader lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    Loading(FetchTicket),
    Exhausted,
}

/// Handle for the one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    /// Monotonic per-loader fetch number.
    pub sequence: u64,
    pub request: PageRequest,
}

/// Scroll position reported by the host on every scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollMetrics {
    /// Whether the viewport bottom is within `threshold_px` of the document end.
    pub fn reached_bottom(&self, threshold_px: f64) -> bool {
        self.scroll_top + self.viewport_height >= self.document_height - threshold_px
    }
}

/// Result of applying a fetch completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Rows were appended.
    Appended {
        added: usize,
        total: usize,
        exhausted: bool,
    },
    /// Fetch failed; loader is back to `Idle`.
    Failed(SourceError),
    /// Ticket did not match the in-flight fetch; nothing changed.
    Stale,
}

/// Ordered, append-only list of rendered rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageWindow {
    rows: Vec<Row>,
    positions: HashMap<RowId, usize>,
}

impl PageWindow {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row_id: RowId) -> Option<&Row> {
        self.positions.get(&row_id).map(|index| &self.rows[*index])
    }

    /// Appends one comment to a rendered row.
    ///
    /// Returns `false` if the row is not rendered or already holds a comment
    /// with the same id.
    pub fn push_comment(&mut self, comment: Comment) -> bool {
        match self.row_mut(comment.row_id) {
            Some(row) if !row.comments.iter().any(|held| held.id == comment.id) => {
                row.comments.push(comment);
                true
            }
            _ => false,
        }
    }

    /// Merges stored comments into rendered rows, keeping each row's list
    /// oldest first. Comments already held are skipped.
    ///
    /// Returns how many comments were added.
    pub fn merge_comments(&mut self, comments: Vec<Comment>) -> usize {
        let mut touched = Vec::new();
        for comment in comments {
            let row_id = comment.row_id;
            if self.push_comment(comment) {
                touched.push(row_id);
            }
        }
        let added = touched.len();
        touched.dedup();
        for row_id in touched {
            if let Some(row) = self.row_mut(row_id) {
                row.comments.sort_by_key(|comment| comment.created_at);
            }
        }
        added
    }

    /// Replaces the salary of a rendered row. Returns `false` if not rendered.
    pub fn set_salary(&mut self, row_id: RowId, salary: i64) -> bool {
        match self.row_mut(row_id) {
            Some(row) => {
                row.salary = salary;
                true
            }
            None => false,
        }
    }

    // Private so callers cannot rewrite `id` behind the position index.
    fn row_mut(&mut self, row_id: RowId) -> Option<&mut Row> {
        let index = *self.positions.get(&row_id)?;
        self.rows.get_mut(index)
    }

    /// Appends rows in order and returns how many were added.
    ///
    /// Rows whose id is already rendered are skipped.
    fn append(&mut self, rows: Vec<Row>) -> usize {
        let mut added = 0;
        for row in rows {
            if self.positions.contains_key(&row.id) {
                warn!(
                    "event=window_append module=loader status=skipped reason=duplicate_id row_id={}",
                    row.id
                );
                continue;
            }
            self.positions.insert(row.id, self.rows.len());
            self.rows.push(row);
            added += 1;
        }
        added
    }
}

/// Incremental loader state machine.
#[derive(Debug, Clone)]
pub struct PageLoader {
    state: LoaderState,
    window: PageWindow,
    page_size: usize,
    scroll_threshold_px: f64,
    next_page_index: usize,
    next_offset: usize,
    next_sequence: u64,
    total_rows: Option<usize>,
}

impl PageLoader {
    /// Creates an idle loader. Page size is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(config: &GridConfig) -> Self {
        Self {
            state: LoaderState::Idle,
            window: PageWindow::default(),
            page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
            scroll_threshold_px: config.scroll_threshold_px,
            next_page_index: 0,
            next_offset: 0,
            next_sequence: 1,
            total_rows: None,
        }
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoaderState::Loading(_))
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == LoaderState::Exhausted
    }

    pub fn window(&self) -> &PageWindow {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut PageWindow {
        &mut self.window
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Records the total row count reported by the source.
    pub fn set_total_rows(&mut self, total: Option<usize>) {
        self.total_rows = total;
    }

    /// Handles one scroll event; requests a page only at the bottom edge.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> Option<FetchTicket> {
        if !metrics.reached_bottom(self.scroll_threshold_px) {
            return None;
        }
        self.request_next_page()
    }

    /// Moves `Idle -> Loading` and returns the ticket for the new fetch.
    ///
    /// Returns `None` while a fetch is in flight or after exhaustion.
    pub fn request_next_page(&mut self) -> Option<FetchTicket> {
        match self.state {
            LoaderState::Idle => {}
            LoaderState::Loading(ticket) => {
                debug!(
                    "event=load_request module=loader status=suppressed in_flight={}",
                    ticket.sequence
                );
                return None;
            }
            LoaderState::Exhausted => return None,
        }

        let ticket = FetchTicket {
            sequence: self.next_sequence,
            request: PageRequest {
                page_index: self.next_page_index,
                offset: self.next_offset,
                limit: self.page_size,
            },
        };
        self.next_sequence += 1;
        self.state = LoaderState::Loading(ticket);
        debug!(
            "event=load_request module=loader status=start sequence={} page_index={} offset={}",
            ticket.sequence, ticket.request.page_index, ticket.request.offset
        );
        Some(ticket)
    }

    /// Applies the result of the fetch identified by `ticket`.
    ///
    /// A page holding any invalid row is rejected whole as
    /// `SourceError::InvalidRow`; the window is left unchanged.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Page, SourceError>,
    ) -> LoadOutcome {
        if self.state != LoaderState::Loading(ticket) {
            debug!(
                "event=load_complete module=loader status=stale sequence={}",
                ticket.sequence
            );
            return LoadOutcome::Stale;
        }

        match result.and_then(validated) {
            Ok(page) => {
                let served = page.rows.len();
                let exhausted = !page.has_more;
                let added = self.window.append(page.rows);
                self.next_page_index += 1;
                self.next_offset += served;
                self.state = if exhausted {
                    LoaderState::Exhausted
                } else {
                    LoaderState::Idle
                };
                LoadOutcome::Appended {
                    added,
                    total: self.window.len(),
                    exhausted,
                }
            }
            Err(err) => {
                self.state = LoaderState::Idle;
                warn!(
                    "event=load_complete module=loader status=error sequence={} error={}",
                    ticket.sequence, err
                );
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Requests, fetches and applies one page synchronously.
    ///
    /// Returns `None` when no fetch was started.
    pub fn load_next(&mut self, source: &dyn PageSource) -> Option<LoadOutcome> {
        let ticket = self.request_next_page()?;
        if self.total_rows.is_none() {
            self.total_rows = source.total_rows();
        }
        let result = source.fetch_page(&ticket.request);
        Some(self.complete(ticket, result))
    }

    /// Loading progress in percent of the known total; `0` when idle.
    pub fn progress_percent(&self) -> f64 {
        if !self.is_loading() {
            return 0.0;
        }
        match self.total_rows {
            Some(total) if total > 0 => {
                (self.window.len() as f64 / total as f64 * 100.0).min(100.0)
            }
            _ => 0.0,
        }
    }
}

fn validated(page: Page) -> Result<Page, SourceError> {
    for row in &page.rows {
        row.validate()?;
    }
    Ok(page)
}
