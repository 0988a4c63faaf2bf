//! FFI use-case API for the grid host.
//!
//! # Responsibility
//! - Expose one process-wide grid session to Dart via FRB.
//! - Translate host events (click, scroll, input) into session calls.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every mutating call returns an envelope; failures never tear down the
//!   session.
//! - Calls are serialized through one mutex, so transitions never interleave.

use datagrid_core::{
    core_version as core_version_inner, default_log_level as default_log_level_inner,
    init_logging as init_logging_inner, ping as ping_inner, ExportFormat, GridConfig, GridEvent,
    GridSession, LoadOutcome, RowAction, ScrollMetrics, SessionError, SyntheticSource,
};
use log::{info, warn};
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Mutex;

const DB_PATH_ENV: &str = "DATAGRID_DB_PATH";

type HostSession = GridSession<SyntheticSource>;

static SESSION: Lazy<Mutex<Option<HostSession>>> = Lazy::new(|| Mutex::new(None));

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Log level matching the build mode (`debug` or `info`).
#[flutter_rust_bridge::frb(sync)]
pub fn default_log_level() -> String {
    default_log_level_inner().to_owned()
}

/// Result envelope for grid commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridActionResponse {
    /// Whether the command succeeded.
    pub ok: bool,
    /// Human-readable result or error text for the UI.
    pub message: String,
    /// Selection summary after the command; `None` hides the display.
    pub selection_summary: Option<String>,
    /// Rows currently rendered.
    pub row_count: u32,
    /// Whether a page fetch is in flight.
    pub loading: bool,
}

impl GridActionResponse {
    fn from_session(session: &HostSession, message: String) -> Self {
        Self {
            ok: true,
            message,
            selection_summary: session.selection().render(),
            row_count: session.rows().len() as u32,
            loading: session.loader().is_loading(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            selection_summary: None,
            row_count: 0,
            loading: false,
        }
    }
}

/// Export payload for a host-side download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridExportResponse {
    pub ok: bool,
    pub message: String,
    pub file_name: String,
    pub content_type: String,
    pub content: String,
}

/// One drained session event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridEventItem {
    pub sequence: u64,
    /// Stable snake_case event kind.
    pub kind: String,
    pub row_id: Option<u32>,
    /// Kind-specific detail (summary, confirmation, payload JSON, ...).
    pub detail: Option<String>,
}

/// Opens a grid session over the synthetic employee dataset and loads the
/// first page.
///
/// `config_json` uses `GridConfig` keys; omitted keys take defaults. When no
/// `db_path` is configured, `DATAGRID_DB_PATH` is used if set, otherwise
/// comments stay in memory. Replaces any open session.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_open(seed: u64, config_json: Option<String>) -> GridActionResponse {
    let config = match resolve_config(config_json.as_deref()) {
        Ok(config) => config,
        Err(err) => return GridActionResponse::failure(format!("grid_open failed: {err}")),
    };
    let Ok(mut slot) = SESSION.lock() else {
        return GridActionResponse::failure("grid_open failed: session lock poisoned");
    };

    match GridSession::open(config, SyntheticSource::new(seed)) {
        Ok(mut session) => {
            let response = match outcome_message(session.load_next()) {
                Ok(_) => {
                    info!(
                        "event=ffi_grid_open module=ffi status=ok rows={}",
                        session.rows().len()
                    );
                    GridActionResponse::from_session(&session, "Grid opened.".to_string())
                }
                Err(err) => {
                    // Session stays open so the host can retry via `grid_load_next`.
                    warn!("event=ffi_grid_open module=ffi status=error error={err}");
                    GridActionResponse {
                        ok: false,
                        message: format!("grid_open: first page failed: {err}"),
                        ..GridActionResponse::from_session(&session, String::new())
                    }
                }
            };
            *slot = Some(session);
            response
        }
        Err(err) => {
            warn!("event=ffi_grid_open module=ffi status=error error={err}");
            GridActionResponse::failure(format!("grid_open failed: {err}"))
        }
    }
}

/// Drops the open session, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_close() -> bool {
    match SESSION.lock() {
        Ok(mut slot) => slot.take().is_some(),
        Err(_) => false,
    }
}

/// Checkbox click on a row.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_toggle_row(row_id: u32) -> GridActionResponse {
    with_session("grid_toggle_row", |session| {
        session.toggle_row(row_id)?;
        Ok(String::new())
    })
}

/// Scroll event; loads the next page synchronously when the bottom is reached.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_scroll(
    scroll_top: f64,
    viewport_height: f64,
    document_height: f64,
) -> GridActionResponse {
    let metrics = ScrollMetrics {
        scroll_top,
        viewport_height,
        document_height,
    };
    with_session("grid_scroll", |session| {
        outcome_message(session.scroll_and_load(metrics))
    })
}

/// Loads the next page regardless of scroll position (retry button).
#[flutter_rust_bridge::frb(sync)]
pub fn grid_load_next() -> GridActionResponse {
    with_session("grid_load_next", |session| outcome_message(session.load_next()))
}

/// Ellipsis click on a row.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_toggle_menu(row_id: u32) -> GridActionResponse {
    with_session("grid_toggle_menu", |session| {
        session.toggle_menu(row_id)?;
        Ok(String::new())
    })
}

/// Click outside any open menu.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_close_menu() -> GridActionResponse {
    with_session("grid_close_menu", |session| {
        session.close_menu();
        Ok(String::new())
    })
}

/// Runs a menu action. `action` is `a|b|c` or the menu label.
///
/// The response message carries the confirmation text.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_invoke_action(row_id: u32, action: String) -> GridActionResponse {
    let Some(action) = parse_action(action.as_str()) else {
        return GridActionResponse::failure(format!(
            "grid_invoke_action failed: unknown action `{}`",
            action.trim()
        ));
    };
    with_session("grid_invoke_action", |session| {
        let outcome = session.invoke_action(row_id, action)?;
        Ok(outcome.confirmation.unwrap_or_default())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn grid_open_comment_modal(row_id: u32) -> GridActionResponse {
    with_session("grid_open_comment_modal", |session| {
        session.open_comment_modal(row_id)?;
        Ok(String::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn grid_set_comment_text(text: String) -> GridActionResponse {
    with_session("grid_set_comment_text", |session| {
        session.set_comment_text(text)?;
        Ok(String::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn grid_attach_file(file_name: String) -> GridActionResponse {
    with_session("grid_attach_file", |session| {
        session.attach_file(file_name)?;
        Ok(String::new())
    })
}

/// Submits the open comment draft. The message carries the new comment id.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_submit_comment() -> GridActionResponse {
    with_session("grid_submit_comment", |session| {
        let comment = session.submit_comment()?;
        Ok(comment.id.to_string())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn grid_cancel_comment() -> GridActionResponse {
    with_session("grid_cancel_comment", |session| {
        session.cancel_comment();
        Ok(String::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn grid_view_comments(row_id: u32) -> GridActionResponse {
    with_session("grid_view_comments", |session| {
        session.view_comments(row_id)?;
        Ok(String::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn grid_close_comments_viewer() -> GridActionResponse {
    with_session("grid_close_comments_viewer", |session| {
        session.close_comments_viewer();
        Ok(String::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn grid_start_salary_edit(row_id: u32) -> GridActionResponse {
    with_session("grid_start_salary_edit", |session| {
        session.start_salary_edit(row_id)?;
        Ok(String::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn grid_set_salary_input(input: String) -> GridActionResponse {
    with_session("grid_set_salary_input", |session| {
        session.set_salary_input(input)?;
        Ok(String::new())
    })
}

/// Saves the salary draft. The message carries the update request JSON.
///
/// On validation failure the message is the user-facing alert text.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_save_salary() -> GridActionResponse {
    with_session("grid_save_salary", |session| {
        let update = session.save_salary()?;
        Ok(update.to_request_json())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn grid_cancel_salary_edit() -> GridActionResponse {
    with_session("grid_cancel_salary_edit", |session| {
        session.cancel_salary_edit();
        Ok(String::new())
    })
}

/// Exports all rows. `format` is `csv` or `text`.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_export(format: String) -> GridExportResponse {
    let failure = |message: String| GridExportResponse {
        ok: false,
        message,
        file_name: String::new(),
        content_type: String::new(),
        content: String::new(),
    };
    let format = match format.trim().to_ascii_lowercase().as_str() {
        "csv" => ExportFormat::Csv,
        "text" | "txt" => ExportFormat::Text,
        other => return failure(format!("grid_export failed: unknown format `{other}`")),
    };

    let Ok(slot) = SESSION.lock() else {
        return failure("grid_export failed: session lock poisoned".to_string());
    };
    let Some(session) = slot.as_ref() else {
        return failure("grid_export failed: no open grid".to_string());
    };
    match session.export(format) {
        Ok(content) => GridExportResponse {
            ok: true,
            message: "Export ready.".to_string(),
            file_name: format.file_name().to_string(),
            content_type: format.content_type().to_string(),
            content,
        },
        Err(err) => failure(format!("grid_export failed: {err}")),
    }
}

/// Current render snapshot as camelCase JSON; empty string without a session.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_view_json() -> String {
    let Ok(slot) = SESSION.lock() else {
        return String::new();
    };
    slot.as_ref()
        .and_then(|session| serde_json::to_string(&session.view()).ok())
        .unwrap_or_default()
}

/// Returns and clears pending session events, oldest first.
#[flutter_rust_bridge::frb(sync)]
pub fn grid_drain_events() -> Vec<GridEventItem> {
    let Ok(mut slot) = SESSION.lock() else {
        return Vec::new();
    };
    slot.as_mut()
        .map(|session| {
            session
                .drain_events()
                .into_iter()
                .map(|event| to_event_item(event.sequence, event.event))
                .collect()
        })
        .unwrap_or_default()
}

fn with_session(
    operation: &str,
    f: impl FnOnce(&mut HostSession) -> Result<String, SessionError>,
) -> GridActionResponse {
    let Ok(mut slot) = SESSION.lock() else {
        return GridActionResponse::failure(format!("{operation} failed: session lock poisoned"));
    };
    let Some(session) = slot.as_mut() else {
        return GridActionResponse::failure(format!("{operation} failed: no open grid"));
    };
    match f(session) {
        Ok(message) => GridActionResponse::from_session(session, message),
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op={operation} error={err}");
            GridActionResponse {
                ok: false,
                message: err.to_string(),
                ..GridActionResponse::from_session(session, String::new())
            }
        }
    }
}

fn outcome_message(outcome: Option<LoadOutcome>) -> Result<String, SessionError> {
    match outcome {
        None => Ok("No page requested.".to_string()),
        Some(LoadOutcome::Appended {
            added,
            total,
            exhausted,
        }) => {
            let mut message = format!("Loaded {added} row(s); {total} rendered.");
            if exhausted {
                message.push_str(" All rows loaded.");
            }
            Ok(message)
        }
        Some(LoadOutcome::Stale) => Ok("Stale page ignored.".to_string()),
        Some(LoadOutcome::Failed(err)) => Err(err.into()),
    }
}

fn resolve_config(config_json: Option<&str>) -> Result<GridConfig, String> {
    let mut config = match config_json.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => GridConfig::from_json_str(raw).map_err(|err| err.to_string())?,
        None => GridConfig::default(),
    };
    if config.db_path.is_none() {
        config.db_path = env_db_path();
    }
    Ok(config)
}

fn env_db_path() -> Option<PathBuf> {
    let raw = std::env::var(DB_PATH_ENV).ok()?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

fn parse_action(raw: &str) -> Option<RowAction> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "a" | "action a" => Some(RowAction::ActionA),
        "b" | "action b" => Some(RowAction::ActionB),
        "c" | "action c" => Some(RowAction::ActionC),
        _ => None,
    }
}

fn to_event_item(sequence: u64, event: GridEvent) -> GridEventItem {
    let (kind, row_id, detail) = match event {
        GridEvent::SelectionChanged {
            row_id, summary, ..
        } => ("selection_changed", Some(row_id), summary),
        GridEvent::LoadStarted { page_index, .. } => {
            ("load_started", None, Some(page_index.to_string()))
        }
        GridEvent::PageAppended { added, total, .. } => {
            ("page_appended", None, Some(format!("added={added} total={total}")))
        }
        GridEvent::LoadFailed { error, .. } => ("load_failed", None, Some(error.to_string())),
        GridEvent::LoadStale { .. } => ("load_stale", None, None),
        GridEvent::Exhausted { total } => ("exhausted", None, Some(total.to_string())),
        GridEvent::CommentsUnavailable { row_ids, error } => (
            "comments_unavailable",
            row_ids.first().copied(),
            Some(format!("rows={} error={error}", row_ids.len())),
        ),
        GridEvent::MenuOpened { row_id } => ("menu_opened", Some(row_id), None),
        GridEvent::MenuClosed { row_id } => ("menu_closed", Some(row_id), None),
        GridEvent::ActionInvoked {
            row_id,
            confirmation,
            ..
        } => ("action_invoked", Some(row_id), confirmation),
        GridEvent::ModalOpened { row_id } => ("modal_opened", Some(row_id), None),
        GridEvent::ModalClosed { row_id, submitted } => {
            ("modal_closed", Some(row_id), Some(submitted.to_string()))
        }
        GridEvent::CommentAdded { row_id, comment_id } => {
            ("comment_added", Some(row_id), Some(comment_id.to_string()))
        }
        GridEvent::CommentsViewerOpened { row_id } => {
            ("comments_viewer_opened", Some(row_id), None)
        }
        GridEvent::CommentsViewerClosed { row_id } => {
            ("comments_viewer_closed", Some(row_id), None)
        }
        GridEvent::SalaryEditStarted { row_id } => ("salary_edit_started", Some(row_id), None),
        GridEvent::SalaryEditCancelled { row_id } => {
            ("salary_edit_cancelled", Some(row_id), None)
        }
        GridEvent::SalaryUpdated(update) => (
            "salary_updated",
            Some(update.employee_id),
            Some(update.to_request_json()),
        ),
    };
    GridEventItem {
        sequence,
        kind: kind.to_string(),
        row_id,
        detail,
    }
}
