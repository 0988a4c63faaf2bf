//! Grid snapshot types.

use super::{format_currency, format_date};
use crate::model::comment::{latest_comment_preview, Comment};
use crate::model::row::{Row, RowId};
use crate::state::action_menu::RowAction;
use crate::state::comment_modal::CommentDraft;
use serde::Serialize;

/// Header cells in render order.
pub const HEADER_CELLS: [&str; 10] = [
    "Select",
    "Name",
    "Email",
    "Department",
    "Position",
    "Salary",
    "Start Date",
    "Status",
    "Comments & Attachments",
    "Actions",
];

const ADD_COMMENT_LABEL: &str = "Add Comment";
const ELLIPSIS_LABEL: &str = "...";

/// Full render snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub headers: Vec<&'static str>,
    pub rows: Vec<RowView>,
    /// Present iff at least one row is selected.
    pub selection_summary: Option<String>,
    /// True while a page fetch is in flight.
    pub loading_indicator: bool,
    pub loading_progress: f64,
    pub comment_modal: Option<ModalView>,
    pub comments_viewer: Option<ViewerView>,
}

/// One rendered data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub id: RowId,
    pub checked: bool,
    /// Exactly `HEADER_CELLS.len()` entries.
    pub cells: Vec<String>,
    pub add_comment_label: &'static str,
    pub ellipsis_label: &'static str,
    /// Menu entries when this row's menu is open.
    pub menu: Option<Vec<&'static str>>,
    pub salary_editing: bool,
    pub salary_updated: bool,
}

impl RowView {
    /// Builds the row projection.
    pub fn build(
        row: &Row,
        checked: bool,
        menu_open: bool,
        salary_editing: bool,
        salary_updated: bool,
    ) -> Self {
        let cells = vec![
            if checked { "[x]" } else { "[ ]" }.to_string(),
            row.name.clone(),
            row.email.clone(),
            row.department.clone(),
            row.position.clone(),
            format_currency(row.salary),
            format_date(row.start_date),
            row.status.label().to_string(),
            comments_cell(row),
            ELLIPSIS_LABEL.to_string(),
        ];
        let menu: Option<Vec<&'static str>> = menu_open.then(|| {
            RowAction::ALL
                .iter()
                .map(|action| action.label())
                .collect()
        });

        Self {
            id: row.id,
            checked,
            cells,
            add_comment_label: ADD_COMMENT_LABEL,
            ellipsis_label: ELLIPSIS_LABEL,
            menu,
            salary_editing,
            salary_updated,
        }
    }
}

/// Open comment modal projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalView {
    pub row_id: RowId,
    pub row_name: String,
    pub text: String,
    pub attachment_names: Vec<String>,
    pub submit_enabled: bool,
}

impl ModalView {
    pub fn build(row_id: RowId, row_name: &str, draft: &CommentDraft) -> Self {
        Self {
            row_id,
            row_name: row_name.to_string(),
            text: draft.text.clone(),
            attachment_names: draft
                .attachments
                .iter()
                .map(|attachment| attachment.file_name.clone())
                .collect(),
            submit_enabled: !draft.text.trim().is_empty(),
        }
    }
}

/// Read-only comments list projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerView {
    pub row_id: RowId,
    pub comments: Vec<Comment>,
}

fn comments_cell(row: &Row) -> String {
    let count = match row.comment_count() {
        1 => "1 comment".to_string(),
        n => format!("{n} comments"),
    };
    format!("{count}: {}", latest_comment_preview(&row.comments))
}
