use datagrid_core::db::open_db;
use datagrid_core::db::open_db_in_memory;
use datagrid_core::{
    Comment, CommentRepository, ExportFormat, GridConfig, GridEvent, GridSession,
    InMemorySource, LoadOutcome, LoaderState, ModalError, Page, PageRequest, PageSource,
    RepoError, RepoResult, RowAction, RowId, RowValidationError, SalaryError, ScrollMetrics,
    SessionError, SourceError, SqliteCommentRepository, SyntheticSource,
};
use std::cell::Cell;
use std::collections::BTreeMap;

fn session() -> GridSession<SyntheticSource> {
    GridSession::open(GridConfig::default(), SyntheticSource::new(7)).unwrap()
}

fn loaded_session() -> GridSession<SyntheticSource> {
    let mut session = session();
    session.load_next().unwrap();
    session.drain_events();
    session
}

fn bottom() -> ScrollMetrics {
    ScrollMetrics {
        scroll_top: 900.0,
        viewport_height: 600.0,
        document_height: 1500.0,
    }
}

/// Fails the first `failures` fetches with a timeout, then delegates.
struct FlakySource {
    inner: SyntheticSource,
    failures: Cell<u32>,
}

impl PageSource for FlakySource {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(SourceError::Timeout);
        }
        self.inner.fetch_page(request)
    }

    fn total_rows(&self) -> Option<usize> {
        self.inner.total_rows()
    }
}

/// Serves synthetic rows, but the first fetch carries one row with bad email and salary.
struct CorruptFirstPage {
    inner: SyntheticSource,
    served: Cell<bool>,
}

impl PageSource for CorruptFirstPage {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        let mut page = self.inner.fetch_page(request)?;
        if !self.served.replace(true) {
            if let Some(row) = page.rows.get_mut(3) {
                row.email = "no-at-sign".to_string();
                row.salary = -4_500;
            }
        }
        Ok(page)
    }

    fn total_rows(&self) -> Option<usize> {
        self.inner.total_rows()
    }
}

/// Comment store whose batch lookup fails `failures` times before delegating.
struct FlakyComments {
    inner: SqliteCommentRepository,
    failures: Cell<u32>,
}

impl CommentRepository for FlakyComments {
    fn add_comment(&mut self, comment: &Comment) -> RepoResult<()> {
        self.inner.add_comment(comment)
    }

    fn list_for_row(&self, row_id: RowId) -> RepoResult<Vec<Comment>> {
        self.inner.list_for_row(row_id)
    }

    fn list_for_rows(&self, row_ids: &[RowId]) -> RepoResult<BTreeMap<RowId, Vec<Comment>>> {
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(RepoError::InvalidData("comment store busy".to_string()));
        }
        self.inner.list_for_rows(row_ids)
    }

    fn count_for_row(&self, row_id: RowId) -> RepoResult<u32> {
        self.inner.count_for_row(row_id)
    }
}

fn flaky_comment_session(
    failures: u32,
    stored: &[Comment],
) -> GridSession<SyntheticSource, FlakyComments> {
    let mut inner = SqliteCommentRepository::try_new(open_db_in_memory().unwrap()).unwrap();
    for comment in stored {
        inner.add_comment(comment).unwrap();
    }
    let comments = FlakyComments {
        inner,
        failures: Cell::new(failures),
    };
    GridSession::new(GridConfig::default(), SyntheticSource::new(7), comments).unwrap()
}

#[test]
fn selecting_two_rows_then_deselecting_first_shows_only_second() {
    let mut session = loaded_session();
    let rows = session.rows().to_vec();
    assert!(!rows.is_empty() && rows.len() <= 20);
    let (a, b) = (rows[0].id, rows[1].id);

    session.toggle_row(a).unwrap();
    session.toggle_row(b).unwrap();
    let summary = session.toggle_row(a).unwrap();

    assert_eq!(summary, Some(format!("Selected Row IDs: {b}")));
    assert_eq!(session.view().selection_summary, summary);
}

#[test]
fn scrolling_to_bottom_appends_rows_and_keeps_first_page() {
    let mut session = loaded_session();
    assert_eq!(session.rows().len(), 20);
    let first_page = session.rows().to_vec();

    let ticket = session.on_scroll(bottom()).unwrap();
    assert_eq!(session.loader().state(), LoaderState::Loading(ticket));
    assert!(session.view().loading_indicator);

    let result = session.fetch(&ticket);
    let outcome = session.complete_fetch(ticket, result);

    assert!(matches!(outcome, LoadOutcome::Appended { added: 20, .. }));
    assert!(session.rows().len() > 20);
    assert_eq!(&session.rows()[..20], first_page.as_slice());
    assert!(!session.view().loading_indicator);
}

#[test]
fn scroll_above_threshold_does_not_load() {
    let mut session = loaded_session();
    let metrics = ScrollMetrics {
        scroll_top: 100.0,
        viewport_height: 600.0,
        document_height: 1500.0,
    };

    assert!(session.on_scroll(metrics).is_none());
    assert!(session.drain_events().is_empty());
}

#[test]
fn repeated_scroll_while_loading_starts_one_fetch() {
    let mut session = loaded_session();
    let ticket = session.on_scroll(bottom()).unwrap();
    assert!(session.on_scroll(bottom()).is_none());
    assert!(session.on_scroll(bottom()).is_none());

    let events = session.drain_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0].event,
        GridEvent::LoadStarted { sequence, page_index: 1 } if sequence == ticket.sequence
    ));
}

#[test]
fn failed_fetch_keeps_window_and_next_signal_retries() {
    let source = FlakySource {
        inner: SyntheticSource::with_row_count(3, 50),
        failures: Cell::new(1),
    };
    let mut session = GridSession::open(GridConfig::default(), source).unwrap();

    let outcome = session.load_next().unwrap();
    assert_eq!(outcome, LoadOutcome::Failed(SourceError::Timeout));
    assert!(session.rows().is_empty());
    assert_eq!(session.loader().state(), LoaderState::Idle);

    let retry = session.load_next().unwrap();
    assert!(matches!(retry, LoadOutcome::Appended { added: 20, .. }));

    let kinds = session
        .drain_events()
        .into_iter()
        .map(|event| event.event)
        .collect::<Vec<_>>();
    assert!(matches!(kinds[1], GridEvent::LoadFailed { error: SourceError::Timeout, .. }));
    assert!(matches!(kinds[3], GridEvent::PageAppended { added: 20, total: 20, .. }));
}

#[test]
fn stale_completion_is_ignored() {
    let mut session = loaded_session();
    let ticket = session.request_next_page().unwrap();
    let result = session.fetch(&ticket);
    session.complete_fetch(ticket, result.clone());

    let replay = session.complete_fetch(ticket, result);
    assert_eq!(replay, LoadOutcome::Stale);
    assert_eq!(session.rows().len(), 40);
}

#[test]
fn loading_past_the_end_reports_exhaustion_once() {
    let mut session =
        GridSession::open(GridConfig::default(), SyntheticSource::with_row_count(1, 30)).unwrap();
    session.load_next().unwrap();
    let last = session.load_next().unwrap();
    assert_eq!(
        last,
        LoadOutcome::Appended {
            added: 10,
            total: 30,
            exhausted: true
        }
    );
    assert!(session.load_next().is_none());
    assert!(session.on_scroll(bottom()).is_none());

    let exhausted = session
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event.event, GridEvent::Exhausted { .. }))
        .count();
    assert_eq!(exhausted, 1);
}

#[test]
fn events_are_sequenced_in_transition_order() {
    let mut session = session();
    session.load_next().unwrap();
    let row_id = session.rows()[0].id;
    session.toggle_row(row_id).unwrap();
    session.toggle_menu(row_id).unwrap();
    session.invoke_action(row_id, RowAction::ActionB).unwrap();

    let events = session.drain_events();
    let sequences = events.iter().map(|event| event.sequence).collect::<Vec<_>>();
    assert_eq!(sequences, (1..=sequences.len() as u64).collect::<Vec<_>>());

    let kinds = events.into_iter().map(|event| event.event).collect::<Vec<_>>();
    assert!(matches!(kinds[0], GridEvent::LoadStarted { page_index: 0, .. }));
    assert!(matches!(kinds[1], GridEvent::PageAppended { added: 20, .. }));
    assert!(matches!(kinds[2], GridEvent::SelectionChanged { selected: true, .. }));
    assert!(matches!(kinds[3], GridEvent::MenuOpened { .. }));
    assert!(matches!(kinds[4], GridEvent::MenuClosed { .. }));
    assert!(matches!(
        kinds[5],
        GridEvent::ActionInvoked { action: RowAction::ActionB, .. }
    ));
}

#[test]
fn opening_a_second_menu_closes_the_first() {
    let mut session = loaded_session();
    let (a, b) = (session.rows()[0].id, session.rows()[1].id);

    session.toggle_menu(a).unwrap();
    session.toggle_menu(b).unwrap();

    assert_eq!(session.menu().open_row(), Some(b));
    let open_menus = session
        .view()
        .rows
        .iter()
        .filter(|row| row.menu.is_some())
        .count();
    assert_eq!(open_menus, 1);

    session.toggle_menu(b).unwrap();
    assert_eq!(session.menu().open_row(), None);
}

#[test]
fn invoking_action_on_another_row_still_closes_menu() {
    let mut session = loaded_session();
    let (a, b) = (session.rows()[0].id, session.rows()[1].id);
    session.toggle_menu(a).unwrap();

    let outcome = session.invoke_action(b, RowAction::ActionC).unwrap();
    assert_eq!(outcome.row_id, b);
    let confirmation = outcome.confirmation.unwrap();
    assert!(confirmation.contains(&format!("ID: {b}")));
    assert_eq!(session.menu().open_row(), None);
}

#[test]
fn invoking_action_on_unrendered_row_closes_menu_and_errors() {
    let mut session = loaded_session();
    let a = session.rows()[0].id;
    session.toggle_menu(a).unwrap();

    let err = session.invoke_action(999, RowAction::ActionA).unwrap_err();
    assert!(matches!(err, SessionError::RowNotRendered(999)));
    assert_eq!(session.menu().open_row(), None);
}

#[test]
fn row_operations_reject_unrendered_rows() {
    let mut session = loaded_session();
    assert!(matches!(
        session.toggle_row(500),
        Err(SessionError::RowNotRendered(500))
    ));
    assert!(session.open_comment_modal(500).is_err());
    assert!(session.start_salary_edit(500).is_err());
    assert!(session.selection().is_empty());
}

#[test]
fn submitting_comment_attaches_it_to_target_row_only() {
    let mut session = loaded_session();
    let (target, other) = (session.rows()[2].id, session.rows()[3].id);

    session.open_comment_modal(target).unwrap();
    session.set_comment_text("Follow up on onboarding").unwrap();
    session.attach_file("checklist.pdf").unwrap();
    assert!(session.can_submit_comment());
    let comment = session.submit_comment().unwrap();

    assert!(!session.modal().is_open());
    assert_eq!(session.row(target).unwrap().comments, vec![comment.clone()]);
    assert!(session.row(other).unwrap().comments.is_empty());
    assert_eq!(session.comment_store().count_for_row(target).unwrap(), 1);

    let kinds = session
        .drain_events()
        .into_iter()
        .map(|event| event.event)
        .collect::<Vec<_>>();
    assert_eq!(
        kinds[1..],
        [
            GridEvent::CommentAdded {
                row_id: target,
                comment_id: comment.id
            },
            GridEvent::ModalClosed {
                row_id: target,
                submitted: true
            },
        ]
    );
}

#[test]
fn blank_comment_cannot_be_submitted() {
    let mut session = loaded_session();
    let target = session.rows()[0].id;
    session.open_comment_modal(target).unwrap();
    session.set_comment_text("   ").unwrap();

    assert!(!session.can_submit_comment());
    let err = session.submit_comment().unwrap_err();
    assert!(matches!(err, SessionError::Modal(ModalError::EmptyText)));
    assert_eq!(session.modal().target(), Some(target));
    assert!(session.row(target).unwrap().comments.is_empty());
}

#[test]
fn cancelling_comment_leaves_row_untouched() {
    let mut session = loaded_session();
    let target = session.rows()[0].id;
    let before = session.row(target).unwrap().clone();

    session.open_comment_modal(target).unwrap();
    session.set_comment_text("draft").unwrap();
    session.cancel_comment();

    assert!(!session.modal().is_open());
    assert_eq!(session.row(target).unwrap(), &before);
    assert_eq!(
        session.drain_events().last().map(|event| event.event.clone()),
        Some(GridEvent::ModalClosed {
            row_id: target,
            submitted: false
        })
    );
}

#[test]
fn stored_comments_are_hydrated_when_pages_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.db");
    let config = GridConfig {
        db_path: Some(path.clone()),
        ..GridConfig::default()
    };

    let mut first = GridSession::open(config.clone(), SyntheticSource::new(7)).unwrap();
    first.load_next().unwrap();
    first.load_next().unwrap();
    let row_id = first.rows()[25].id;
    first.open_comment_modal(row_id).unwrap();
    first.set_comment_text("kept across sessions").unwrap();
    let comment = first.submit_comment().unwrap();
    drop(first);

    let mut second = GridSession::open(config, SyntheticSource::new(7)).unwrap();
    second.load_next().unwrap();
    assert!(second.row(row_id).is_none());
    second.load_next().unwrap();
    assert_eq!(second.row(row_id).unwrap().comments, vec![comment]);

    let repo = SqliteCommentRepository::try_new(open_db(&path).unwrap()).unwrap();
    assert_eq!(repo.count_for_row(row_id).unwrap(), 1);
}

#[test]
fn page_with_invalid_row_fails_and_retry_loads_clean_page() {
    let source = CorruptFirstPage {
        inner: SyntheticSource::new(7),
        served: Cell::new(false),
    };
    let mut session = GridSession::open(GridConfig::default(), source).unwrap();

    let outcome = session.load_next().unwrap();
    let LoadOutcome::Failed(SourceError::InvalidRow(err)) = outcome else {
        panic!("expected invalid row failure, got {outcome:?}");
    };
    assert!(matches!(err, RowValidationError::InvalidEmail { row_id: 4, .. }));
    assert!(session.rows().is_empty());
    assert_eq!(session.loader().state(), LoaderState::Idle);

    let retried = session.load_next().unwrap();
    assert!(matches!(retried, LoadOutcome::Appended { added: 20, .. }));
    assert!(session.rows().iter().all(|row| row.validate().is_ok()));
}

#[test]
fn failed_comment_hydration_is_reported_and_retried_on_next_page() {
    let stored = Comment::new(2, "stored before reload", Vec::new()).unwrap();
    let mut session = flaky_comment_session(1, std::slice::from_ref(&stored));

    session.load_next().unwrap();
    assert!(session.row(2).unwrap().comments.is_empty());
    assert_eq!(session.unhydrated_rows().len(), 20);
    let unavailable = session
        .drain_events()
        .into_iter()
        .find_map(|event| match event.event {
            GridEvent::CommentsUnavailable { row_ids, error } => Some((row_ids, error)),
            _ => None,
        })
        .unwrap();
    assert_eq!(unavailable.0.len(), 20);
    assert!(unavailable.1.contains("comment store busy"));

    session.load_next().unwrap();
    assert!(session.unhydrated_rows().is_empty());
    assert_eq!(session.row(2).unwrap().comments, vec![stored]);
    assert_eq!(session.row(2).unwrap().comment_count(), 1);
}

#[test]
fn submit_retries_hydration_and_keeps_comments_oldest_first() {
    let stored = Comment::new(2, "older note", Vec::new()).unwrap();
    let mut session = flaky_comment_session(1, std::slice::from_ref(&stored));
    session.load_next().unwrap();
    assert!(!session.unhydrated_rows().is_empty());

    session.open_comment_modal(2).unwrap();
    session.set_comment_text("newer note").unwrap();
    let submitted = session.submit_comment().unwrap();

    assert!(session.unhydrated_rows().is_empty());
    let texts = session
        .row(2)
        .unwrap()
        .comments
        .iter()
        .map(|comment| comment.text.as_str())
        .collect::<Vec<_>>();
    assert_eq!(texts, vec!["older note", "newer note"]);
    assert_eq!(session.row(2).unwrap().comments[1], submitted);
}

#[test]
fn comments_viewer_shows_row_comments_and_closes_menu() {
    let mut session = loaded_session();
    let target = session.rows()[1].id;
    session.open_comment_modal(target).unwrap();
    session.set_comment_text("visible in viewer").unwrap();
    session.submit_comment().unwrap();
    session.toggle_menu(target).unwrap();

    session.view_comments(target).unwrap();
    assert_eq!(session.menu().open_row(), None);
    let viewer = session.view().comments_viewer.unwrap();
    assert_eq!(viewer.row_id, target);
    assert_eq!(viewer.comments[0].text, "visible in viewer");

    session.close_comments_viewer();
    assert!(session.view().comments_viewer.is_none());
}

#[test]
fn saving_salary_updates_row_and_emits_request_payload() {
    let mut session = loaded_session();
    let target = session.rows()[0].id;

    session.start_salary_edit(target).unwrap();
    session.set_salary_input("95000").unwrap();
    let update = session.save_salary().unwrap();

    assert_eq!(session.row(target).unwrap().salary, 95_000);
    assert!(session.salary_editor().has_updated_salary(target));
    assert_eq!(session.salary_editor().updated_ids(), vec![target]);
    let payload: serde_json::Value = serde_json::from_str(&update.to_request_json()).unwrap();
    assert_eq!(
        payload,
        serde_json::json!({ "employeeId": target, "newSalary": 95000 })
    );
    assert_eq!(
        session.drain_events().last().map(|event| event.event.clone()),
        Some(GridEvent::SalaryUpdated(update))
    );
}

#[test]
fn invalid_salary_keeps_row_and_edit_open() {
    let mut session = loaded_session();
    let target = session.rows()[0].id;
    let original = session.row(target).unwrap().salary;

    session.start_salary_edit(target).unwrap();
    session.set_salary_input("250000").unwrap();
    let err = session.save_salary().unwrap_err();

    assert!(matches!(err, SessionError::Salary(SalaryError::AboveMaximum(200_000))));
    assert_eq!(err.to_string(), "Error: Salary cannot exceed $200,000.");
    assert_eq!(session.row(target).unwrap().salary, original);
    assert_eq!(session.salary_editor().editing_row(), Some(target));
}

#[test]
fn export_covers_every_source_row() {
    let mut session =
        GridSession::open(GridConfig::default(), SyntheticSource::with_row_count(2, 45)).unwrap();
    session.load_next().unwrap();

    let csv = session.export(ExportFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 46);
    assert!(csv.starts_with("ID,Name,Email,Department,Position,Salary,Start Date,Status"));

    let text = session.export(ExportFormat::Text).unwrap();
    assert!(text.starts_with("Data Grid Export"));
    assert_eq!(text.matches("---\n").count(), 45);
}

#[test]
fn export_reflects_saved_salary() {
    let mut session = loaded_session();
    let target = session.rows()[0].id;
    session.start_salary_edit(target).unwrap();
    session.set_salary_input("123456").unwrap();
    session.save_salary().unwrap();

    let csv = session.export(ExportFormat::Csv).unwrap();
    let line = csv.lines().nth(1).unwrap();
    assert!(line.starts_with(&format!("{target},")));
    assert!(line.contains(",123456,"));
}

#[test]
fn in_memory_source_with_few_rows_exhausts_on_first_page() {
    let rows = SyntheticSource::new(9).rows(0, 5);
    let source = InMemorySource::try_new(rows).unwrap();
    let mut session = GridSession::open(GridConfig::default(), source).unwrap();

    assert_eq!(
        session.load_next(),
        Some(LoadOutcome::Appended {
            added: 5,
            total: 5,
            exhausted: true
        })
    );
    assert_eq!(session.loader().state(), LoaderState::Exhausted);
}

#[test]
fn invalid_config_is_rejected() {
    let config = GridConfig {
        page_size: 0,
        ..GridConfig::default()
    };
    let result = GridSession::open(config, SyntheticSource::new(1));
    assert!(matches!(result, Err(SessionError::Config(_))));
}
