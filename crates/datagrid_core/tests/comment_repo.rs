use datagrid_core::db::{open_db, open_db_in_memory};
use datagrid_core::{
    Attachment, Comment, CommentRepository, CommentValidationError, RepoError,
    SqliteCommentRepository,
};
use rusqlite::Connection;

fn repo() -> SqliteCommentRepository {
    SqliteCommentRepository::try_new(open_db_in_memory().unwrap()).unwrap()
}

fn comment_at(row_id: u32, text: &str, created_at: i64) -> Comment {
    let mut comment = Comment::new(row_id, text, Vec::new()).unwrap();
    comment.created_at = created_at;
    comment
}

#[test]
fn add_and_list_preserves_text_and_attachments() {
    let mut repo = repo();
    let comment = Comment::new(
        4,
        "  reviewed contract  ",
        vec![
            Attachment::new("contract.pdf").unwrap(),
            Attachment::new("notes.txt").unwrap(),
        ],
    )
    .unwrap();
    repo.add_comment(&comment).unwrap();

    let loaded = repo.list_for_row(4).unwrap();
    assert_eq!(loaded, vec![comment]);
    assert_eq!(loaded[0].text, "reviewed contract");
    assert_eq!(
        loaded[0]
            .attachments
            .iter()
            .map(|attachment| attachment.file_name.as_str())
            .collect::<Vec<_>>(),
        vec!["contract.pdf", "notes.txt"]
    );
}

#[test]
fn list_for_row_orders_oldest_first() {
    let mut repo = repo();
    repo.add_comment(&comment_at(1, "second", 200)).unwrap();
    repo.add_comment(&comment_at(1, "first", 100)).unwrap();
    repo.add_comment(&comment_at(1, "third", 200)).unwrap();

    let texts = repo
        .list_for_row(1)
        .unwrap()
        .into_iter()
        .map(|comment| comment.text)
        .collect::<Vec<_>>();
    assert_eq!(texts, vec!["first", "second", "third"]);
}

#[test]
fn list_for_rows_groups_and_omits_rows_without_comments() {
    let mut repo = repo();
    repo.add_comment(&comment_at(1, "a", 1)).unwrap();
    repo.add_comment(&comment_at(3, "b", 2)).unwrap();
    repo.add_comment(&comment_at(3, "c", 3)).unwrap();
    repo.add_comment(&comment_at(9, "outside", 4)).unwrap();

    let grouped = repo.list_for_rows(&[1, 2, 3]).unwrap();
    assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(grouped[&3].len(), 2);
    assert!(repo.list_for_rows(&[]).unwrap().is_empty());
}

#[test]
fn count_for_row_counts_only_that_row() {
    let mut repo = repo();
    repo.add_comment(&comment_at(5, "x", 1)).unwrap();
    repo.add_comment(&comment_at(5, "y", 2)).unwrap();
    repo.add_comment(&comment_at(6, "z", 3)).unwrap();

    assert_eq!(repo.count_for_row(5).unwrap(), 2);
    assert_eq!(repo.count_for_row(7).unwrap(), 0);
}

#[test]
fn duplicate_comment_id_is_rejected() {
    let mut repo = repo();
    let comment = comment_at(2, "once", 1);
    repo.add_comment(&comment).unwrap();

    let err = repo.add_comment(&comment).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateComment(id) if id == comment.id));
    assert_eq!(repo.count_for_row(2).unwrap(), 1);
}

#[test]
fn invalid_comment_is_rejected_before_sql() {
    let mut repo = repo();
    let mut comment = comment_at(2, "text", 1);
    comment.text = "   ".to_string();

    let err = repo.add_comment(&comment).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(CommentValidationError::EmptyText)
    ));
}

#[test]
fn corrupt_uuid_is_reported_not_masked() {
    let repo = repo();
    repo.connection()
        .execute_batch(
            "INSERT INTO comments (comment_uuid, row_id, body, created_at)
             VALUES ('not-a-uuid', 8, 'body', 0);",
        )
        .unwrap();

    let err = repo.list_for_row(8).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteCommentRepository::try_new(conn).unwrap_err();
    assert!(matches!(err, RepoError::MissingRequiredTable("comments")));
}

#[test]
fn comments_survive_reopening_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("comments.db");
    let comment = comment_at(11, "persisted", 5);
    {
        let mut repo = SqliteCommentRepository::try_new(open_db(&path).unwrap()).unwrap();
        repo.add_comment(&comment).unwrap();
    }

    let repo = SqliteCommentRepository::try_new(open_db(&path).unwrap()).unwrap();
    assert_eq!(repo.list_for_row(11).unwrap(), vec![comment]);
}
